use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Width of an owner key in bytes.
pub const OWNER_KEY_LEN: usize = 8;

/// Opaque identifier of the persistent object that owns a blob.
///
/// An `OwnerKey` is an 8-byte value minted by the external persistent-object
/// system. The storage engine never interprets it; it only relies on the
/// canonical big-endian byte representation, which drives the bushy
/// directory layout (one directory level per byte).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OwnerKey([u8; OWNER_KEY_LEN]);

impl OwnerKey {
    /// Build a key from a numeric identifier, big-endian.
    pub const fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    /// The numeric value of this key, read big-endian.
    pub const fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }

    /// Build a key from exactly 8 raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, TypeError> {
        if bytes.len() != OWNER_KEY_LEN {
            return Err(TypeError::InvalidLength {
                expected: OWNER_KEY_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; OWNER_KEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// The canonical big-endian byte representation.
    pub fn as_bytes(&self) -> &[u8; OWNER_KEY_LEN] {
        &self.0
    }

    /// Hex-encoded string representation (16 lowercase hex digits).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Debug for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OwnerKey({})", self.to_hex())
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl From<u64> for OwnerKey {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl From<OwnerKey> for u64 {
    fn from(key: OwnerKey) -> Self {
        key.to_u64()
    }
}
