use std::sync::atomic::{AtomicU64, Ordering};

use cellar_types::{OwnerKey, Principal};

use crate::error::StoreResult;

/// Mints owner keys for objects that do not have one yet.
///
/// Backed by the external persistent-object system in production; the
/// allocator is called at most once per stored blob, so idempotency per
/// object stays the host's concern.
pub trait KeyAllocator: Send + Sync {
    /// Return a fresh, never-before-issued owner key.
    fn allocate(&self) -> StoreResult<OwnerKey>;
}

/// In-process allocator handing out sequential keys.
///
/// Suitable for tests and hosts without a persistent-object system.
#[derive(Debug)]
pub struct SequentialKeyAllocator {
    next: AtomicU64,
}

impl SequentialKeyAllocator {
    /// Start allocating at 1; key 0 stays reserved as "no object".
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Start allocating at an explicit value.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }
}

impl Default for SequentialKeyAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyAllocator for SequentialKeyAllocator {
    fn allocate(&self) -> StoreResult<OwnerKey> {
        let value = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(OwnerKey::from_u64(value))
    }
}

/// Guesses a content type from a file name. Pure, no I/O.
pub trait ContentTypeGuess: Send + Sync {
    fn guess(&self, file_name: &str) -> Option<String>;
}

/// Extension-table content type guesser covering the common cases.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtensionGuesser;

impl ContentTypeGuess for ExtensionGuesser {
    fn guess(&self, file_name: &str) -> Option<String> {
        let extension = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
        let content_type = match extension.as_str() {
            "txt" => "text/plain",
            "html" | "htm" => "text/html",
            "css" => "text/css",
            "csv" => "text/csv",
            "js" => "text/javascript",
            "json" => "application/json",
            "xml" => "application/xml",
            "pdf" => "application/pdf",
            "zip" => "application/zip",
            "gz" => "application/gzip",
            "tar" => "application/x-tar",
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "svg" => "image/svg+xml",
            "mp3" => "audio/mpeg",
            "mp4" => "video/mp4",
            "bin" => "application/octet-stream",
            _ => return None,
        };
        Some(content_type.to_string())
    }
}

/// Resolves the calling identity for user-routed storage.
pub trait PrincipalResolver: Send + Sync {
    fn current(&self) -> Principal;
}

/// Resolver returning one fixed principal. The default collaborator treats
/// every caller as anonymous.
#[derive(Clone, Debug, Default)]
pub struct FixedPrincipal(pub Principal);

impl FixedPrincipal {
    /// Resolver for an authenticated user with the given key.
    pub fn user(key: impl Into<String>) -> Self {
        Self(Principal::user(key))
    }
}

impl PrincipalResolver for FixedPrincipal {
    fn current(&self) -> Principal {
        self.0.clone()
    }
}
