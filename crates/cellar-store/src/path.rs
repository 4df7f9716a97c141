use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use cellar_types::{OwnerKey, Principal};

use crate::config::ShardStrategy;
use crate::error::{StoreError, StoreResult};

/// Number of directory levels in a bushy path: one per owner-key byte.
pub const SHARD_DEPTH: usize = 8;

/// Subtree for anonymous callers under the user strategy.
pub(crate) const SHARE_DIR: &str = "share";
/// Subtree for authenticated callers under the user strategy.
pub(crate) const USER_DIR: &str = "user";

/// Millisecond-precision leaf stamp, e.g. `20260828-10-11-12.345`.
///
/// The format is fixed for interop with existing stored trees.
fn leaf_stamp(now: DateTime<Utc>) -> String {
    format!(
        "{}.{:03}",
        now.format("%Y%m%d-%H-%M-%S"),
        now.timestamp_subsec_millis()
    )
}

/// The bushy directory path for an owner key: 8 nested `0xNN` segments,
/// least significant byte last (big-endian order).
pub fn bushy_dir(key: OwnerKey) -> String {
    let segments: Vec<String> = key
        .as_bytes()
        .iter()
        .map(|byte| format!("0x{}", hex::encode([*byte])))
        .collect();
    segments.join("/")
}

/// Re-derive the owner key from a bushy directory path.
///
/// The inverse of [`bushy_dir`], used by maintenance tooling that needs to
/// go from a file back to its owning object without the object graph.
/// Accepts exactly [`SHARD_DEPTH`] segments of the form `0x` plus two
/// lowercase hex digits; anything else is rejected.
pub fn owner_key_for_path(path: &str) -> StoreResult<OwnerKey> {
    let segments: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();
    if segments.len() != SHARD_DEPTH {
        return Err(StoreError::InvalidShardPath(path.to_string()));
    }
    let mut bytes = Vec::with_capacity(SHARD_DEPTH);
    for segment in segments {
        let digits = segment
            .strip_prefix("0x")
            .filter(|d| d.len() == 2 && d.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        let digits = digits.ok_or_else(|| StoreError::InvalidShardPath(path.to_string()))?;
        let byte = hex::decode(digits).map_err(|_| StoreError::InvalidShardPath(path.to_string()))?;
        bytes.extend_from_slice(&byte);
    }
    Ok(OwnerKey::from_bytes(&bytes)?)
}

/// Compute the relative id for a new blob and create its directories.
///
/// Directories are created lazily on first use and never deleted. The leaf
/// must not already exist; a collision is a refusal, not a retry.
pub(crate) fn compute_id(
    root: &Path,
    strategy: ShardStrategy,
    file_name: Option<&str>,
    namespace: Option<&str>,
    owner_key: Option<OwnerKey>,
    principal: &Principal,
) -> StoreResult<String> {
    compute_id_at(
        root, strategy, file_name, namespace, owner_key, principal,
        Utc::now(),
    )
}

/// As [`compute_id`], with an explicit clock for deterministic callers.
pub(crate) fn compute_id_at(
    root: &Path,
    strategy: ShardStrategy,
    file_name: Option<&str>,
    namespace: Option<&str>,
    owner_key: Option<OwnerKey>,
    principal: &Principal,
    now: DateTime<Utc>,
) -> StoreResult<String> {
    let stamp = leaf_stamp(now);
    let id = match strategy {
        ShardStrategy::Flat => {
            stamped_id(root, namespace_dir(namespace), file_name, &stamp)?
        }
        ShardStrategy::User => {
            // An explicit namespace wins over principal routing.
            let dir = match namespace {
                Some(_) => namespace_dir(namespace),
                None => Some(principal_dir(principal)),
            };
            stamped_id(root, dir, file_name, &stamp)?
        }
        ShardStrategy::Bushy => {
            let key = owner_key.ok_or(StoreError::MissingOwnerKey)?;
            let dir = bushy_dir(key);
            fs::create_dir_all(root.join(&dir))?;
            format!("{dir}/{stamp}")
        }
    };

    if root.join(&id).exists() {
        return Err(StoreError::DuplicatedPath(id));
    }
    Ok(id)
}

/// Flat/user leaf id: `{hint-or-token}-{stamp}`, under an optional directory.
///
/// A missing hint is replaced by a random token so caller-controlled names
/// never carry the uniqueness guarantee alone.
fn stamped_id(
    root: &Path,
    dir: Option<String>,
    file_name: Option<&str>,
    stamp: &str,
) -> StoreResult<String> {
    let token = match file_name {
        Some(name) => name.to_string(),
        None => uuid::Uuid::now_v7().to_string(),
    };
    let leaf = format!("{token}-{stamp}");
    match dir {
        Some(dir) => {
            fs::create_dir_all(root.join(&dir))?;
            Ok(format!("{dir}/{leaf}"))
        }
        None => Ok(leaf),
    }
}

/// Map a namespace like `invoices/2020` onto nested directories.
fn namespace_dir(namespace: Option<&str>) -> Option<String> {
    namespace.map(|ns| {
        ns.split('/')
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join("/")
    })
}

/// Principal routing for the user strategy without a namespace.
fn principal_dir(principal: &Principal) -> String {
    match principal.key() {
        None => SHARE_DIR.to_string(),
        Some(key) => format!("{USER_DIR}/{key}"),
    }
}
