use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Directory-sharding strategy for a storage instance.
///
/// A closed set of variants selected at configuration time; all strategies
/// share the same store/remove protocol and differ only in how a relative
/// path is derived for a new blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShardStrategy {
    /// Namespace directories plus a name-stamped leaf file.
    Flat,
    /// Like `Flat`, but blobs without a namespace are routed per principal:
    /// anonymous callers under `share/`, authenticated under `user/{key}/`.
    User,
    /// One directory level per byte of the owner key, 8 levels deep.
    /// Bounds the number of entries in any single directory.
    Bushy,
}

impl ShardStrategy {
    /// Whether path computation needs an owner key.
    pub fn needs_owner_key(&self) -> bool {
        matches!(self, Self::Bushy)
    }
}

/// Configuration for one storage instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory. Must exist before the storage is opened.
    pub root: PathBuf,
    /// Name binding stored records to this storage instance, for hosts
    /// running several named storages side by side.
    pub storage_name: String,
    /// Active sharding strategy.
    pub strategy: ShardStrategy,
}

impl StorageConfig {
    /// Configuration for a flat storage rooted at `root`.
    pub fn flat(root: impl Into<PathBuf>) -> Self {
        Self::new(root, ShardStrategy::Flat)
    }

    /// Configuration for a user-routed storage rooted at `root`.
    pub fn user(root: impl Into<PathBuf>) -> Self {
        Self::new(root, ShardStrategy::User)
    }

    /// Configuration for a bushy storage rooted at `root`.
    pub fn bushy(root: impl Into<PathBuf>) -> Self {
        Self::new(root, ShardStrategy::Bushy)
    }

    fn new(root: impl Into<PathBuf>, strategy: ShardStrategy) -> Self {
        Self {
            root: root.into(),
            storage_name: "default".into(),
            strategy,
        }
    }

    /// Override the storage name.
    pub fn with_storage_name(mut self, name: impl Into<String>) -> Self {
        self.storage_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_strategy() {
        assert_eq!(StorageConfig::flat("/x").strategy, ShardStrategy::Flat);
        assert_eq!(StorageConfig::user("/x").strategy, ShardStrategy::User);
        assert_eq!(StorageConfig::bushy("/x").strategy, ShardStrategy::Bushy);
    }

    #[test]
    fn default_storage_name() {
        let c = StorageConfig::flat("/x");
        assert_eq!(c.storage_name, "default");
        let c = c.with_storage_name("invoices");
        assert_eq!(c.storage_name, "invoices");
    }

    #[test]
    fn only_bushy_needs_owner_key() {
        assert!(!ShardStrategy::Flat.needs_owner_key());
        assert!(!ShardStrategy::User.needs_owner_key());
        assert!(ShardStrategy::Bushy.needs_owner_key());
    }

    #[test]
    fn serde_roundtrip() {
        let c = StorageConfig::bushy("/data/blobs").with_storage_name("media");
        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"bushy\""));
        let parsed: StorageConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.strategy, ShardStrategy::Bushy);
        assert_eq!(parsed.storage_name, "media");
    }
}
