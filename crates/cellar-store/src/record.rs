use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use cellar_types::OwnerKey;

/// Handle to one stored blob.
///
/// The `id` doubles as the physical path relative to the storage root. It is
/// assigned exactly once at store time and never changes. Records are shared
/// by reference once the creating transaction resolves; the ghost flag is
/// the only field that mutates after construction.
#[derive(Debug)]
pub struct BlobRecord {
    id: String,
    storage_name: String,
    namespace: Option<String>,
    file_name: Option<String>,
    content_type: Option<String>,
    size: u64,
    owner_key: Option<OwnerKey>,
    is_ghost: AtomicBool,
}

impl BlobRecord {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: String,
        storage_name: String,
        namespace: Option<String>,
        file_name: Option<String>,
        content_type: Option<String>,
        size: u64,
        owner_key: Option<OwnerKey>,
    ) -> Self {
        Self {
            id,
            storage_name,
            namespace,
            file_name,
            content_type,
            size,
            owner_key,
            is_ghost: AtomicBool::new(false),
        }
    }

    /// The blob identifier: its path relative to the storage root.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Name of the storage instance that owns this blob.
    pub fn storage_name(&self) -> &str {
        &self.storage_name
    }

    /// The caller-supplied namespace, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// The upload file name hint, if any.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Content type guessed from the file name, cached at store time.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Size in bytes, computed from the resident file at store time.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The owner key used for sharding, if the strategy needed one.
    pub fn owner_key(&self) -> Option<OwnerKey> {
        self.owner_key
    }

    /// Whether this blob has been logically removed.
    ///
    /// A ghosted record must never be served by read operations, even while
    /// the bytes are still waiting for physical deletion.
    pub fn is_ghost(&self) -> bool {
        self.is_ghost.load(Ordering::Acquire)
    }

    pub(crate) fn mark_ghost(&self) {
        self.is_ghost.store(true, Ordering::Release);
    }
}

/// Reduced projection of a removed blob pending physical deletion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GhostRecord {
    /// The blob identifier, still the registry key.
    pub id: String,
    /// Absolute path of the file awaiting removal.
    pub path: PathBuf,
}

impl GhostRecord {
    /// Project a record into its ghost form, given the storage root.
    pub(crate) fn project(record: &BlobRecord, root: &std::path::Path) -> Self {
        Self {
            id: record.id.clone(),
            path: root.join(&record.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn record() -> BlobRecord {
        BlobRecord::new(
            "a/b/report-20260828-10-11-12.345".into(),
            "default".into(),
            Some("a/b".into()),
            Some("report.pdf".into()),
            Some("application/pdf".into()),
            1024,
            Some(OwnerKey::from_u64(9)),
        )
    }

    #[test]
    fn accessors_expose_fields() {
        let r = record();
        assert_eq!(r.id(), "a/b/report-20260828-10-11-12.345");
        assert_eq!(r.storage_name(), "default");
        assert_eq!(r.namespace(), Some("a/b"));
        assert_eq!(r.file_name(), Some("report.pdf"));
        assert_eq!(r.content_type(), Some("application/pdf"));
        assert_eq!(r.size(), 1024);
        assert_eq!(r.owner_key(), Some(OwnerKey::from_u64(9)));
    }

    #[test]
    fn records_start_live() {
        let r = record();
        assert!(!r.is_ghost());
        r.mark_ghost();
        assert!(r.is_ghost());
    }

    #[test]
    fn ghost_projection_joins_root() {
        let r = record();
        let g = GhostRecord::project(&r, Path::new("/data/blobs"));
        assert_eq!(g.id, r.id());
        assert_eq!(
            g.path,
            Path::new("/data/blobs/a/b/report-20260828-10-11-12.345")
        );
    }

    #[test]
    fn ghost_record_serde_roundtrip() {
        let g = GhostRecord {
            id: "x".into(),
            path: "/data/x".into(),
        };
        let json = serde_json::to_string(&g).unwrap();
        let parsed: GhostRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(g, parsed);
    }
}
