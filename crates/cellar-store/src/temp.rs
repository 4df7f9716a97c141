use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// A fully-materialized staged file waiting to enter the storage root.
///
/// Upstream producers (uploads, converters) finish writing the payload
/// before the store call; consuming a `TempBlob` relocates the bytes with a
/// rename, never a copy. After consumption the staged file is gone, even if
/// a later store step fails. Staged files must live on the same filesystem
/// as the storage root for the rename to succeed.
#[derive(Debug)]
pub struct TempBlob {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    /// Owned temp file; cleaned up automatically if never consumed.
    Named(NamedTempFile),
    /// Caller-owned path; left in place if never consumed.
    Path(PathBuf),
}

impl TempBlob {
    /// Stage an already-written temp file.
    pub fn from_file(file: NamedTempFile) -> Self {
        Self {
            inner: Inner::Named(file),
        }
    }

    /// Stage a caller-owned file by path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Inner::Path(path.into()),
        }
    }

    /// Stage a payload by writing it to a fresh temp file in `dir`.
    ///
    /// Keeping the temp file next to the storage root guarantees the final
    /// rename stays on one filesystem.
    pub fn from_bytes_in(dir: impl AsRef<Path>, data: &[u8]) -> io::Result<Self> {
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(data)?;
        file.flush()?;
        Ok(Self::from_file(file))
    }

    /// The current location of the staged bytes.
    pub fn path(&self) -> &Path {
        match &self.inner {
            Inner::Named(file) => file.path(),
            Inner::Path(path) => path,
        }
    }

    /// Move the staged bytes to `dest`, releasing the temp file.
    pub(crate) fn consume(self, dest: &Path) -> StoreResult<()> {
        match self.inner {
            Inner::Named(file) => {
                file.persist(dest)
                    .map_err(|e| StoreError::Processing(e.to_string()))?;
            }
            Inner::Path(path) => {
                fs::rename(&path, dest)
                    .map_err(|e| StoreError::Processing(e.to_string()))?;
            }
        }
        debug!(dest = %dest.display(), "staged file consumed");
        Ok(())
    }
}

impl From<NamedTempFile> for TempBlob {
    fn from(file: NamedTempFile) -> Self {
        Self::from_file(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_moves_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let temp = TempBlob::from_bytes_in(dir.path(), b"payload").unwrap();
        let staged = temp.path().to_path_buf();

        let dest = dir.path().join("final.bin");
        temp.consume(&dest).unwrap();

        assert!(!staged.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"payload");
    }

    #[test]
    fn consume_from_caller_path() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("staged.bin");
        fs::write(&source, b"hello").unwrap();

        let temp = TempBlob::from_path(&source);
        let dest = dir.path().join("moved.bin");
        temp.consume(&dest).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read(&dest).unwrap(), b"hello");
    }

    #[test]
    fn consume_into_missing_dir_is_processing_error() {
        let dir = tempfile::tempdir().unwrap();
        let temp = TempBlob::from_bytes_in(dir.path(), b"x").unwrap();
        let err = temp
            .consume(&dir.path().join("no/such/dir/file.bin"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Processing(_)));
    }

    #[test]
    fn unconsumed_named_temp_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let staged;
        {
            let temp = TempBlob::from_bytes_in(dir.path(), b"x").unwrap();
            staged = temp.path().to_path_buf();
            assert!(staged.exists());
        }
        assert!(!staged.exists());
    }
}
