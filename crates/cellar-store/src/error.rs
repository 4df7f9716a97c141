use std::path::PathBuf;

/// Errors from blob storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The configured storage root does not exist. Fatal at open time.
    #[error("storage root does not exist: {0}")]
    MissingStorageRoot(PathBuf),

    /// The computed storage path already exists on disk.
    ///
    /// This is a refusal, not a transient condition: two callers computing
    /// the same millisecond stamp for the same name hint is a naming bug
    /// that retrying would only mask.
    #[error("path already exists in storage: {0}")]
    DuplicatedPath(String),

    /// The requested blob is missing or has been logically removed.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// A path does not match the bushy shard layout.
    #[error("not a valid sharded path: {0}")]
    InvalidShardPath(String),

    /// Relocating the staged temp file into the storage root failed.
    #[error("failed to consume staged file: {0}")]
    Processing(String),

    /// The active strategy requires an owner key and none could be obtained.
    #[error("owner key required but none available")]
    MissingOwnerKey,

    /// The transaction has already been committed or aborted.
    #[error("transaction is no longer open")]
    TransactionClosed,

    /// Owner key construction or parsing failure.
    #[error("owner key error: {0}")]
    Key(#[from] cellar_types::TypeError),

    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
