//! Filesystem-backed blob storage for the Cellar engine.
//!
//! Blobs are arbitrary binary payloads persisted as plain files under a
//! configured root directory. The directory tree *is* the index: a blob's
//! identifier is its path relative to the root, derived by one of three
//! sharding strategies.
//!
//! # Sharding Strategies
//!
//! - [`ShardStrategy::Flat`] — namespace directories plus a name-stamped leaf
//! - [`ShardStrategy::User`] — like Flat, but namespace-less blobs route to a
//!   shared subtree for anonymous callers or a per-user subtree otherwise
//! - [`ShardStrategy::Bushy`] — one directory level per owner-key byte,
//!   exactly 8 levels, invertible back to the key
//!
//! # Write Protocol
//!
//! Writes are eager: [`FsStorage::store`] moves the staged payload to its
//! final path immediately and joins a participant to the caller's
//! [`Transaction`]. Commit needs no further physical action; abort removes
//! the file, or converts it into a *ghost* when removal fails. Ghosts live
//! in a per-storage [`GhostRegistry`] until a time-boxed sweep
//! ([`FsStorage::remove_ghost_files`]) confirms the bytes are gone.
//!
//! # Design Rules
//!
//! 1. A blob id is assigned exactly once and never changes.
//! 2. A ghosted record is never served by any read operation.
//! 3. Directories are created lazily and never deleted.
//! 4. Path collisions are refused, not retried.
//! 5. Abort and sweep absorb filesystem errors; everything else propagates.

pub mod config;
pub mod error;
pub mod ghost;
pub mod path;
pub mod record;
pub mod storage;
pub mod temp;
pub mod traits;
pub mod txn;

pub use config::{ShardStrategy, StorageConfig};
pub use error::{StoreError, StoreResult};
pub use ghost::GhostRegistry;
pub use path::{bushy_dir, owner_key_for_path, SHARD_DEPTH};
pub use record::{BlobRecord, GhostRecord};
pub use storage::{Collaborators, FsStorage};
pub use temp::TempBlob;
pub use traits::{
    ContentTypeGuess, ExtensionGuesser, FixedPrincipal, KeyAllocator, PrincipalResolver,
    SequentialKeyAllocator,
};
pub use txn::{Transaction, TxnParticipant, TxnState};
