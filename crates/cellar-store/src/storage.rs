use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use cellar_types::OwnerKey;

use crate::config::{ShardStrategy, StorageConfig};
use crate::error::{StoreError, StoreResult};
use crate::ghost::GhostRegistry;
use crate::path::{self, SHARE_DIR, USER_DIR};
use crate::record::{BlobRecord, GhostRecord};
use crate::temp::TempBlob;
use crate::traits::{
    ContentTypeGuess, ExtensionGuesser, FixedPrincipal, KeyAllocator, PrincipalResolver,
    SequentialKeyAllocator,
};
use crate::txn::{Transaction, TxnParticipant};

/// Injected collaborator capabilities for a storage instance.
///
/// Production hosts wire these to their persistent-object system, content
/// sniffer, and authentication layer; the defaults are self-contained
/// in-process implementations.
pub struct Collaborators {
    pub allocator: Box<dyn KeyAllocator>,
    pub guesser: Box<dyn ContentTypeGuess>,
    pub principals: Box<dyn PrincipalResolver>,
}

impl Default for Collaborators {
    fn default() -> Self {
        Self {
            allocator: Box::new(SequentialKeyAllocator::new()),
            guesser: Box::new(ExtensionGuesser),
            principals: Box::new(FixedPrincipal::default()),
        }
    }
}

/// Filesystem-backed blob storage.
///
/// Writes are eager: the payload lands under its final path during `store`,
/// and the joined transaction participant undoes the write on abort. A blob
/// becomes a ghost when logical deletion outpaces physical deletion; the
/// ghost sweep reconciles the two.
pub struct FsStorage {
    config: StorageConfig,
    ghosts: Arc<Mutex<GhostRegistry>>,
    allocator: Box<dyn KeyAllocator>,
    guesser: Box<dyn ContentTypeGuess>,
    principals: Box<dyn PrincipalResolver>,
}

impl std::fmt::Debug for FsStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsStorage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl FsStorage {
    /// Open a storage with default collaborators.
    ///
    /// The configured root must already exist; a missing root is a
    /// configuration error, not something to paper over at runtime.
    pub fn open(config: StorageConfig) -> StoreResult<Self> {
        Self::open_with(config, Collaborators::default())
    }

    /// Open a storage with explicit collaborators.
    pub fn open_with(config: StorageConfig, collaborators: Collaborators) -> StoreResult<Self> {
        if !config.root.is_dir() {
            return Err(StoreError::MissingStorageRoot(config.root.clone()));
        }
        if config.strategy == ShardStrategy::User {
            fs::create_dir_all(config.root.join(SHARE_DIR))?;
            fs::create_dir_all(config.root.join(USER_DIR))?;
        }
        debug!(
            root = %config.root.display(),
            storage = %config.storage_name,
            strategy = ?config.strategy,
            "storage opened"
        );
        Ok(Self {
            config,
            ghosts: Arc::new(Mutex::new(GhostRegistry::new())),
            allocator: collaborators.allocator,
            guesser: collaborators.guesser,
            principals: collaborators.principals,
        })
    }

    /// The storage root directory.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// The name binding records to this instance.
    pub fn storage_name(&self) -> &str {
        &self.config.storage_name
    }

    /// The active sharding strategy.
    pub fn strategy(&self) -> ShardStrategy {
        self.config.strategy
    }

    /// Store a staged payload and join the write to `txn`.
    ///
    /// The write is eager: after this call the bytes sit at their final
    /// path. Committing the transaction needs no further physical action;
    /// aborting removes the file (or ghosts it when removal fails). The
    /// rollback participant joins before the move, so a failure at any
    /// later step still leaves the write covered by abort. The staged file
    /// is consumed even if a later step fails.
    pub fn store(
        &self,
        txn: &mut Transaction,
        temp: TempBlob,
        file_name: Option<&str>,
        namespace: Option<&str>,
    ) -> StoreResult<Arc<BlobRecord>> {
        // Mint the owner key lazily, before any path work, so the sharding
        // input exists by the time the strategy needs it.
        let owner_key = match self.config.strategy.needs_owner_key() {
            true => Some(self.allocator.allocate()?),
            false => None,
        };

        // Nothing may touch the filesystem for a transaction that can no
        // longer accept the rollback participant.
        if !txn.is_open() {
            return Err(StoreError::TransactionClosed);
        }

        let principal = self.principals.current();
        let id = path::compute_id(
            &self.config.root,
            self.config.strategy,
            file_name,
            namespace,
            owner_key,
            &principal,
        )?;

        // A rename does not alter the payload, so the staged file already
        // has the final size.
        let size = fs::metadata(temp.path())?.len();
        let content_type = file_name.and_then(|name| self.guesser.guess(name));

        let record = Arc::new(BlobRecord::new(
            id,
            self.config.storage_name.clone(),
            namespace.map(str::to_string),
            file_name.map(str::to_string),
            content_type,
            size,
            owner_key,
        ));

        // Join before the filesystem write: once the bytes land under the
        // final path, abort must already be able to undo them. A failed
        // move leaves no file, which the idempotent abort treats as done.
        txn.join(Box::new(StoreParticipant {
            root: self.config.root.clone(),
            record: Arc::clone(&record),
            ghosts: Arc::clone(&self.ghosts),
        }))?;

        let dest = self.config.root.join(record.id());
        temp.consume(&dest)?;

        debug!(id = record.id(), size, "blob stored");
        Ok(record)
    }

    /// Logically remove a blob.
    ///
    /// The record becomes a ghost immediately; the bytes are left for the
    /// ghost sweep, so removal never fails on filesystem state.
    pub fn remove(&self, record: &BlobRecord) {
        record.mark_ghost();
        let ghost = GhostRecord::project(record, &self.config.root);
        self.lock_ghosts().insert(ghost);
        debug!(id = record.id(), "blob removed, awaiting collection");
    }

    /// Open the stored file for reading.
    ///
    /// A ghosted record is not found even while its bytes still exist. An
    /// existing but unreadable file surfaces as an I/O error instead.
    pub fn open_blob(&self, record: &BlobRecord) -> StoreResult<File> {
        if record.is_ghost() {
            return Err(StoreError::NotFound(record.id().to_string()));
        }
        let full = self.config.root.join(record.id());
        if !full.is_file() {
            return Err(StoreError::NotFound(record.id().to_string()));
        }
        Ok(File::open(full)?)
    }

    /// Read the full payload of a blob.
    pub fn read_blob(&self, record: &BlobRecord) -> StoreResult<Vec<u8>> {
        let mut file = self.open_blob(record)?;
        let mut data = Vec::with_capacity(record.size() as usize);
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Size in bytes, cached on the record at store time.
    pub fn size(&self, record: &BlobRecord) -> u64 {
        record.size()
    }

    /// Content type, cached on the record at store time.
    pub fn content_type<'a>(&self, record: &'a BlobRecord) -> Option<&'a str> {
        record.content_type()
    }

    /// Number of ghosts awaiting collection.
    pub fn ghost_count(&self) -> usize {
        self.lock_ghosts().len()
    }

    /// Whether an id is registered as a ghost.
    pub fn contains_ghost(&self, id: &str) -> bool {
        self.lock_ghosts().contains(id)
    }

    /// Sweep the ghost registry, physically deleting what it can.
    ///
    /// Entries are visited in insertion order. With a time limit the sweep
    /// stops as soon as the deadline passes, leaving the rest for the next
    /// invocation; this bounds pause time for latency-sensitive hosts.
    /// Removal failures are skipped silently and retried next sweep; files
    /// already gone out-of-band are pruned unconditionally.
    pub fn remove_ghost_files(&self, time_limit: Option<Duration>) {
        let deadline = time_limit.map(|limit| Instant::now() + limit);
        // Snapshot so the sweep only ever prunes entries it saw at the
        // start, not ghosts registered mid-pass.
        let snapshot: Vec<GhostRecord> = self.lock_ghosts().iter().cloned().collect();

        let mut collected = Vec::new();
        for ghost in &snapshot {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    debug!(
                        collected = collected.len(),
                        remaining = snapshot.len() - collected.len(),
                        "ghost sweep stopped at time limit"
                    );
                    break;
                }
            }
            if ghost.path.exists() {
                match fs::remove_file(&ghost.path) {
                    Ok(()) => collected.push(ghost.id.clone()),
                    Err(e) => {
                        // Keep the entry; the next sweep retries.
                        debug!(id = %ghost.id, error = %e, "ghost removal failed, keeping entry");
                    }
                }
            } else {
                collected.push(ghost.id.clone());
            }
        }

        let mut ghosts = self.lock_ghosts();
        for id in &collected {
            ghosts.remove(id);
        }
        debug!(
            collected = collected.len(),
            remaining = ghosts.len(),
            "ghost sweep complete"
        );
    }

    /// Targeted collection of a single ghost outside the sweep.
    ///
    /// Unknown ids are a no-op; a failed removal keeps the entry registered.
    pub fn remove_ghost_file(&self, id: &str) {
        let ghost = self.lock_ghosts().get(id).cloned();
        let Some(ghost) = ghost else {
            return;
        };
        if ghost.path.exists() {
            if let Err(e) = fs::remove_file(&ghost.path) {
                warn!(id, error = %e, "ghost removal failed, keeping entry");
                return;
            }
        }
        self.lock_ghosts().remove(id);
        debug!(id, "ghost collected");
    }

    /// Re-derive the owner key from a bushy-relative directory path.
    ///
    /// Maintenance helper for going from a stored file back to its owning
    /// object without consulting the object graph.
    pub fn owner_key_for_path(&self, rel_path: &str) -> StoreResult<OwnerKey> {
        path::owner_key_for_path(rel_path)
    }

    fn lock_ghosts(&self) -> std::sync::MutexGuard<'_, GhostRegistry> {
        self.ghosts.lock().expect("ghost registry poisoned")
    }
}

/// Transaction participant for one eagerly-written blob.
struct StoreParticipant {
    root: PathBuf,
    record: Arc<BlobRecord>,
    ghosts: Arc<Mutex<GhostRegistry>>,
}

impl TxnParticipant for StoreParticipant {
    // vote and commit stay no-ops: the eager write is the commit.

    fn abort(&mut self) {
        let full = self.root.join(self.record.id());
        if !full.is_file() {
            // Already gone; aborting twice must stay quiet.
            return;
        }
        match fs::remove_file(&full) {
            Ok(()) => {
                debug!(id = self.record.id(), "store aborted, file removed");
            }
            Err(e) => {
                // Abort must not fail; defer the deletion to the sweep.
                warn!(id = self.record.id(), error = %e, "abort could not remove file, ghosting");
                self.record.mark_ghost();
                let ghost = GhostRecord::project(&self.record, &self.root);
                self.ghosts
                    .lock()
                    .expect("ghost registry poisoned")
                    .insert(ghost);
            }
        }
    }
}
