use tracing::debug;

use crate::error::{StoreError, StoreResult};

/// A participant joined to a [`Transaction`].
///
/// The coordinator invokes exactly one terminal sequence per participant:
/// `vote` then `commit` then `finish` on commit, or `abort` then `finish`
/// on abort. All hooks default to no-ops.
pub trait TxnParticipant: Send {
    /// Pre-commit validation hook. Must not mutate state.
    ///
    /// A vote failure aborts the whole transaction.
    fn vote(&mut self) -> StoreResult<()> {
        Ok(())
    }

    /// Commit hook. For eager-write storage the physical write already
    /// happened at store time, so the default is a no-op.
    fn commit(&mut self) {}

    /// Rollback hook. Must be idempotent and must not fail.
    fn abort(&mut self) {}

    /// Cleanup hook that runs regardless of the commit/abort outcome.
    fn finish(&mut self) {}
}

/// Resolution state of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnState {
    /// Open; participants may still join.
    Pending,
    /// Terminal: all participants voted and committed.
    Committed,
    /// Terminal: all participants rolled back.
    Aborted,
}

/// Explicit transaction object coordinating blob writes.
///
/// Every `store` call joins a participant whose abort hook undoes the eager
/// write. The caller resolves the transaction exactly once with
/// [`commit`](Self::commit) or [`abort`](Self::abort); both consume the
/// transaction, so the type system rules out a second terminal callback.
/// Dropping an unresolved transaction aborts it.
#[derive(Default)]
pub struct Transaction {
    participants: Vec<Box<dyn TxnParticipant>>,
    state: TxnState,
}

impl Default for TxnState {
    fn default() -> Self {
        Self::Pending
    }
}

impl Transaction {
    /// Start a new, open transaction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current resolution state.
    pub fn state(&self) -> TxnState {
        self.state
    }

    /// Whether participants may still join.
    pub fn is_open(&self) -> bool {
        self.state == TxnState::Pending
    }

    /// Number of joined participants.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Join a participant. Only legal while the transaction is open.
    pub fn join(&mut self, participant: Box<dyn TxnParticipant>) -> StoreResult<()> {
        if !self.is_open() {
            return Err(StoreError::TransactionClosed);
        }
        self.participants.push(participant);
        Ok(())
    }

    /// Commit: vote all participants, then commit, then finish.
    ///
    /// If any vote fails, every participant is aborted instead and the vote
    /// error is returned.
    pub fn commit(mut self) -> StoreResult<()> {
        let mut vote_error = None;
        for participant in &mut self.participants {
            if let Err(e) = participant.vote() {
                vote_error = Some(e);
                break;
            }
        }
        if let Some(e) = vote_error {
            self.run_abort();
            return Err(e);
        }
        for participant in &mut self.participants {
            participant.commit();
        }
        for participant in &mut self.participants {
            participant.finish();
        }
        self.state = TxnState::Committed;
        debug!(participants = self.participants.len(), "transaction committed");
        Ok(())
    }

    /// Abort: roll back all participants, then finish.
    pub fn abort(mut self) {
        self.run_abort();
    }

    fn run_abort(&mut self) {
        for participant in &mut self.participants {
            participant.abort();
        }
        for participant in &mut self.participants {
            participant.finish();
        }
        self.state = TxnState::Aborted;
        debug!(participants = self.participants.len(), "transaction aborted");
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        // An unresolved transaction rolls back, never silently commits.
        if self.state == TxnState::Pending {
            self.run_abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every hook invocation for assertions.
    struct Recorder {
        log: Arc<Mutex<Vec<&'static str>>>,
        fail_vote: bool,
    }

    impl Recorder {
        fn new(log: &Arc<Mutex<Vec<&'static str>>>) -> Box<Self> {
            Box::new(Self {
                log: Arc::clone(log),
                fail_vote: false,
            })
        }

        fn failing(log: &Arc<Mutex<Vec<&'static str>>>) -> Box<Self> {
            Box::new(Self {
                log: Arc::clone(log),
                fail_vote: true,
            })
        }
    }

    impl TxnParticipant for Recorder {
        fn vote(&mut self) -> StoreResult<()> {
            self.log.lock().unwrap().push("vote");
            if self.fail_vote {
                return Err(StoreError::TransactionClosed);
            }
            Ok(())
        }

        fn commit(&mut self) {
            self.log.lock().unwrap().push("commit");
        }

        fn abort(&mut self) {
            self.log.lock().unwrap().push("abort");
        }

        fn finish(&mut self) {
            self.log.lock().unwrap().push("finish");
        }
    }

    #[test]
    fn commit_runs_vote_commit_finish() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut txn = Transaction::new();
        txn.join(Recorder::new(&log)).unwrap();
        txn.commit().unwrap();
        assert_eq!(*log.lock().unwrap(), vec!["vote", "commit", "finish"]);
    }

    #[test]
    fn abort_runs_abort_finish() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut txn = Transaction::new();
        txn.join(Recorder::new(&log)).unwrap();
        txn.abort();
        assert_eq!(*log.lock().unwrap(), vec!["abort", "finish"]);
    }

    #[test]
    fn drop_aborts_unresolved_transaction() {
        let log = Arc::new(Mutex::new(Vec::new()));
        {
            let mut txn = Transaction::new();
            txn.join(Recorder::new(&log)).unwrap();
        }
        assert_eq!(*log.lock().unwrap(), vec!["abort", "finish"]);
    }

    #[test]
    fn failed_vote_aborts_everyone() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut txn = Transaction::new();
        txn.join(Recorder::new(&log)).unwrap();
        txn.join(Recorder::failing(&log)).unwrap();

        let err = txn.commit().unwrap_err();
        assert!(matches!(err, StoreError::TransactionClosed));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["vote", "vote", "abort", "abort", "finish", "finish"]
        );
    }

    #[test]
    fn all_participants_see_commit() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut txn = Transaction::new();
        txn.join(Recorder::new(&log)).unwrap();
        txn.join(Recorder::new(&log)).unwrap();
        assert_eq!(txn.participant_count(), 2);
        txn.commit().unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["vote", "vote", "commit", "commit", "finish", "finish"]
        );
    }

    #[test]
    fn new_transaction_is_open() {
        let txn = Transaction::new();
        assert!(txn.is_open());
        assert_eq!(txn.state(), TxnState::Pending);
        assert_eq!(txn.participant_count(), 0);
    }
}
