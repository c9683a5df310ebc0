//! Submission coordinator — moves pending votes into the remote store.
//!
//! The store has no multi-row transactions, so every pending entry is written
//! on its own: an update when the store already holds a row for it, an insert
//! otherwise. Entries succeed or fail independently. A success is settled
//! into the ledger as soon as it lands; a failure leaves that entry's pending
//! votes in place so the user can resubmit exactly those.
//!
//! Updates write the absolute total `committed + pending` computed from the
//! locally cached committed count. If an earlier write reached the store but
//! its response was lost, a resubmission counts those votes twice.

use futures_util::future::join_all;
use std::sync::{Arc, Mutex};

use songjam_ledger::PendingVote;
use songjam_store::{StoreError, VoteStore};
use songjam_types::{EntryId, UserId};
use songjam_utils::RetryPolicy;

use crate::session::{lock_state, SessionState};
use crate::SessionError;

/// Whether a submission is in flight, and for which identity epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Submitting {
        epoch: u64,
    },
}

/// One entry the store refused, after retries.
#[derive(Debug)]
pub struct SubmitFailure {
    pub entry_id: EntryId,
    pub error: StoreError,
}

/// Aggregate outcome of [`SubmissionCoordinator::submit_all`].
#[derive(Debug, Default)]
pub struct SubmitReport {
    pub success_count: usize,
    pub failures: Vec<SubmitFailure>,
}

impl SubmitReport {
    /// Every attempted entry was stored.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn attempted(&self) -> usize {
        self.success_count + self.failures.len()
    }
}

pub struct SubmissionCoordinator<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

/// Returns the phase to `Idle` when the submission ends, however it ends,
/// unless an identity change already moved the session on.
struct PhaseGuard<'a> {
    state: &'a Mutex<SessionState>,
    epoch: u64,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock_state(self.state);
        if state.phase == (SubmitPhase::Submitting { epoch: self.epoch }) {
            state.phase = SubmitPhase::Idle;
        }
    }
}

impl<S: VoteStore> SubmissionCoordinator<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    /// Submit every pending entry.
    ///
    /// Rejected without touching the store when another submission is in
    /// flight, when nobody is signed in, or when the signed-in user's stored
    /// votes were never loaded.
    pub(crate) async fn submit_all(
        &self,
        state: &Mutex<SessionState>,
    ) -> Result<SubmitReport, SessionError> {
        let (user, epoch, batch) = {
            let mut s = lock_state(state);
            if s.phase != SubmitPhase::Idle {
                return Err(SessionError::SubmissionInProgress);
            }
            let user = s.user.clone().ok_or(SessionError::NotAuthenticated)?;
            if !s.seeded {
                return Err(SessionError::NotSeeded);
            }
            let batch = s.ledger.pending_batch();
            if batch.is_empty() {
                return Ok(SubmitReport::default());
            }
            s.phase = SubmitPhase::Submitting { epoch: s.epoch };
            (user, s.epoch, batch)
        };
        let _guard = PhaseGuard { state, epoch };

        tracing::info!(user = %user, entries = batch.len(), "submitting votes");

        let outcomes = join_all(
            batch
                .into_iter()
                .map(|vote| self.submit_entry(state, &user, epoch, vote)),
        )
        .await;

        let mut report = SubmitReport::default();
        for (entry_id, result) in outcomes {
            match result {
                Ok(()) => report.success_count += 1,
                Err(error) => report.failures.push(SubmitFailure { entry_id, error }),
            }
        }

        let current_epoch = lock_state(state).epoch;
        if current_epoch != epoch {
            tracing::warn!(
                user = %user,
                "identity changed during submission, discarding results"
            );
            return Err(SessionError::IdentityChanged);
        }

        tracing::info!(
            succeeded = report.success_count,
            failed = report.failures.len(),
            "submission finished"
        );
        Ok(report)
    }

    async fn submit_entry(
        &self,
        state: &Mutex<SessionState>,
        user: &UserId,
        epoch: u64,
        vote: PendingVote,
    ) -> (EntryId, Result<(), StoreError>) {
        let store = &*self.store;
        let entry = &vote.entry_id;

        let result = if vote.has_record() {
            let total = vote.new_total();
            self.retry
                .run_if(
                    || store.update_vote(user, entry, total),
                    StoreError::is_transient,
                )
                .await
        } else {
            let points = vote.points;
            self.retry
                .run_if(
                    || store.insert_vote(user, entry, points),
                    StoreError::is_transient,
                )
                .await
        };

        match &result {
            Ok(()) => {
                let mut s = lock_state(state);
                if s.epoch == epoch {
                    s.ledger.settle(entry, vote.points);
                    tracing::debug!(entry = %entry, points = vote.points, "votes stored");
                } else {
                    tracing::debug!(entry = %entry, "stale submission result dropped");
                }
            }
            Err(e) => {
                tracing::warn!(entry = %entry, error = %e, "vote submission failed");
            }
        }

        (vote.entry_id, result)
    }
}
