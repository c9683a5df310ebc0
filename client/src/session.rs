//! The voting session — one signed-in user's ballot.
//!
//! A [`VotingSession`] is constructed once per client and handed to whatever
//! renders the ballot. It owns the vote ledger behind a mutex that is never
//! held across an `.await`, so the presentation layer can keep querying it
//! while a submission or reseed is suspended on the network.
//!
//! Every identity change bumps an epoch counter. Async work started under an
//! older epoch (seeding, per-entry submissions) checks the epoch before
//! touching the ledger and drops its result if the user has changed since.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

use songjam_ledger::{LedgerSnapshot, SeedReport, VoteLedger};
use songjam_store::{IdentityProvider, StoreError, VoteStore};
use songjam_types::{EntryId, Points, UserId, VoteLimits};
use songjam_utils::RetryPolicy;

use crate::coordinator::{SubmissionCoordinator, SubmitPhase, SubmitReport};
use crate::SessionError;

pub(crate) struct SessionState {
    pub(crate) ledger: VoteLedger,
    pub(crate) user: Option<UserId>,
    /// Committed votes reflect the store for `user`.
    pub(crate) seeded: bool,
    pub(crate) epoch: u64,
    pub(crate) phase: SubmitPhase,
}

pub(crate) fn lock_state(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct VotingSession<S> {
    store: Arc<S>,
    retry: RetryPolicy,
    state: Mutex<SessionState>,
    coordinator: SubmissionCoordinator<S>,
}

impl<S: VoteStore> VotingSession<S> {
    /// An empty, signed-out session.
    pub fn new(store: Arc<S>, limits: VoteLimits, retry: RetryPolicy) -> Self {
        let coordinator = SubmissionCoordinator::new(Arc::clone(&store), retry);
        Self {
            store,
            retry,
            state: Mutex::new(SessionState {
                ledger: VoteLedger::new(limits),
                user: None,
                seeded: false,
                epoch: 0,
                phase: SubmitPhase::Idle,
            }),
            coordinator,
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        lock_state(&self.state)
    }

    // ── Presentation surface ────────────────────────────────────────────

    pub fn user(&self) -> Option<UserId> {
        self.state().user.clone()
    }

    pub fn limits(&self) -> VoteLimits {
        self.state().ledger.limits()
    }

    /// Whether the signed-in user's stored votes have been loaded.
    pub fn is_ready(&self) -> bool {
        let s = self.state();
        s.user.is_some() && s.seeded
    }

    pub fn remaining_budget(&self) -> i64 {
        self.state().ledger.remaining_budget()
    }

    pub fn display_remaining(&self) -> u32 {
        self.state().ledger.display_remaining()
    }

    pub fn votes_for(&self, entry: &EntryId) -> Points {
        self.state().ledger.votes_for(entry)
    }

    pub fn can_add(&self, entry: &EntryId) -> bool {
        self.state().ledger.can_add(entry)
    }

    /// False while a submission is in flight: the pending votes are already
    /// on their way to the store.
    pub fn can_remove(&self, entry: &EntryId) -> bool {
        let s = self.state();
        s.phase == SubmitPhase::Idle && s.ledger.can_remove(entry)
    }

    pub fn add(&self, entry: &EntryId) -> bool {
        self.state().ledger.add(entry)
    }

    pub fn remove(&self, entry: &EntryId) -> bool {
        let mut s = self.state();
        if s.phase != SubmitPhase::Idle {
            return false;
        }
        s.ledger.remove(entry)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state().ledger.snapshot()
    }

    pub fn phase(&self) -> SubmitPhase {
        self.state().phase
    }

    /// While true, [`Self::remove`] is refused. Adds are still accepted and
    /// stay pending for the next submission.
    pub fn is_submitting(&self) -> bool {
        matches!(self.phase(), SubmitPhase::Submitting { .. })
    }

    /// Push every pending entry to the store. See [`SubmissionCoordinator`].
    pub async fn submit_all(&self) -> Result<SubmitReport, SessionError> {
        self.coordinator.submit_all(&self.state).await
    }

    // ── Identity ────────────────────────────────────────────────────────

    /// Resolve the signed-in user from `identity` and load their votes.
    pub async fn start<I: IdentityProvider>(
        &self,
        identity: &I,
    ) -> Result<Option<SeedReport>, SessionError> {
        let user = self
            .retry
            .run_if(|| identity.current_user(), StoreError::is_transient)
            .await?;
        self.switch_identity(user).await
    }

    /// Discard all ballot state and, if `user` is present, load their
    /// stored votes.
    ///
    /// Any submission still in flight for the previous user has its results
    /// discarded. Returns [`SessionError::IdentityChanged`] if yet another
    /// switch happened while the votes were loading.
    pub async fn switch_identity(
        &self,
        user: Option<UserId>,
    ) -> Result<Option<SeedReport>, SessionError> {
        let epoch = {
            let mut s = self.state();
            s.epoch += 1;
            s.ledger.reset();
            s.user = user.clone();
            s.seeded = false;
            s.phase = SubmitPhase::Idle;
            s.epoch
        };

        let Some(user) = user else {
            tracing::info!("signed out, ballot cleared");
            return Ok(None);
        };
        tracing::info!(user = %user, "loading stored votes");

        let store = &*self.store;
        let records = self
            .retry
            .run_if(|| store.fetch_votes(&user), StoreError::is_transient)
            .await
            .map_err(|e| {
                tracing::warn!(user = %user, error = %e, "failed to load stored votes");
                e
            })?;

        let mut s = self.state();
        if s.epoch != epoch {
            tracing::debug!(user = %user, "identity changed while loading votes");
            return Err(SessionError::IdentityChanged);
        }
        let report = s.ledger.seed(records);
        s.seeded = true;
        tracing::info!(
            user = %user,
            entries = report.entries,
            points = report.points,
            "stored votes loaded"
        );
        Ok(Some(report))
    }

    /// Reload the current user's stored votes, dropping pending ones.
    pub async fn reseed(&self) -> Result<Option<SeedReport>, SessionError> {
        let user = self.user();
        self.switch_identity(user).await
    }

    pub async fn logout(&self) {
        // Signing out never touches the store.
        let _ = self.switch_identity(None).await;
    }

    /// Apply every identity change published on `identity` until the sender
    /// goes away. Load failures are logged and left for the next change or
    /// an explicit [`Self::reseed`].
    pub async fn follow_identity(&self, mut identity: watch::Receiver<Option<UserId>>) {
        loop {
            let user = identity.borrow_and_update().clone();
            if user != self.user() || !self.is_ready() {
                match self.switch_identity(user).await {
                    Ok(_) | Err(SessionError::IdentityChanged) => {}
                    Err(e) => tracing::warn!("identity change not applied: {e}"),
                }
            }
            if identity.changed().await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songjam_nullables::{NullIdentity, NullVoteStore, StoreCall, StoreOp};
    use songjam_types::VoteRecord;

    fn entry(s: &str) -> EntryId {
        EntryId::new(s)
    }

    fn session(store: &Arc<NullVoteStore>) -> VotingSession<NullVoteStore> {
        VotingSession::new(
            Arc::clone(store),
            VoteLimits::new(10, 3).unwrap(),
            RetryPolicy::new(2, 0),
        )
    }

    #[tokio::test]
    async fn start_seeds_from_identity_provider() {
        let store = Arc::new(NullVoteStore::new());
        let alice = UserId::new("alice");
        store.put_vote(&alice, &entry("A"), 2);

        let session = session(&store);
        let report = session
            .start(&NullIdentity::signed_in("alice"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(report.points, 2);
        assert_eq!(session.user(), Some(alice));
        assert_eq!(session.votes_for(&entry("A")), 2);
        assert_eq!(session.remaining_budget(), 8);
        assert!(session.is_ready());
    }

    #[tokio::test]
    async fn signed_out_start_leaves_empty_ballot() {
        let store = Arc::new(NullVoteStore::new());
        let session = session(&store);
        assert!(session.start(&NullIdentity::default()).await.unwrap().is_none());
        assert_eq!(session.user(), None);
        assert!(!session.is_ready());
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn switching_users_discards_previous_ballot() {
        let store = Arc::new(NullVoteStore::new());
        store.put_vote(&UserId::new("alice"), &entry("A"), 3);
        store.put_vote(&UserId::new("bob"), &entry("B"), 1);

        let session = session(&store);
        session.switch_identity(Some("alice".into())).await.unwrap();
        session.add(&entry("C"));

        session.switch_identity(Some("bob".into())).await.unwrap();
        assert_eq!(session.votes_for(&entry("A")), 0);
        assert_eq!(session.votes_for(&entry("C")), 0);
        assert_eq!(session.votes_for(&entry("B")), 1);
        assert_eq!(session.remaining_budget(), 9);
    }

    #[tokio::test]
    async fn logout_resets_to_full_budget() {
        let store = Arc::new(NullVoteStore::new());
        store.put_vote(&UserId::new("alice"), &entry("A"), 3);
        let session = session(&store);
        session.switch_identity(Some("alice".into())).await.unwrap();
        session.add(&entry("B"));

        session.logout().await;
        assert_eq!(session.user(), None);
        assert_eq!(session.votes_for(&entry("A")), 0);
        assert_eq!(session.votes_for(&entry("B")), 0);
        assert_eq!(session.remaining_budget(), 10);
    }

    #[tokio::test]
    async fn transient_seed_failures_are_retried() {
        let store = Arc::new(NullVoteStore::new());
        store.put_vote(&UserId::new("alice"), &entry("A"), 1);
        store.fail_next(
            StoreOp::FetchVotes,
            None,
            2,
            StoreError::Transient("timeout".into()),
        );
        let session = session(&store);
        session.switch_identity(Some("alice".into())).await.unwrap();
        assert_eq!(session.votes_for(&entry("A")), 1);
        let fetches = store
            .calls()
            .into_iter()
            .filter(|c| matches!(c, StoreCall::FetchVotes { .. }))
            .count();
        assert_eq!(fetches, 3);
    }

    #[tokio::test]
    async fn failed_seed_blocks_submission() {
        let store = Arc::new(NullVoteStore::new());
        store.fail_always(
            StoreOp::FetchVotes,
            None,
            StoreError::Unauthorized("expired".into()),
        );
        let session = session(&store);
        let err = session
            .switch_identity(Some("alice".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Store(StoreError::Unauthorized(_))));
        assert!(!session.is_ready());

        session.add(&entry("A"));
        let err = session.submit_all().await.unwrap_err();
        assert!(matches!(err, SessionError::NotSeeded));
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn follow_identity_tracks_login_and_logout() {
        let store = Arc::new(NullVoteStore::new());
        store.put_vote(&UserId::new("alice"), &entry("A"), 2);
        let session = session(&store);
        let identity = NullIdentity::default();
        let rx = identity.subscribe();

        let driver = async {
            tokio::task::yield_now().await;
            identity.login("alice");
            while !session.is_ready() {
                tokio::task::yield_now().await;
            }
            assert_eq!(session.votes_for(&entry("A")), 2);

            identity.logout();
            while session.user().is_some() {
                tokio::task::yield_now().await;
            }
            assert_eq!(session.remaining_budget(), 10);
            drop(identity);
        };

        tokio::join!(session.follow_identity(rx), driver);
        assert_eq!(
            store.calls(),
            vec![StoreCall::FetchVotes {
                user: UserId::new("alice")
            }]
        );
    }

    #[tokio::test]
    async fn seeding_keeps_stored_records_verbatim() {
        let store = Arc::new(NullVoteStore::new());
        let alice = UserId::new("alice");
        store.put_vote(&alice, &entry("A"), 1);
        store.put_vote(&alice, &entry("B"), 2);
        let session = session(&store);
        session.switch_identity(Some(alice)).await.unwrap();

        let snapshot = session.snapshot();
        let records: Vec<VoteRecord> = snapshot
            .committed
            .iter()
            .map(|(id, &points)| VoteRecord::new(id.clone(), points))
            .collect();
        assert_eq!(
            records,
            vec![VoteRecord::new("A", 1), VoteRecord::new("B", 2)]
        );
        assert!(snapshot.pending.is_empty());
    }
}
