//! Nullable store — thread-safe in-memory vote table and catalog for testing.

use songjam_store::{CatalogStore, StoreError, VoteStore};
use songjam_types::{Entry, EntryId, Points, UserId, VoteRecord};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Which store operation a scripted failure applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreOp {
    FetchVotes,
    Insert,
    Update,
    FetchEntries,
}

/// A recorded call, in the order the store saw them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreCall {
    FetchVotes {
        user: UserId,
    },
    Insert {
        user: UserId,
        entry: EntryId,
        points: Points,
    },
    Update {
        user: UserId,
        entry: EntryId,
        points: Points,
    },
    FetchEntries,
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Insert { .. } | Self::Update { .. })
    }
}

struct ScriptedFailure {
    error: StoreError,
    /// `None` fails forever.
    remaining: Option<u32>,
}

/// An in-memory vote table plus entry catalog.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullVoteStore {
    votes: Mutex<HashMap<(UserId, EntryId), Points>>,
    entries: Mutex<Vec<Entry>>,
    failures: Mutex<HashMap<(StoreOp, Option<EntryId>), ScriptedFailure>>,
    calls: Mutex<Vec<StoreCall>>,
    write_gate: Mutex<Option<Arc<Semaphore>>>,
}

impl NullVoteStore {
    pub fn new() -> Self {
        Self {
            votes: Mutex::new(HashMap::new()),
            entries: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            write_gate: Mutex::new(None),
        }
    }

    pub fn with_entries(entries: Vec<Entry>) -> Self {
        let store = Self::new();
        *store.entries.lock().unwrap() = entries;
        store
    }

    /// Put a row directly, bypassing scripting and the call log.
    pub fn put_vote(&self, user: &UserId, entry: &EntryId, points: Points) {
        self.votes
            .lock()
            .unwrap()
            .insert((user.clone(), entry.clone()), points);
    }

    /// The stored point total for (user, entry), if a row exists.
    pub fn points(&self, user: &UserId, entry: &EntryId) -> Option<Points> {
        self.votes
            .lock()
            .unwrap()
            .get(&(user.clone(), entry.clone()))
            .copied()
    }

    /// Fail the next `times` calls of `op` (for `entry`, or any entry when
    /// `None`) with `error`.
    pub fn fail_next(&self, op: StoreOp, entry: Option<&EntryId>, times: u32, error: StoreError) {
        self.failures.lock().unwrap().insert(
            (op, entry.cloned()),
            ScriptedFailure {
                error,
                remaining: Some(times),
            },
        );
    }

    /// Fail every call of `op` (for `entry`, or any entry when `None`).
    pub fn fail_always(&self, op: StoreOp, entry: Option<&EntryId>, error: StoreError) {
        self.failures.lock().unwrap().insert(
            (op, entry.cloned()),
            ScriptedFailure {
                error,
                remaining: None,
            },
        );
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    /// Make every insert/update wait until [`Self::release_writes`] lets it
    /// through. Calls are still logged when they arrive.
    pub fn hold_writes(&self) {
        *self.write_gate.lock().unwrap() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `n` held writes proceed.
    pub fn release_writes(&self, n: usize) {
        if let Some(gate) = self.write_gate.lock().unwrap().as_ref() {
            gate.add_permits(n);
        }
    }

    /// All calls received so far.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn write_count(&self) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| c.is_write()).count()
    }

    fn record(&self, call: StoreCall) {
        self.calls.lock().unwrap().push(call);
    }

    /// Consume a scripted failure, preferring an entry-specific one.
    fn take_failure(&self, op: StoreOp, entry: Option<&EntryId>) -> Option<StoreError> {
        let mut failures = self.failures.lock().unwrap();
        let specific = entry.map(|e| (op, Some(e.clone())));
        let key = match specific {
            Some(key) if failures.contains_key(&key) => key,
            _ => (op, None),
        };
        let scripted = failures.get_mut(&key)?;
        let error = scripted.error.clone();
        match scripted.remaining.as_mut() {
            None => {}
            Some(0) => {
                failures.remove(&key);
                return None;
            }
            Some(n) => {
                *n -= 1;
                if *n == 0 {
                    failures.remove(&key);
                }
            }
        }
        Some(error)
    }

    async fn pass_write_gate(&self) -> Result<(), StoreError> {
        let gate = self.write_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire()
                .await
                .map_err(|e| StoreError::Backend(e.to_string()))?
                .forget();
        }
        Ok(())
    }
}

impl Default for NullVoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteStore for NullVoteStore {
    async fn fetch_votes(&self, user: &UserId) -> Result<Vec<VoteRecord>, StoreError> {
        self.record(StoreCall::FetchVotes { user: user.clone() });
        if let Some(error) = self.take_failure(StoreOp::FetchVotes, None) {
            return Err(error);
        }
        let mut records: Vec<VoteRecord> = self
            .votes
            .lock()
            .unwrap()
            .iter()
            .filter(|((u, _), _)| u == user)
            .map(|((_, entry), &points)| VoteRecord::new(entry.clone(), points))
            .collect();
        records.sort_by(|a, b| a.entry_id.cmp(&b.entry_id));
        Ok(records)
    }

    async fn insert_vote(
        &self,
        user: &UserId,
        entry: &EntryId,
        points: Points,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::Insert {
            user: user.clone(),
            entry: entry.clone(),
            points,
        });
        self.pass_write_gate().await?;
        if let Some(error) = self.take_failure(StoreOp::Insert, Some(entry)) {
            return Err(error);
        }
        let mut votes = self.votes.lock().unwrap();
        let key = (user.clone(), entry.clone());
        if votes.contains_key(&key) {
            return Err(StoreError::Conflict(format!("{user}/{entry}")));
        }
        votes.insert(key, points);
        Ok(())
    }

    async fn update_vote(
        &self,
        user: &UserId,
        entry: &EntryId,
        new_points: Points,
    ) -> Result<(), StoreError> {
        self.record(StoreCall::Update {
            user: user.clone(),
            entry: entry.clone(),
            points: new_points,
        });
        self.pass_write_gate().await?;
        if let Some(error) = self.take_failure(StoreOp::Update, Some(entry)) {
            return Err(error);
        }
        let mut votes = self.votes.lock().unwrap();
        match votes.get_mut(&(user.clone(), entry.clone())) {
            Some(points) => {
                *points = new_points;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("{user}/{entry}"))),
        }
    }
}

impl CatalogStore for NullVoteStore {
    async fn fetch_entries(&self) -> Result<Vec<Entry>, StoreError> {
        self.record(StoreCall::FetchEntries);
        if let Some(error) = self.take_failure(StoreOp::FetchEntries, None) {
            return Err(error);
        }
        Ok(self.entries.lock().unwrap().clone())
    }
}
