//! Read-only views of ledger state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use songjam_types::{EntryId, Points, VoteLimits};

/// A copy of the ledger for rendering. Never fed back into the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub limits: VoteLimits,
    pub committed: BTreeMap<EntryId, Points>,
    pub pending: BTreeMap<EntryId, Points>,
    /// Unclamped; negative only when the store handed us more votes than allowed.
    pub remaining: i64,
}

impl LedgerSnapshot {
    /// Committed plus pending votes for one entry.
    pub fn votes_for(&self, entry: &EntryId) -> Points {
        self.committed.get(entry).copied().unwrap_or(0)
            + self.pending.get(entry).copied().unwrap_or(0)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// One entry's share of a submission batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingVote {
    pub entry_id: EntryId,
    /// Votes to move into the store.
    pub points: Points,
    /// Votes the store already holds for this entry, as far as we know.
    pub committed: Points,
    /// The store holds a row for this entry, possibly with zero points.
    pub stored: bool,
}

impl PendingVote {
    /// Whether the store already has a row for this entry.
    pub fn has_record(&self) -> bool {
        self.stored || self.committed > 0
    }

    /// The absolute total to write when updating an existing row.
    pub fn new_total(&self) -> Points {
        self.committed + self.points
    }
}
