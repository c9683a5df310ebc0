//! A persisted vote row as the remote store returns it.

use serde::{Deserialize, Serialize};

use crate::{EntryId, Points};

/// One user's stored point total for one entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub entry_id: EntryId,
    pub points: Points,
}

impl VoteRecord {
    pub fn new(entry_id: impl Into<EntryId>, points: Points) -> Self {
        Self {
            entry_id: entry_id.into(),
            points,
        }
    }
}
