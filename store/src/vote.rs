//! Vote storage trait.

use std::future::Future;

use crate::StoreError;
use songjam_types::{EntryId, Points, UserId, VoteRecord};

/// Trait for the remote table holding one row per (user, entry) pair.
///
/// The store offers no multi-row atomicity: each method touches a single row
/// and may fail independently of the others.
pub trait VoteStore {
    /// All vote rows stored for `user`.
    fn fetch_votes(
        &self,
        user: &UserId,
    ) -> impl Future<Output = Result<Vec<VoteRecord>, StoreError>> + Send;

    /// Create the row for (user, entry).
    ///
    /// Fails with [`StoreError::Conflict`] if the row already exists.
    fn insert_vote(
        &self,
        user: &UserId,
        entry: &EntryId,
        points: Points,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Overwrite the stored point total for an existing row.
    ///
    /// Fails with [`StoreError::NotFound`] if no row matched.
    fn update_vote(
        &self,
        user: &UserId,
        entry: &EntryId,
        new_points: Points,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}
