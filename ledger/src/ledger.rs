//! The vote ledger — budget accounting for one user's ballot.

use std::collections::{BTreeMap, BTreeSet};

use songjam_types::{EntryId, Points, VoteLimits, VoteRecord};

use crate::snapshot::{LedgerSnapshot, PendingVote};

/// Committed and pending votes for the signed-in user.
///
/// Invariants maintained by every public mutator:
/// - `committed[id] + pending[id] <= max_votes_per_entry`
/// - `sum(committed) + sum(pending) <= max_votes_per_user`
/// - no zero-valued pending entries are retained
/// - committed counts only grow (until [`VoteLedger::reset`])
///
/// [`VoteLedger::seed`] is the one exception: it accepts whatever the store
/// reports, even if that already breaks the caps, and reports the breakage.
#[derive(Clone, Debug)]
pub struct VoteLedger {
    limits: VoteLimits,
    committed: BTreeMap<EntryId, Points>,
    pending: BTreeMap<EntryId, Points>,
    /// Entries the store holds a row for, including zero-point rows.
    stored: BTreeSet<EntryId>,
}

/// Outcome of seeding committed votes from the store.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Entries with at least one committed vote after seeding.
    pub entries: usize,
    /// Sum of committed votes after seeding.
    pub points: u64,
    pub violations: Vec<IntegrityViolation>,
}

/// Stored votes that already break the ballot limits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntegrityViolation {
    EntryOverCap { entry_id: EntryId, points: u64 },
    BudgetExceeded { total: u64 },
}

impl VoteLedger {
    pub fn new(limits: VoteLimits) -> Self {
        Self {
            limits,
            committed: BTreeMap::new(),
            pending: BTreeMap::new(),
            stored: BTreeSet::new(),
        }
    }

    pub fn limits(&self) -> VoteLimits {
        self.limits
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn total_committed(&self) -> u64 {
        self.committed.values().map(|&p| u64::from(p)).sum()
    }

    pub fn total_pending(&self) -> u64 {
        self.pending.values().map(|&p| u64::from(p)).sum()
    }

    /// Budget left to allocate. Negative only if seeded data broke the limits.
    pub fn remaining_budget(&self) -> i64 {
        i64::from(self.limits.max_votes_per_user)
            - self.total_committed() as i64
            - self.total_pending() as i64
    }

    /// [`Self::remaining_budget`] clamped at zero for display.
    pub fn display_remaining(&self) -> u32 {
        self.remaining_budget().clamp(0, i64::from(u32::MAX)) as u32
    }

    pub fn committed_for(&self, entry: &EntryId) -> Points {
        self.committed.get(entry).copied().unwrap_or(0)
    }

    pub fn pending_for(&self, entry: &EntryId) -> Points {
        self.pending.get(entry).copied().unwrap_or(0)
    }

    pub fn votes_for(&self, entry: &EntryId) -> Points {
        self.committed_for(entry).saturating_add(self.pending_for(entry))
    }

    pub fn can_add(&self, entry: &EntryId) -> bool {
        self.remaining_budget() > 0 && self.votes_for(entry) < self.limits.max_votes_per_entry
    }

    /// Only pending votes can be taken back; committed votes are final.
    pub fn can_remove(&self, entry: &EntryId) -> bool {
        self.pending_for(entry) > 0
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    // ── Mutations ───────────────────────────────────────────────────────

    /// Allocate one pending vote to `entry`. Returns `false` (and changes
    /// nothing) when the budget or the entry cap would be exceeded.
    pub fn add(&mut self, entry: &EntryId) -> bool {
        if !self.can_add(entry) {
            return false;
        }
        *self.pending.entry(entry.clone()).or_insert(0) += 1;
        true
    }

    /// Take back one pending vote from `entry`. Returns `false` when there is
    /// nothing pending there.
    pub fn remove(&mut self, entry: &EntryId) -> bool {
        if !self.can_remove(entry) {
            return false;
        }
        self.decrement_pending(entry, 1);
        true
    }

    /// Forget everything. Used on logout and identity change.
    pub fn reset(&mut self) {
        self.committed.clear();
        self.pending.clear();
        self.stored.clear();
    }

    /// Replace committed votes with the rows persisted in the store.
    ///
    /// Duplicate rows for one entry are summed. Zero-point rows add no votes
    /// but still mark the entry as stored, so later submissions update that
    /// row instead of inserting a duplicate. Pending votes are left alone.
    pub fn seed<I>(&mut self, records: I) -> SeedReport
    where
        I: IntoIterator<Item = VoteRecord>,
    {
        let mut committed: BTreeMap<EntryId, Points> = BTreeMap::new();
        self.stored.clear();
        for record in records {
            self.stored.insert(record.entry_id.clone());
            if record.points == 0 {
                continue;
            }
            let slot = committed.entry(record.entry_id).or_insert(0);
            *slot = slot.saturating_add(record.points);
        }
        self.committed = committed;

        let mut violations = Vec::new();
        for (entry_id, &points) in &self.committed {
            if points > self.limits.max_votes_per_entry {
                tracing::warn!(
                    entry = %entry_id,
                    points,
                    cap = self.limits.max_votes_per_entry,
                    "stored votes exceed the per-entry cap"
                );
                violations.push(IntegrityViolation::EntryOverCap {
                    entry_id: entry_id.clone(),
                    points: u64::from(points),
                });
            }
        }
        let total = self.total_committed() + self.total_pending();
        if total > u64::from(self.limits.max_votes_per_user) {
            tracing::warn!(
                total,
                budget = self.limits.max_votes_per_user,
                "stored votes exceed the per-user budget"
            );
            violations.push(IntegrityViolation::BudgetExceeded { total });
        }

        SeedReport {
            entries: self.committed.len(),
            points: self.total_committed(),
            violations,
        }
    }

    /// Every pending entry with the committed count it sits on top of.
    pub fn pending_batch(&self) -> Vec<PendingVote> {
        self.pending
            .iter()
            .map(|(entry_id, &points)| PendingVote {
                entry_id: entry_id.clone(),
                points,
                committed: self.committed_for(entry_id),
                stored: self.stored.contains(entry_id),
            })
            .collect()
    }

    /// Record that the store accepted `points` votes for `entry`: they move
    /// from pending to committed in one step.
    pub fn settle(&mut self, entry: &EntryId, points: Points) -> bool {
        if points == 0 {
            return false;
        }
        let pending = self.pending_for(entry);
        if pending < points {
            tracing::warn!(
                entry = %entry,
                pending,
                settled = points,
                "settling more votes than are pending"
            );
        }
        let slot = self.committed.entry(entry.clone()).or_insert(0);
        *slot = slot.saturating_add(points);
        self.stored.insert(entry.clone());
        self.decrement_pending(entry, points);
        true
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            limits: self.limits,
            committed: self.committed.clone(),
            pending: self.pending.clone(),
            remaining: self.remaining_budget(),
        }
    }

    fn decrement_pending(&mut self, entry: &EntryId, by: Points) {
        if let Some(count) = self.pending.get_mut(entry) {
            *count = count.saturating_sub(by);
            if *count == 0 {
                self.pending.remove(entry);
            }
        }
    }
}

impl Default for VoteLedger {
    fn default() -> Self {
        Self::new(VoteLimits::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntryId {
        EntryId::new(s)
    }

    fn ledger(per_user: u32, per_entry: u32) -> VoteLedger {
        VoteLedger::new(VoteLimits::new(per_user, per_entry).unwrap())
    }

    #[test]
    fn fresh_ledger_has_full_budget() {
        let l = ledger(10, 3);
        assert_eq!(l.remaining_budget(), 10);
        assert_eq!(l.votes_for(&id("A")), 0);
        assert!(l.can_add(&id("A")));
        assert!(!l.can_remove(&id("A")));
    }

    #[test]
    fn fourth_add_to_one_entry_is_refused() {
        let mut l = ledger(10, 3);
        assert!(l.add(&id("A")));
        assert!(l.add(&id("A")));
        assert!(l.add(&id("A")));
        assert!(!l.add(&id("A")));
        assert_eq!(l.votes_for(&id("A")), 3);
        assert_eq!(l.remaining_budget(), 7);
    }

    #[test]
    fn add_then_remove_restores_pending() {
        let mut l = ledger(10, 3);
        l.add(&id("A"));
        let before = l.pending_for(&id("A"));
        assert!(l.add(&id("A")));
        assert!(l.remove(&id("A")));
        assert_eq!(l.pending_for(&id("A")), before);
    }

    #[test]
    fn remove_to_zero_drops_key() {
        let mut l = ledger(10, 3);
        l.add(&id("A"));
        assert!(l.remove(&id("A")));
        assert!(!l.has_pending());
        assert!(l.snapshot().pending.is_empty());
        assert!(!l.remove(&id("A")));
    }

    #[test]
    fn committed_votes_cannot_be_removed() {
        let mut l = ledger(10, 3);
        l.seed(vec![VoteRecord::new("A", 2)]);
        assert!(!l.can_remove(&id("A")));
        assert!(!l.remove(&id("A")));
        assert_eq!(l.committed_for(&id("A")), 2);
    }

    #[test]
    fn seeded_budget_leaves_exactly_the_remainder() {
        let mut l = ledger(10, 5);
        let report = l.seed(vec![VoteRecord::new("A", 4), VoteRecord::new("B", 3)]);
        assert!(report.violations.is_empty());
        assert_eq!(l.remaining_budget(), 3);

        assert!(l.add(&id("C")));
        assert!(l.add(&id("D")));
        assert!(l.add(&id("B")));
        assert!(!l.add(&id("E")));
        assert_eq!(l.remaining_budget(), 0);
    }

    #[test]
    fn exhausted_budget_blocks_every_entry() {
        let mut l = ledger(4, 2);
        for e in ["A", "A", "B", "B"] {
            assert!(l.add(&id(e)));
        }
        assert_eq!(l.remaining_budget(), 0);
        for e in ["A", "B", "C", "anything"] {
            assert!(!l.can_add(&id(e)));
        }
    }

    #[test]
    fn reset_clears_everything() {
        let mut l = ledger(10, 3);
        l.seed(vec![VoteRecord::new("A", 2)]);
        l.add(&id("B"));
        l.reset();
        assert_eq!(l.votes_for(&id("A")), 0);
        assert_eq!(l.votes_for(&id("B")), 0);
        assert_eq!(l.remaining_budget(), 10);
    }

    #[test]
    fn seed_sums_duplicates_and_skips_zero_rows() {
        let mut l = ledger(10, 3);
        let report = l.seed(vec![
            VoteRecord::new("A", 1),
            VoteRecord::new("A", 1),
            VoteRecord::new("B", 0),
        ]);
        assert_eq!(report.entries, 1);
        assert_eq!(report.points, 2);
        assert_eq!(l.committed_for(&id("A")), 2);
        assert!(!l.snapshot().committed.contains_key(&id("B")));
    }

    #[test]
    fn seed_reports_over_limit_data_and_clamps_display() {
        let mut l = ledger(5, 3);
        let report = l.seed(vec![VoteRecord::new("A", 4), VoteRecord::new("B", 3)]);
        assert_eq!(
            report.violations,
            vec![
                IntegrityViolation::EntryOverCap {
                    entry_id: id("A"),
                    points: 4
                },
                IntegrityViolation::BudgetExceeded { total: 7 },
            ]
        );
        assert_eq!(l.remaining_budget(), -2);
        assert_eq!(l.display_remaining(), 0);
        assert!(!l.can_add(&id("C")));
    }

    #[test]
    fn pending_batch_carries_committed_counts() {
        let mut l = ledger(10, 3);
        l.seed(vec![VoteRecord::new("A", 2)]);
        l.add(&id("A"));
        l.add(&id("B"));
        l.add(&id("B"));

        let batch = l.pending_batch();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].entry_id, id("A"));
        assert!(batch[0].has_record());
        assert_eq!(batch[0].new_total(), 3);
        assert_eq!(batch[1].entry_id, id("B"));
        assert!(!batch[1].has_record());
        assert_eq!(batch[1].points, 2);
    }

    #[test]
    fn zero_point_row_is_updated_not_reinserted() {
        let mut l = ledger(10, 3);
        let report = l.seed(vec![VoteRecord::new("A", 0)]);
        assert_eq!(report.entries, 0);
        assert_eq!(l.committed_for(&id("A")), 0);
        assert_eq!(l.remaining_budget(), 10);

        l.add(&id("A"));
        l.add(&id("B"));
        let batch = l.pending_batch();
        assert!(batch[0].has_record());
        assert_eq!(batch[0].new_total(), 1);
        assert!(!batch[1].has_record());
    }

    #[test]
    fn settled_entry_is_updated_next_time() {
        let mut l = ledger(10, 3);
        l.add(&id("A"));
        l.settle(&id("A"), 1);
        l.add(&id("A"));
        let batch = l.pending_batch();
        assert!(batch[0].has_record());
        assert_eq!(batch[0].new_total(), 2);
    }

    #[test]
    fn settle_moves_votes_without_changing_totals() {
        let mut l = ledger(10, 3);
        l.add(&id("B"));
        l.add(&id("B"));
        let remaining = l.remaining_budget();

        assert!(l.settle(&id("B"), 2));
        assert_eq!(l.committed_for(&id("B")), 2);
        assert_eq!(l.pending_for(&id("B")), 0);
        assert!(!l.has_pending());
        assert_eq!(l.remaining_budget(), remaining);
    }

    #[test]
    fn settle_keeps_votes_added_after_the_batch() {
        let mut l = ledger(10, 3);
        l.add(&id("A"));
        let batch = l.pending_batch();
        l.add(&id("A"));

        l.settle(&batch[0].entry_id, batch[0].points);
        assert_eq!(l.committed_for(&id("A")), 1);
        assert_eq!(l.pending_for(&id("A")), 1);
    }

    #[test]
    fn settle_zero_is_a_no_op() {
        let mut l = ledger(10, 3);
        assert!(!l.settle(&id("A"), 0));
        assert_eq!(l.votes_for(&id("A")), 0);
    }
}
