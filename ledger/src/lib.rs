//! Vote ledger for the SONGJAM voting client.
//!
//! Tracks, per entry, the votes already persisted to the remote store
//! (*committed*) and the votes the user has allocated locally but not yet
//! submitted (*pending*). Every mutation is checked against the ballot limits
//! before it is applied, so no sequence of public calls can leave the ledger
//! over budget.
//!
//! The ledger performs no I/O. Moving pending votes into the store is the
//! submission coordinator's job.

pub mod ledger;
pub mod snapshot;

pub use ledger::{IntegrityViolation, SeedReport, VoteLedger};
pub use snapshot::{LedgerSnapshot, PendingVote};
