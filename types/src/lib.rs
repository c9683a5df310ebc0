//! Fundamental types for the SONGJAM voting client.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! user and entry identifiers, catalog entries, persisted vote records, and the
//! vote limits that bound a user's ballot.

pub mod entry;
pub mod error;
pub mod ids;
pub mod limits;
pub mod record;

pub use entry::Entry;
pub use error::TypesError;
pub use ids::{EntryId, UserId};
pub use limits::VoteLimits;
pub use record::VoteRecord;

/// A count of votes. Votes are whole points; there are no fractional ballots.
pub type Points = u32;
