//! Voting client core for SONGJAM.
//!
//! Provides everything a front end needs to run a ballot:
//! - [`VotingSession`] — the per-user context object wrapping the vote ledger
//! - [`SubmissionCoordinator`] — moves pending votes into the remote store
//! - [`CatalogLoader`] — fetches and orders the competing entries
//! - [`RestStore`] — the hosted table store and its auth endpoints
//! - [`ClientConfig`] — TOML configuration
//! - [`AwardShow`] — the screen shown once voting has closed

pub mod award_show;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod rest;
pub mod session;

pub use award_show::{AwardShow, ShowStatus};
pub use catalog::{Catalog, CatalogLoader};
pub use config::{ClientConfig, StoreConfig, VotingConfig};
pub use coordinator::{SubmissionCoordinator, SubmitFailure, SubmitPhase, SubmitReport};
pub use error::SessionError;
pub use rest::RestStore;
pub use session::VotingSession;
