//! Nullable infrastructure for deterministic testing.
//!
//! All external collaborators of the voting core (the remote vote table, the
//! entry catalog, the auth provider) are abstracted behind traits. This crate
//! provides test-friendly implementations that:
//! - Keep their state in memory
//! - Can be scripted to fail or stall programmatically
//! - Record every call for assertions
//! - Never touch the network
//!
//! Usage: swap the REST store for these in tests.

pub mod identity;
pub mod store;

pub use identity::NullIdentity;
pub use store::{NullVoteStore, StoreCall, StoreOp};
