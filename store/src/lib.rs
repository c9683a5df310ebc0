//! Abstract remote store traits for the SONGJAM voting client.
//!
//! Every backend (the hosted REST table store, in-memory for testing)
//! implements these traits. The voting core depends only on the traits.
//!
//! The traits are async; implementations may simply write `async fn` for
//! each method as long as the returned futures are `Send`.

pub mod catalog;
pub mod error;
pub mod identity;
pub mod vote;

pub use catalog::CatalogStore;
pub use error::StoreError;
pub use identity::IdentityProvider;
pub use vote::VoteStore;
