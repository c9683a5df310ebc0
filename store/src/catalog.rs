//! Entry catalog storage trait.

use std::future::Future;

use crate::StoreError;
use songjam_types::Entry;

/// Read-only access to the list of competing entries.
pub trait CatalogStore {
    fn fetch_entries(&self) -> impl Future<Output = Result<Vec<Entry>, StoreError>> + Send;
}
