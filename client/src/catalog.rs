//! The competing entries and the order they are shown in.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::Arc;

use songjam_store::{CatalogStore, StoreError};
use songjam_types::{Entry, EntryId};
use songjam_utils::RetryPolicy;

use crate::SessionError;

/// Every entry on the ballot, in store order, one per id.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<Entry>,
}

impl Catalog {
    /// Build from raw store rows. Later rows repeating an id are dropped.
    pub fn new(rows: Vec<Entry>) -> Self {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(rows.len());
        for entry in rows {
            if seen.insert(entry.id.clone()) {
                entries.push(entry);
            } else {
                tracing::warn!(entry = %entry.id, "duplicate catalog entry ignored");
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn get(&self, id: &EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn contains(&self, id: &EntryId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A reproducible shuffle, so one viewer sees a stable order across
    /// redraws while different viewers see different orders.
    pub fn display_order(&self, seed: u64) -> Vec<&Entry> {
        let mut order: Vec<&Entry> = self.entries.iter().collect();
        order.shuffle(&mut StdRng::seed_from_u64(seed));
        order
    }

    /// A fresh random order.
    pub fn shuffled(&self) -> Vec<&Entry> {
        let mut order: Vec<&Entry> = self.entries.iter().collect();
        order.shuffle(&mut rand::thread_rng());
        order
    }
}

/// Fetches the catalog from a [`CatalogStore`].
pub struct CatalogLoader<S> {
    store: Arc<S>,
    retry: RetryPolicy,
}

impl<S: CatalogStore> CatalogLoader<S> {
    pub fn new(store: Arc<S>, retry: RetryPolicy) -> Self {
        Self { store, retry }
    }

    pub async fn load(&self) -> Result<Catalog, SessionError> {
        let store = &*self.store;
        let rows = self
            .retry
            .run_if(|| store.fetch_entries(), StoreError::is_transient)
            .await?;
        let catalog = Catalog::new(rows);
        tracing::info!(entries = catalog.len(), "catalog loaded");
        Ok(catalog)
    }
}
