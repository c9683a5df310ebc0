//! Catalog entries — the songs competing for votes.

use serde::{Deserialize, Serialize};

use crate::EntryId;

/// A votable entry with its display metadata.
///
/// Only the catalog cares about the metadata; the vote ledger references
/// entries by [`EntryId`] alone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    /// Song title.
    pub title: String,
    /// Performing artist.
    pub artist: String,
    /// Playable audio or video link.
    #[serde(default)]
    pub media_url: Option<String>,
    /// Cover art.
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Entry {
    pub fn new(id: impl Into<EntryId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            media_url: None,
            image_url: None,
        }
    }

    /// "Title — Artist", or just the title when the artist is unknown.
    pub fn display_name(&self) -> String {
        if self.artist.is_empty() {
            self.title.clone()
        } else {
            format!("{} — {}", self.title, self.artist)
        }
    }
}
