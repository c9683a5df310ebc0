//! Opaque identifiers for users and entries.
//!
//! Both are handed to us by external collaborators (the auth provider and the
//! catalog table), so they are kept as strings and never interpreted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::TypesError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier without validation.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Wrap a raw identifier, rejecting empty or whitespace-only input.
            pub fn parse(raw: &str) -> Result<Self, TypesError> {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(TypesError::EmptyId);
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self::new(s)
            }
        }
    };
}

string_id!(
    /// The authenticated user's identifier as issued by the auth provider.
    UserId
);

string_id!(
    /// Stable identifier of a votable entry (song/artist).
    EntryId
);
