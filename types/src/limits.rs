//! Ballot limits: the per-user budget and the per-entry cap.

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// Bounds on how many votes a single user may allocate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteLimits {
    /// Total votes a user may spread across all entries.
    #[serde(default = "default_max_votes_per_user")]
    pub max_votes_per_user: u32,

    /// Most votes a single entry may receive from one user.
    #[serde(default = "default_max_votes_per_entry")]
    pub max_votes_per_entry: u32,
}

fn default_max_votes_per_user() -> u32 {
    10
}

fn default_max_votes_per_entry() -> u32 {
    3
}

impl VoteLimits {
    /// Build validated limits.
    pub fn new(max_votes_per_user: u32, max_votes_per_entry: u32) -> Result<Self, TypesError> {
        let limits = Self {
            max_votes_per_user,
            max_votes_per_entry,
        };
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<(), TypesError> {
        if self.max_votes_per_user == 0 {
            return Err(TypesError::ZeroLimit {
                field: "max_votes_per_user",
            });
        }
        if self.max_votes_per_entry == 0 {
            return Err(TypesError::ZeroLimit {
                field: "max_votes_per_entry",
            });
        }
        if self.max_votes_per_entry > self.max_votes_per_user {
            return Err(TypesError::EntryCapAboveBudget {
                per_entry: self.max_votes_per_entry,
                per_user: self.max_votes_per_user,
            });
        }
        Ok(())
    }
}

impl Default for VoteLimits {
    fn default() -> Self {
        Self {
            max_votes_per_user: default_max_votes_per_user(),
            max_votes_per_entry: default_max_votes_per_entry(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_ten_and_three() {
        let limits = VoteLimits::default();
        assert_eq!(limits.max_votes_per_user, 10);
        assert_eq!(limits.max_votes_per_entry, 3);
        assert!(limits.validate().is_ok());
    }

    #[test]
    fn zero_budget_rejected() {
        assert_eq!(
            VoteLimits::new(0, 0),
            Err(TypesError::ZeroLimit {
                field: "max_votes_per_user"
            })
        );
    }

    #[test]
    fn entry_cap_above_budget_rejected() {
        assert!(matches!(
            VoteLimits::new(2, 5),
            Err(TypesError::EntryCapAboveBudget { .. })
        ));
    }
}
