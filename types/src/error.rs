use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("{field} must be at least 1")]
    ZeroLimit { field: &'static str },

    #[error("per-entry cap {per_entry} exceeds per-user budget {per_user}")]
    EntryCapAboveBudget { per_entry: u32, per_user: u32 },
}
