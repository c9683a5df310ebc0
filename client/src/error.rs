use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no user is signed in")]
    NotAuthenticated,

    #[error("stored votes for the signed-in user have not been loaded")]
    NotSeeded,

    #[error("a vote submission is already in flight")]
    SubmissionInProgress,

    #[error("the signed-in user changed while the operation was in flight")]
    IdentityChanged,

    #[error("store error: {0}")]
    Store(#[from] songjam_store::StoreError),

    #[error("invalid vote limits: {0}")]
    Limits(#[from] songjam_types::TypesError),

    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(String),
}
