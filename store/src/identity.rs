//! Identity lookup trait.

use std::future::Future;

use crate::StoreError;
use songjam_types::UserId;

/// Resolves the currently authenticated user.
pub trait IdentityProvider {
    /// The signed-in user, or `None` when the session is anonymous or expired.
    fn current_user(&self) -> impl Future<Output = Result<Option<UserId>, StoreError>> + Send;
}
