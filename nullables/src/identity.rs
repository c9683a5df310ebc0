//! Nullable identity — an auth provider you log in and out by hand.

use songjam_store::{IdentityProvider, StoreError};
use songjam_types::UserId;
use tokio::sync::watch;

/// A test identity source that publishes changes on a watch channel, the way
/// the real auth callback would.
pub struct NullIdentity {
    tx: watch::Sender<Option<UserId>>,
}

impl NullIdentity {
    pub fn new(initial: Option<UserId>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn signed_in(user: impl Into<UserId>) -> Self {
        Self::new(Some(user.into()))
    }

    /// A receiver that sees every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }

    pub fn login(&self, user: impl Into<UserId>) {
        self.tx.send_replace(Some(user.into()));
    }

    pub fn logout(&self) {
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }
}

impl Default for NullIdentity {
    fn default() -> Self {
        Self::new(None)
    }
}

impl IdentityProvider for NullIdentity {
    async fn current_user(&self) -> Result<Option<UserId>, StoreError> {
        Ok(self.current())
    }
}
