use std::sync::Arc;

use tokio::sync::watch;

use caption_core::ids::UserId;

/// Opaque identity state delivered by the external provider.
///
/// Holds the current user and publishes changes so the trigger surface
/// can gate event-driven syncs on a known identity. No verification
/// happens here; the id is whatever the provider handed the client.
#[derive(Clone)]
pub struct AuthHandle {
    tx: Arc<watch::Sender<Option<UserId>>>,
}

impl AuthHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn sign_in(&self, user: UserId) {
        self.tx.send_replace(Some(user));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    pub fn current(&self) -> Option<UserId> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<UserId>> {
        self.tx.subscribe()
    }
}

impl Default for AuthHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_signed_out() {
        let auth = AuthHandle::new();
        assert!(auth.current().is_none());
    }

    #[test]
    fn sign_in_and_out() {
        let auth = AuthHandle::new();
        auth.sign_in(UserId::from_raw("u1"));
        assert_eq!(auth.current().map(|u| u.as_str().to_owned()), Some("u1".into()));

        auth.sign_out();
        assert!(auth.current().is_none());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let auth = AuthHandle::new();
        let mut rx = auth.subscribe();

        auth.sign_in(UserId::from_raw("u1"));
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_some());
    }

    #[test]
    fn clones_share_state() {
        let auth = AuthHandle::new();
        let other = auth.clone();
        auth.sign_in(UserId::from_raw("u1"));
        assert!(other.current().is_some());
    }
}
