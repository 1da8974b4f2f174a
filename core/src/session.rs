use std::sync::Arc;

use tokio::sync::watch;
use uuid::Uuid;

/// Current authenticated identity. Holds one value and replays it to late
/// subscribers; sign-in/out pushes a change event to every receiver.
#[derive(Debug, Clone)]
pub struct Session {
    tx: Arc<watch::Sender<Option<Uuid>>>,
}

impl Session {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn signed_in(user_id: Uuid) -> Self {
        let session = Self::new();
        session.sign_in(user_id);
        session
    }

    pub fn sign_in(&self, user_id: Uuid) {
        self.tx.send_replace(Some(user_id));
    }

    pub fn sign_out(&self) {
        self.tx.send_replace(None);
    }

    pub fn current_user(&self) -> Option<Uuid> {
        *self.tx.borrow()
    }

    /// Identity for mutating operations; errors when signed out.
    pub fn require_user(&self) -> anyhow::Result<Uuid> {
        self.current_user()
            .ok_or_else(|| anyhow::anyhow!("not signed in"))
    }

    /// Change stream; starts at the current value.
    pub fn changes(&self) -> watch::Receiver<Option<Uuid>> {
        self.tx.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn late_subscriber_sees_current_identity() {
        let session = Session::new();
        let user = Uuid::new_v4();
        session.sign_in(user);

        let rx = session.changes();
        assert_eq!(*rx.borrow(), Some(user));

        session.sign_out();
        assert_eq!(session.current_user(), None);
    }
}
