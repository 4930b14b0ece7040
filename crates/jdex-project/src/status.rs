//! Server-mode signal with transition notifications.

use tokio::sync::watch;
use tracing::debug;

/// Operating mode of the companion language server.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ServerMode {
    /// Syntax-only server; structural queries are unavailable
    LightWeight,
    /// Transitioning between modes; queries should wait for the next change
    Hybrid,
    /// Full server; structural queries can be answered
    Standard,
}

impl ServerMode {
    /// Whether the server is mid-transition between modes.
    #[must_use]
    pub fn is_switching(self) -> bool {
        matches!(self, ServerMode::Hybrid)
    }

    /// Whether structural queries can be answered.
    #[must_use]
    pub fn is_standard(self) -> bool {
        matches!(self, ServerMode::Standard)
    }
}

/// Shared, observable server mode.
///
/// The host updates the mode as the server starts and switches; consumers hold
/// a [`watch::Receiver`] and can either read the current mode or suspend until
/// the next transition. A receiver obtained via [`ServerStatus::subscribe`]
/// sees every transition that happens after subscription.
#[derive(Clone)]
pub struct ServerStatus {
    tx: std::sync::Arc<watch::Sender<ServerMode>>,
}

impl ServerStatus {
    #[must_use]
    pub fn new(initial: ServerMode) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> ServerMode {
        *self.tx.borrow()
    }

    /// Record a mode transition, notifying all subscribers.
    pub fn set_mode(&self, mode: ServerMode) {
        if self.tx.send_if_modified(|current| {
            let changed = *current != mode;
            *current = mode;
            changed
        }) {
            debug!(?mode, "server mode changed");
        }
    }

    /// Subscribe to mode transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ServerMode> {
        self.tx.subscribe()
    }
}

impl Default for ServerStatus {
    fn default() -> Self {
        Self::new(ServerMode::LightWeight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_reflects_latest_set() {
        let status = ServerStatus::new(ServerMode::LightWeight);
        assert_eq!(status.mode(), ServerMode::LightWeight);
        status.set_mode(ServerMode::Standard);
        assert_eq!(status.mode(), ServerMode::Standard);
    }

    #[tokio::test]
    async fn subscriber_observes_transition() {
        let status = ServerStatus::new(ServerMode::Hybrid);
        let mut rx = status.subscribe();
        assert!(rx.borrow().is_switching());

        status.set_mode(ServerMode::Standard);
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_standard());
    }

    #[tokio::test]
    async fn setting_same_mode_does_not_notify() {
        let status = ServerStatus::new(ServerMode::Standard);
        let rx = status.subscribe();
        status.set_mode(ServerMode::Standard);
        assert!(!rx.has_changed().unwrap());
    }
}
