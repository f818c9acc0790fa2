//! Shutdown coordination.

use tokio::sync::broadcast;

/// Broadcasts a single shutdown event to every long-running task.
///
/// The HTTP server and the rate-limit sweeper each hold a receiver.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal every subscriber. Safe to call when none are left.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Tasks still listening for shutdown.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `rx` observes shutdown or its sender is gone.
pub async fn wait(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
