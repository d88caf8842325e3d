//! Shutdown coordination.
//!
//! Servers take the future from [`Shutdown::signalled`] and hand it to
//! `axum::serve(..).with_graceful_shutdown`. Triggering stops every server
//! from accepting and lets in-flight requests drain.

use std::future::Future;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Resolves once [`trigger`](Self::trigger) is called or every handle is dropped.
    ///
    /// The subscription is taken now, so a trigger that happens before the
    /// future is first polled is not missed.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    pub fn trigger(&self) {
        if self.tx.send(()).is_err() {
            tracing::debug!("Shutdown triggered with no server listening");
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
