//! Cooperative cancellation shared by the loader, the executor and whatever
//! outside control (terminal Ctrl-C, in-page Stop button) can request a stop.
//!
//! One token per run. Clones observe the same flag.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Clone, Debug)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Ask the run to stop at its next suspension point.
    pub fn request(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Clear the flag once a run has finished its cleanup.
    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    /// Resolves once the flag is set.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so `wait_for` cannot fail here.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Sleep for `duration`, waking early on cancellation.
    ///
    /// Returns `true` when the token is cancelled on return, so callers can
    /// re-check right after resuming.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.cancelled() => {}
        }
        self.is_cancelled()
    }
}
