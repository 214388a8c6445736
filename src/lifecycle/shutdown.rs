//! Stop flag shared by the signal handler and the listeners.
//!
//! The flag is level-triggered: a listener that starts waiting after the
//! flag went up stops immediately instead of missing the edge.

use std::sync::Arc;

use tokio::sync::watch;

/// Raising side. Clones share one flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    raised: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (raised, _) = watch::channel(false);
        Self {
            raised: Arc::new(raised),
        }
    }

    /// A waiter for one listener.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.raised.subscribe(),
        }
    }

    /// Raise the flag. Raising twice is a no-op.
    pub fn trigger(&self) {
        self.raised.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.raised.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Waiting side of [`Shutdown`].
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolves once the flag is up, or once every [`Shutdown`] is dropped.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|raised| *raised).await;
    }
}
