//! Cooperative shutdown signal for session loops

use tokio::sync::watch;

/// Create a linked trigger / signal pair
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Sending side, held by whoever owns the process lifetime
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Ask every linked [`Shutdown`] to stop
    pub fn trigger(&self) {
        // Fails only when every receiver is gone, which means nobody is running.
        let _ = self.tx.send(true);
    }

    /// Another signal linked to this trigger
    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving side, polled by session loops
///
/// Dropping the trigger counts as a shutdown request.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Whether shutdown was already requested
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested
    ///
    /// Cancellation safe, so it can sit in a `select!` arm.
    pub async fn requested(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}
