//! Awake-flush coordination.
//!
//! A device that wakes briefly to drain queued messages must receive
//! exactly one completion signal once the generic connection's in-flight
//! counter returns to zero, so the gateway can emit the protocol's
//! completion response and let the device sleep again. The counter and its
//! zero-crossing detection belong to the handler chain; this module owns
//! only the one-shot callback keyed to that event.

use crate::core::exec::ConnectionExecutor;
use parking_lot::Mutex;

/// Callback fired on the owning connection's execution context once the
/// in-flight counter reaches zero.
pub type FlushCallback = Box<dyn FnOnce() + Send + 'static>;

/// Per-connection one-shot flush signal.
pub struct AwakeFlushCoordinator {
    pending: Mutex<Option<FlushCallback>>,
    exec: ConnectionExecutor,
}

impl AwakeFlushCoordinator {
    pub fn new(exec: ConnectionExecutor) -> Self {
        Self {
            pending: Mutex::new(None),
            exec,
        }
    }

    /// Register the pending callback, replacing (without invoking) any
    /// earlier never-fired one.
    pub fn set_flush_callback<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        *self.pending.lock() = Some(Box::new(callback));
    }

    /// Notification that the in-flight counter transitioned to zero. May
    /// arrive from any thread; the callback is taken under the lock, so at
    /// most one racing notification wins it, and fired on the connection's
    /// own sequential context. Returns whether a callback was dispatched.
    pub fn on_inflight_drained(&self) -> bool {
        let callback = self.pending.lock().take();
        match callback {
            Some(callback) => {
                if !self.exec.execute(callback) {
                    tracing::debug!("flush callback dropped; connection executor closed");
                }
                true
            }
            None => false,
        }
    }

    /// Clear a pending callback without invoking it; teardown path.
    /// Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        self.pending.lock().take().is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    fn coordinator() -> AwakeFlushCoordinator {
        AwakeFlushCoordinator::new(ConnectionExecutor::spawn())
    }

    #[tokio::test]
    async fn test_fires_exactly_once() {
        let flush = coordinator();
        let fired = Arc::new(AtomicU32::new(0));
        let (tx, rx) = oneshot::channel();

        let counter = fired.clone();
        flush.set_flush_callback(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(());
        });
        assert!(flush.has_pending());

        // The chain drives its counter 3 -> 2 -> 1 -> 0; only the zero
        // crossing notifies.
        assert!(flush.on_inflight_drained());
        rx.await.unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!flush.has_pending());

        // A later independent zero crossing finds nothing to fire.
        assert!(!flush.on_inflight_drained());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_replacement_never_invokes_the_old_callback() {
        let flush = coordinator();
        let (old_tx, old_rx) = oneshot::channel::<()>();
        let (new_tx, new_rx) = oneshot::channel::<()>();

        flush.set_flush_callback(move || {
            let _ = old_tx.send(());
        });
        flush.set_flush_callback(move || {
            let _ = new_tx.send(());
        });

        assert!(flush.on_inflight_drained());
        new_rx.await.unwrap();
        // Replacing dropped the first callback without running it.
        assert!(old_rx.await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_leaves_nothing_to_fire() {
        let flush = coordinator();
        let (tx, rx) = oneshot::channel::<()>();

        flush.set_flush_callback(move || {
            let _ = tx.send(());
        });
        assert!(flush.cancel());
        assert!(!flush.cancel());
        assert!(!flush.on_inflight_drained());
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_fires_on_the_connection_executor() {
        let exec = ConnectionExecutor::spawn();
        let flush = AwakeFlushCoordinator::new(exec.clone());
        let order = Arc::new(parking_lot::Mutex::new(Vec::new()));

        // A job already queued on the connection context must run before a
        // flush signalled afterwards.
        let first = order.clone();
        exec.execute(move || first.lock().push("queued"));

        let (tx, rx) = oneshot::channel();
        let second = order.clone();
        flush.set_flush_callback(move || {
            second.lock().push("flush");
            let _ = tx.send(());
        });
        flush.on_inflight_drained();
        rx.await.unwrap();

        assert_eq!(*order.lock(), vec!["queued", "flush"]);
    }
}
