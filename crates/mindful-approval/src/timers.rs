//! In-process expiry timers.
//!
//! A timer is a sleeping tokio task that posts [`ExpiryFired`] when its
//! window closes. Timers die with the process; the durable schedule covers
//! whatever they miss.

use mindful_core::{TargetId, Timestamp};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

/// An expiry notification for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryFired {
    /// Target whose window closed.
    pub target: TargetId,
    /// Fire time of the window that closed. A later re-grant makes this stale.
    pub fire_at: Timestamp,
}

/// Per-target fast-path timers. Arming a target replaces its previous timer.
#[derive(Debug)]
pub struct ExpiryTimers {
    tx: mpsc::UnboundedSender<ExpiryFired>,
    handles: HashMap<TargetId, AbortHandle>,
}

impl ExpiryTimers {
    /// Timers posting into `tx`.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<ExpiryFired>) -> Self {
        Self {
            tx,
            handles: HashMap::new(),
        }
    }

    /// Timers plus the receiver their notifications arrive on.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ExpiryFired>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    /// Fire for `target` after `delay`. Must be called inside a tokio runtime.
    pub fn arm(&mut self, target: TargetId, fire_at: Timestamp, delay: Duration) {
        self.cancel(target);

        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(ExpiryFired { target, fire_at }).is_err() {
                tracing::debug!(target_id = %target, "Expiry receiver gone, dropping timer");
            }
        });
        self.handles.insert(target, handle.abort_handle());
    }

    /// Stop `target`'s timer. Returns whether one was armed.
    pub fn cancel(&mut self, target: TargetId) -> bool {
        match self.handles.remove(&target) {
            Some(handle) => {
                handle.abort();
                true
            },
            None => false,
        }
    }

    /// Number of armed timers, including ones that already fired but were
    /// not yet cancelled.
    #[must_use]
    pub fn armed(&self) -> usize {
        self.handles.len()
    }

    /// Stop every timer.
    pub fn cancel_all(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}

impl Drop for ExpiryTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
