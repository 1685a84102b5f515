//! Observable share status.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::watch;

/// Whether any share is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareStatus {
    #[default]
    Idle,
    Sharing,
}

/// Tracks in-flight shares and publishes the aggregate status.
#[derive(Debug, Clone)]
pub struct StatusTracker {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    tx: watch::Sender<ShareStatus>,
    in_flight: AtomicUsize,
}

impl StatusTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ShareStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                tx,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn current(&self) -> ShareStatus {
        *self.inner.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ShareStatus> {
        self.inner.tx.subscribe()
    }

    /// Marks a share as started. Dropping the guard marks it finished; the
    /// status returns to `Idle` once the last guard is gone.
    pub fn begin(&self) -> StatusGuard {
        if self.inner.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.inner.tx.send_replace(ShareStatus::Sharing);
        }
        StatusGuard {
            inner: self.inner.clone(),
        }
    }
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the status at `Sharing` while alive.
#[derive(Debug)]
#[must_use = "the status returns to Idle as soon as the guard is dropped"]
pub struct StatusGuard {
    inner: Arc<Inner>,
}

impl Drop for StatusGuard {
    fn drop(&mut self) {
        if self.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.inner.tx.send_replace(ShareStatus::Idle);
        }
    }
}
