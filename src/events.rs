//! Core notification bus.
//!
//! Components publish [`CoreEvent`]s onto an [`EventBus`] and the
//! presentation layer consumes them from a broadcast receiver on its own
//! (interactive) context. Delivery is FIFO per source;
//! a slow subscriber can lag and lose old events, but publishers never block.

use crate::error::CaptureError;
use std::path::PathBuf;
use tokio::sync::broadcast;

/// Default channel capacity. Events are tiny and consumed promptly by the
/// interactive context, so a small buffer is plenty.
const DEFAULT_CAPACITY: usize = 32;

/// Notifications emitted by the capture core.
#[derive(Debug, Clone)]
pub enum CoreEvent {
    /// The next capture path was recomputed (subject changed or a capture
    /// consumed the previous path).
    PathChanged(PathBuf),
    /// A capture job finished successfully; carries the realized path.
    JobCompleted(PathBuf),
    /// A capture job ended in failure; carries the classification.
    JobFailed(CaptureError),
}

/// Cheap-to-clone handle to the core's broadcast channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<CoreEvent> {
        self.tx.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error; the core
    /// must keep working when nothing is listening.
    pub fn publish(&self, event: CoreEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
