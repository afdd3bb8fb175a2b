//! In-process fan-out for [`ChangeEvent`]s.
//!
//! Backends publish after each committed write; the HTTP layer turns each
//! receiver into a push stream. Slow receivers lag and lose events, which the
//! client's periodic re-snapshot corrects.

use tokio::sync::broadcast;
use tracing::trace;

use crate::change::ChangeEvent;

const DEFAULT_CAPACITY: usize = 1024;

/// Cheap to clone; all clones share one channel.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
  sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
  pub fn new() -> Self { Self::with_capacity(DEFAULT_CAPACITY) }

  pub fn with_capacity(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity);
    Self { sender }
  }

  /// Send `event` to every current subscriber. Having none is not an error.
  pub fn publish(&self, event: ChangeEvent) {
    trace!(table = %event.table, event = %event.event, "publishing change");
    let _ = self.sender.send(event);
  }

  pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
    self.sender.subscribe()
  }

  pub fn subscriber_count(&self) -> usize { self.sender.receiver_count() }
}

impl Default for ChangeFeed {
  fn default() -> Self { Self::new() }
}
