//! Change notification for connected clients.
//!
//! Mutations to the message store publish typed events through an
//! [`EventBroker`]; long-lived client connections subscribe and receive
//! every event published after they joined. The broker is an explicit
//! component injected where needed, not a process-wide singleton.

use serde::Serialize;
use tokio::sync::broadcast;

/// Default bound on buffered events per subscriber.
const DEFAULT_CAPACITY: usize = 64;

/// A change to the message store, broadcast to subscribed clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Specific messages were deleted.
    Deleted {
        /// IDs of the deleted messages, in deletion order.
        ids: Vec<String>,
    },
    /// Every message was deleted.
    Truncated,
    /// Read state changed for specific messages.
    ReadStatus {
        /// IDs of the affected messages, in mutation order.
        ids: Vec<String>,
        /// The new read state.
        read: bool,
    },
    /// Every message was marked read.
    AllRead,
}

/// Broadcast hub fanning out [`Event`]s to subscribers.
///
/// Slow subscribers that fall more than the channel capacity behind skip
/// the oldest events rather than blocking publishers.
#[derive(Debug, Clone)]
pub struct EventBroker {
    tx: broadcast::Sender<Event>,
}

impl EventBroker {
    /// Create a broker buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Publish an event to all current subscribers.
    ///
    /// Publishing with no subscribers is a no-op.
    pub fn publish(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::trace!("no event subscribers connected");
        }
    }

    /// Number of currently connected subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBroker {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
