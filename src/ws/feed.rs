use crate::entities::{ChangeOp, Message};
use crate::ws::FEED_CHANNEL_CAPACITY;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, Receiver, Sender};
use tracing::{debug, instrument};

/// One change of the messages table
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub op: ChangeOp,
    pub row: Message,
}

/// Unfiltered stream of message table changes.
///
/// There is no per-conversation channel: every subscriber sees every change
/// and filters on its side. Cloning shares the same underlying channel.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: Sender<Arc<ChangeEvent>>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        // Arc<ChangeEvent> to share the event, not copy it for every receiver
        let (tx, _) = broadcast::channel::<Arc<ChangeEvent>>(FEED_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> Receiver<Arc<ChangeEvent>> {
        debug!(subscribers = self.tx.receiver_count() + 1, "New feed subscription");
        self.tx.subscribe()
    }

    /// Returns the number of subscribers reached. Zero subscribers is not an
    /// error: the row is already durable.
    #[instrument(skip(self, row), fields(message_id = row.id))]
    pub fn publish(&self, op: ChangeOp, row: Message) -> usize {
        match self.tx.send(Arc::new(ChangeEvent { op, row })) {
            Ok(n) => {
                debug!(receivers = n, "Change broadcast to subscribers");
                n
            }
            Err(_) => {
                debug!("No active subscribers");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
