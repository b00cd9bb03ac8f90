use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SignUpCompleted { name: String, email: String },
}

#[derive(Debug, Error)]
pub enum EventError {
    #[error("event bus closed")]
    Closed,
}

#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: Event) -> Result<(), EventError>;
}

/// In-process fan-out of domain events.
pub struct BroadcastEventBus {
    tx: broadcast::Sender<Event>,
}

impl BroadcastEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventBus for BroadcastEventBus {
    async fn publish(&self, event: Event) -> Result<(), EventError> {
        // No subscribers is not a failure: the event simply has no audience.
        if let Err(broadcast::error::SendError(event)) = self.tx.send(event) {
            debug!(?event, "Event published without subscribers");
        }
        Ok(())
    }
}
