use tokio::sync::broadcast;
use tracing::debug;

use super::types::DomainEvent;
use crate::config::EventsConfig;
use crate::constants::system;

/// In-process publisher for domain events
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<DomainEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publisher sized from `events.buffer_size`
    pub fn from_config(config: &EventsConfig) -> Self {
        Self::new(config.buffer_size)
    }

    /// Publish an event to every current subscriber
    pub fn publish(&self, event: DomainEvent) {
        let name = event.name.clone();
        // No subscribers is acceptable - events are published even if no one is listening
        match self.sender.send(event) {
            Ok(receivers) => debug!(event_name = %name, receivers = receivers, "Event published"),
            Err(broadcast::error::SendError(_)) => {
                debug!(event_name = %name, "Event published with no subscribers")
            }
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(system::DEFAULT_EVENT_BUFFER_SIZE)
    }
}
