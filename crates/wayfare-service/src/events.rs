//! In-process event bus and the emit helper used by the services.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use wayfare_core::clock::Clock;
use wayfare_core::events::{DomainEvent, EventPayload};
use wayfare_core::traits::EventPublisher;
use wayfare_core::types::id::UserId;

/// Fan-out of domain events to in-process subscribers over a tokio
/// broadcast channel. Slow subscribers lag and skip; publishers never block.
#[derive(Debug, Clone)]
pub struct MemoryEventBus {
    sender: broadcast::Sender<DomainEvent>,
}

impl MemoryEventBus {
    /// Creates a bus that buffers up to `buffer_size` events per subscriber.
    pub fn new(buffer_size: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer_size.max(1));
        Self { sender }
    }

    /// Subscribe to every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

#[async_trait]
impl EventPublisher for MemoryEventBus {
    async fn publish(&self, event: DomainEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!(event = name, receivers, "Event published"),
            Err(_) => debug!(event = name, "Event dropped, no subscribers"),
        }
    }
}

/// Stamps and publishes events on behalf of a service.
#[derive(Debug, Clone)]
pub(crate) struct EventSink {
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl EventSink {
    pub(crate) fn new(publisher: Arc<dyn EventPublisher>, clock: Arc<dyn Clock>) -> Self {
        Self { publisher, clock }
    }

    pub(crate) async fn emit(&self, actor_id: Option<UserId>, payload: impl Into<EventPayload>) {
        let event = DomainEvent::new(self.clock.now(), actor_id, payload.into());
        info!(event = event.name(), event_id = %event.id, "Domain event");
        self.publisher.publish(event).await;
    }
}
