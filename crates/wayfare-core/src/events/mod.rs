//! Domain events emitted by booking engine operations.
//!
//! Events are handed to an [`EventPublisher`](crate::traits::EventPublisher)
//! after the corresponding state change is persisted, and consumed by the
//! notification, messaging, and audit collaborators.

pub mod booking;
pub mod dispute;
pub mod payment;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::id::UserId;

pub use booking::BookingEvent;
pub use dispute::DisputeEvent;
pub use payment::PaymentEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The user who caused the event; `None` for system-driven changes.
    pub actor_id: Option<UserId>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A booking lifecycle event.
    Booking(BookingEvent),
    /// A payment reconciliation event.
    Payment(PaymentEvent),
    /// A dispute resolution event.
    Dispute(DisputeEvent),
}

impl EventPayload {
    /// Dotted event name, e.g. `booking.confirmed`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Booking(e) => e.name(),
            Self::Payment(e) => e.name(),
            Self::Dispute(e) => e.name(),
        }
    }
}

impl DomainEvent {
    /// Create a new domain event stamped at `timestamp`.
    pub fn new(timestamp: DateTime<Utc>, actor_id: Option<UserId>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::now_v7(),
            timestamp,
            actor_id,
            payload,
        }
    }

    /// Dotted event name, e.g. `booking.confirmed`.
    pub fn name(&self) -> &'static str {
        self.payload.name()
    }
}

impl From<BookingEvent> for EventPayload {
    fn from(event: BookingEvent) -> Self {
        Self::Booking(event)
    }
}

impl From<PaymentEvent> for EventPayload {
    fn from(event: PaymentEvent) -> Self {
        Self::Payment(event)
    }
}

impl From<DisputeEvent> for EventPayload {
    fn from(event: DisputeEvent) -> Self {
        Self::Dispute(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::id::BookingId;

    #[test]
    fn test_event_name_and_wire_shape() {
        let booking_id = BookingId::new();
        let event = DomainEvent::new(
            Utc::now(),
            None,
            BookingEvent::Confirmed { booking_id }.into(),
        );
        assert_eq!(event.name(), "booking.confirmed");

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["payload"]["domain"], "Booking");
        assert_eq!(json["payload"]["event"]["type"], "Confirmed");
    }
}
