//! Outbound seam for domain events.

use async_trait::async_trait;

use crate::events::DomainEvent;

/// Delivers domain events to external collaborators (notifications,
/// messaging, audit).
///
/// Publishing happens after the state change has been persisted and is
/// best-effort: a publisher failure must never roll back a committed
/// booking, so implementations log and swallow delivery errors.
#[async_trait]
pub trait EventPublisher: Send + Sync + std::fmt::Debug {
    /// Publish a single event.
    async fn publish(&self, event: DomainEvent);
}
