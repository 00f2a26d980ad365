//! # wayfare-service
//!
//! Business logic of the Wayfare booking engine. Each service orchestrates
//! the store traits, the injected clock, and the event publisher to
//! implement one part of the booking lifecycle.
//!
//! Services follow constructor injection: all dependencies are provided
//! at construction time via `Arc` references. [`BookingEngine`] does the
//! wiring.

pub mod booking;
pub mod capacity;
pub mod context;
pub mod dispute;
pub mod engine;
pub mod events;
pub mod payment;
pub mod statistics;

pub use booking::{BookingService, CreateBookingRequest};
pub use capacity::{Availability, CapacityLedger, ReconcileReport, Reservation, ReservationToken};
pub use context::{ActorRole, RequestContext};
pub use dispute::{Dispute, DisputeService, OpenDisputeRequest, ResolveDisputeRequest};
pub use engine::{BookingEngine, EngineStores};
pub use events::MemoryEventBus;
pub use payment::{PaymentService, RefundReceipt};
pub use statistics::{StatisticsScope, StatisticsService};
