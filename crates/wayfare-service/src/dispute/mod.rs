//! Dispute resolution for bookings and payments.

pub mod request;
pub mod service;

pub use request::{OpenDisputeRequest, ResolveDisputeRequest};
pub use service::{Dispute, DisputeService};
