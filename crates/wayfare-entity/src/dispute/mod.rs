//! Booking and payment disputes.

pub mod model;
pub mod status;

pub use model::{
    BookingDispute, BookingDisputeReason, DisputeResolution, DisputeUpdate, NewDispute,
    PaymentDispute, PaymentDisputeReason,
};
pub use status::{
    BOOKING_DISPUTE_TRANSITIONS, DisputeStatus, PAYMENT_DISPUTE_TRANSITIONS, PaymentDisputeStatus,
    ResolutionType,
};
