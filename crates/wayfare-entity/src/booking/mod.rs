//! Booking entities and the booking state machine.

pub mod model;
pub mod status;
pub mod transition;

pub use model::{Booking, NewBooking};
pub use status::{BOOKING_TRANSITIONS, BookingPaymentStatus, BookingStatus};
pub use transition::BookingTransition;
