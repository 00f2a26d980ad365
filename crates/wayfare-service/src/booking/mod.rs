//! Booking lifecycle management.

pub mod request;
pub mod service;

pub use request::CreateBookingRequest;
pub use service::BookingService;
