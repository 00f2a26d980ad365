//! Store traits the services are written against.
//!
//! Every mutating method is a conditional write: it either applies against
//! the state the caller observed or reports that it did not, so concurrent
//! callers can never both succeed on the same row.

pub mod booking;
pub mod dispute;
pub mod experience;
pub mod payment;
pub mod statistics;

pub use booking::{BookingStore, ReserveOutcome};
pub use dispute::DisputeStore;
pub use experience::ExperienceCatalog;
pub use payment::{PaymentStore, RefundOutcome, RefundRequest};
pub use statistics::{BookingStatistics, StatisticsQuery, StatisticsStore};
