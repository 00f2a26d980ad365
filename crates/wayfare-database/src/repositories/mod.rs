//! PostgreSQL implementations of the store traits.

pub mod booking;
pub mod dispute;
pub mod experience;
pub mod payment;
pub mod statistics;

use sqlx::PgPool;

pub use booking::BookingRepository;
pub use dispute::DisputeRepository;
pub use experience::ExperienceRepository;
pub use payment::PaymentRepository;
pub use statistics::StatisticsRepository;

/// Every PostgreSQL repository over one shared pool.
#[derive(Debug, Clone)]
pub struct PgStores {
    /// Bookings and capacity slots.
    pub bookings: BookingRepository,
    /// Payments and refunds.
    pub payments: PaymentRepository,
    /// Booking and payment disputes.
    pub disputes: DisputeRepository,
    /// Read-side statistics.
    pub statistics: StatisticsRepository,
    /// Experience catalog projection.
    pub experiences: ExperienceRepository,
}

impl PgStores {
    /// Build every repository over `pool`.
    pub fn new(pool: PgPool) -> Self {
        Self {
            bookings: BookingRepository::new(pool.clone()),
            payments: PaymentRepository::new(pool.clone()),
            disputes: DisputeRepository::new(pool.clone()),
            statistics: StatisticsRepository::new(pool.clone()),
            experiences: ExperienceRepository::new(pool),
        }
    }
}
