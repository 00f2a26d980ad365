//! Booking policy configuration.

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Commission rates are expressed in basis points of the payment amount.
pub const BASIS_POINTS: i64 = 10_000;

/// Reservation, commission, and lifecycle policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Platform commission in basis points (1500 = 15%), frozen onto each
    /// payment at completion.
    #[serde(default = "default_commission_rate_bps")]
    pub commission_rate_bps: i32,
    /// Hard cap on participants per booking regardless of experience limits.
    #[serde(default = "default_max_participants_per_booking")]
    pub max_participants_per_booking: i32,
    /// Minutes after which an unpaid `pending` booking is expired and its
    /// capacity released. `None` keeps pending bookings indefinitely.
    #[serde(default)]
    pub pending_expiry_minutes: Option<u64>,
    /// Days after the booking date at which confirmed bookings are completed
    /// automatically. `None` leaves completion to explicit calls.
    #[serde(default)]
    pub auto_complete_after_days: Option<u32>,
}

impl BookingConfig {
    /// Reject configurations the engine cannot honor.
    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=BASIS_POINTS as i32).contains(&self.commission_rate_bps) {
            return Err(AppError::configuration(format!(
                "booking.commission_rate_bps must be within 0..={BASIS_POINTS}, got {}",
                self.commission_rate_bps
            )));
        }
        if self.max_participants_per_booking < 1 {
            return Err(AppError::configuration(
                "booking.max_participants_per_booking must be at least 1",
            ));
        }
        if self.pending_expiry_minutes == Some(0) {
            return Err(AppError::configuration(
                "booking.pending_expiry_minutes must be positive when set",
            ));
        }
        Ok(())
    }
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            commission_rate_bps: default_commission_rate_bps(),
            max_participants_per_booking: default_max_participants_per_booking(),
            pending_expiry_minutes: None,
            auto_complete_after_days: None,
        }
    }
}

fn default_commission_rate_bps() -> i32 {
    1500
}

fn default_max_participants_per_booking() -> i32 {
    50
}
