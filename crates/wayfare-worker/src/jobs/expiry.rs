//! Expiry of unpaid pending bookings.

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use wayfare_service::BookingService;

use crate::executor::{JobExecutionError, JobHandler};

/// Cancels pending bookings older than `booking.pending_expiry_minutes` and
/// frees their seats. A no-op while expiry is not configured.
#[derive(Debug)]
pub struct ExpiryJobHandler {
    bookings: BookingService,
    batch_size: i64,
}

impl ExpiryJobHandler {
    /// Create a new expiry job handler
    pub fn new(bookings: BookingService, batch_size: i64) -> Self {
        Self {
            bookings,
            batch_size,
        }
    }
}

#[async_trait]
impl JobHandler for ExpiryJobHandler {
    fn job_type(&self) -> &str {
        "pending_expiry"
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let expired = self.bookings.expire_stale_pending(self.batch_size).await?;
        if expired > 0 {
            tracing::info!(expired, "Expired stale pending bookings");
        }
        Ok(serde_json::json!({
            "task": "pending_expiry",
            "expired": expired,
        }))
    }
}
