//! Automatic completion of past bookings.

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use wayfare_service::BookingService;

use crate::executor::{JobExecutionError, JobHandler};

/// Completes confirmed bookings `booking.auto_complete_after_days` after
/// their date.
#[derive(Debug)]
pub struct CompletionJobHandler {
    bookings: BookingService,
    batch_size: i64,
}

impl CompletionJobHandler {
    /// Create a new completion job handler
    pub fn new(bookings: BookingService, batch_size: i64) -> Self {
        Self {
            bookings,
            batch_size,
        }
    }
}

#[async_trait]
impl JobHandler for CompletionJobHandler {
    fn job_type(&self) -> &str {
        "auto_completion"
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let completed = self.bookings.complete_due(self.batch_size).await?;
        if completed > 0 {
            tracing::info!(completed, "Completed past bookings");
        }
        Ok(serde_json::json!({
            "task": "auto_completion",
            "completed": completed,
        }))
    }
}
