//! Capacity slot reconciliation.

use async_trait::async_trait;
use serde_json::Value;
use tracing;

use wayfare_service::CapacityLedger;

use crate::executor::{JobExecutionError, JobHandler};

/// Recomputes upcoming slot counters from the bookings holding capacity and
/// repairs any drift.
#[derive(Debug)]
pub struct ReconcileJobHandler {
    ledger: CapacityLedger,
    batch_size: i64,
}

impl ReconcileJobHandler {
    /// Create a new reconciliation job handler
    pub fn new(ledger: CapacityLedger, batch_size: i64) -> Self {
        Self { ledger, batch_size }
    }
}

#[async_trait]
impl JobHandler for ReconcileJobHandler {
    fn job_type(&self) -> &str {
        "slot_reconciliation"
    }

    async fn execute(&self) -> Result<Value, JobExecutionError> {
        let report = self.ledger.reconcile_slots(self.batch_size).await?;
        if !report.repaired.is_empty() {
            tracing::warn!(
                checked = report.checked,
                repaired = report.repaired.len(),
                "Slot counters repaired"
            );
        }
        Ok(serde_json::json!({
            "task": "slot_reconciliation",
            "checked": report.checked,
            "repaired": report.repaired.len(),
        }))
    }
}
