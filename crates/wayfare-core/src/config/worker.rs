//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Maintenance job scheduling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the scheduler is started at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression for expiring stale pending bookings.
    #[serde(default = "default_expiry_schedule")]
    pub expiry_schedule: String,
    /// Cron expression for reconciling capacity slots with bookings.
    #[serde(default = "default_reconcile_schedule")]
    pub reconcile_schedule: String,
    /// Cron expression for auto-completing past confirmed bookings.
    #[serde(default = "default_completion_schedule")]
    pub completion_schedule: String,
    /// Maximum rows a single job run touches.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            expiry_schedule: default_expiry_schedule(),
            reconcile_schedule: default_reconcile_schedule(),
            completion_schedule: default_completion_schedule(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_expiry_schedule() -> String {
    "0 */5 * * * *".to_string()
}

fn default_reconcile_schedule() -> String {
    "0 15 * * * *".to_string()
}

fn default_completion_schedule() -> String {
    "0 30 2 * * *".to_string()
}

fn default_batch_size() -> i64 {
    200
}
