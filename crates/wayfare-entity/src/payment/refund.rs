//! Refund ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use wayfare_core::types::id::{PaymentId, RefundId};

/// One applied refund. `(payment_id, operation_key)` is unique, so a
/// retried operation finds its earlier entry instead of refunding twice.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentRefund {
    /// Refund ID.
    pub id: RefundId,
    /// The refunded payment.
    pub payment_id: PaymentId,
    /// Amount returned by this operation.
    pub amount: i64,
    /// Free-form reason.
    pub reason: Option<String>,
    /// Caller-supplied idempotency key.
    pub operation_key: String,
    /// When it was applied.
    pub created_at: DateTime<Utc>,
}
