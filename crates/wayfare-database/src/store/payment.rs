//! Payment persistence, refunds, and transfers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, PaymentId};
use wayfare_entity::payment::{NewPayment, Payment, PaymentRefund, PaymentStatus, PaymentTransition};

/// A refund to apply once per `(payment_id, operation_key)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRequest {
    /// Payment to refund.
    pub payment_id: PaymentId,
    /// Amount to return, minor units.
    pub amount: i64,
    /// Free-form reason.
    pub reason: Option<String>,
    /// Idempotency key.
    pub operation_key: String,
    /// Application instant.
    pub at: DateTime<Utc>,
}

/// Result of a refund attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RefundOutcome {
    /// The refund was applied.
    Applied {
        /// Payment after the refund.
        payment: Payment,
        /// The new ledger entry.
        refund: PaymentRefund,
    },
    /// The operation key was already used; nothing changed.
    Replayed {
        /// Current payment.
        payment: Payment,
        /// The earlier ledger entry.
        refund: PaymentRefund,
    },
    /// The payment could not take this amount. Nothing changed.
    Rejected {
        /// Current status.
        status: PaymentStatus,
        /// Amount that could still be refunded.
        refundable: i64,
    },
}

/// Persistence for payments.
#[async_trait]
pub trait PaymentStore: Send + Sync + std::fmt::Debug {
    /// Insert a pending payment. A second payment for the same booking is a
    /// `Conflict`.
    async fn insert(&self, payment: &NewPayment) -> Result<Payment, AppError>;

    /// Find a payment by ID.
    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, AppError>;

    /// Find the payment for a booking.
    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, AppError>;

    /// Apply a status change if the payment is still in `transition.from`.
    async fn transition(&self, transition: &PaymentTransition)
    -> Result<Option<Payment>, AppError>;

    /// Apply a refund with one cumulative conditional update.
    async fn apply_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, AppError>;

    /// Stamp the transfer if the payment is completed and not yet
    /// transferred. `None` means the guard failed.
    async fn mark_transferred(
        &self,
        id: PaymentId,
        reference: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Payment>, AppError>;

    /// Refund ledger entries for a payment, oldest first.
    async fn list_refunds(&self, payment_id: PaymentId) -> Result<Vec<PaymentRefund>, AppError>;
}
