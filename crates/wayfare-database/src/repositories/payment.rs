//! Payment repository on PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, PaymentId, RefundId};
use wayfare_entity::payment::{NewPayment, Payment, PaymentRefund, PaymentTransition};

use crate::error::db_err;
use crate::store::payment::{PaymentStore, RefundOutcome, RefundRequest};

/// Repository for payments and their refund ledger.
#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    /// Create a new payment repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for PaymentRepository {
    async fn insert(&self, payment: &NewPayment) -> Result<Payment, AppError> {
        sqlx::query_as::<_, Payment>(
            "INSERT INTO payments (id, booking_id, traveler_id, provider_id, amount, currency, \
             payment_type, payment_method, gateway_reference, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10) RETURNING *",
        )
        .bind(payment.id)
        .bind(payment.booking_id)
        .bind(payment.traveler_id)
        .bind(payment.provider_id)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(payment.payment_type)
        .bind(&payment.payment_method)
        .bind(&payment.gateway_reference)
        .bind(payment.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to create payment"))
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find payment"))
    }

    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = $1")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find payment by booking"))
    }

    async fn transition(&self, t: &PaymentTransition) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET \
               status = $3, \
               gateway_reference = COALESCE($5, gateway_reference), \
               completed_at = CASE WHEN $3 = 'completed' THEN $4 ELSE completed_at END, \
               commission_rate_bps = CASE WHEN $3 = 'completed' THEN COALESCE($6, commission_rate_bps) ELSE commission_rate_bps END, \
               commission_amount = CASE WHEN $3 = 'completed' THEN COALESCE($7, commission_amount) ELSE commission_amount END, \
               provider_amount = CASE WHEN $3 = 'completed' THEN COALESCE($8, provider_amount) ELSE provider_amount END, \
               failed_at = CASE WHEN $3 = 'failed' THEN $4 ELSE failed_at END, \
               failure_reason = CASE WHEN $3 = 'failed' THEN $9 WHEN $3 = 'completed' THEN NULL ELSE failure_reason END, \
               updated_at = $4 \
             WHERE id = $1 AND status = $2 \
             RETURNING *",
        )
        .bind(t.payment_id)
        .bind(t.from)
        .bind(t.to)
        .bind(t.at)
        .bind(&t.gateway_reference)
        .bind(t.split.map(|s| s.rate_bps))
        .bind(t.split.map(|s| s.commission_amount))
        .bind(t.split.map(|s| s.provider_amount))
        .bind(&t.failure_reason)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update payment status"))
    }

    async fn apply_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin refund"))?;

        // Lock the payment so replays and cumulative totals are judged
        // against a stable row.
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE id = $1 FOR UPDATE")
            .bind(request.payment_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err("Failed to lock payment"))?
            .ok_or_else(|| AppError::not_found(format!("Payment {} not found", request.payment_id)))?;

        let earlier = sqlx::query_as::<_, PaymentRefund>(
            "SELECT * FROM payment_refunds WHERE payment_id = $1 AND operation_key = $2",
        )
        .bind(request.payment_id)
        .bind(&request.operation_key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to look up refund operation"))?;

        if let Some(refund) = earlier {
            tx.commit()
                .await
                .map_err(db_err("Failed to commit refund replay"))?;
            return Ok(RefundOutcome::Replayed { payment, refund });
        }

        let updated = sqlx::query_as::<_, Payment>(
            "UPDATE payments SET \
               total_refunded_amount = total_refunded_amount + $2, \
               status = CASE WHEN total_refunded_amount + $2 = amount \
                             THEN 'refunded'::payment_status \
                             ELSE 'partially_refunded'::payment_status END, \
               refunded_at = $3, \
               updated_at = $3 \
             WHERE id = $1 \
               AND status IN ('completed', 'partially_refunded') \
               AND $2 > 0 \
               AND total_refunded_amount + $2 <= amount \
             RETURNING *",
        )
        .bind(request.payment_id)
        .bind(request.amount)
        .bind(request.at)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to apply refund"))?;

        let Some(updated) = updated else {
            tx.rollback()
                .await
                .map_err(db_err("Failed to roll back refund"))?;
            return Ok(RefundOutcome::Rejected {
                status: payment.status,
                refundable: if payment.status.is_refundable() {
                    payment.refundable_amount()
                } else {
                    0
                },
            });
        };

        let refund = sqlx::query_as::<_, PaymentRefund>(
            "INSERT INTO payment_refunds (id, payment_id, amount, reason, operation_key, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(RefundId::new())
        .bind(request.payment_id)
        .bind(request.amount)
        .bind(&request.reason)
        .bind(&request.operation_key)
        .bind(request.at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to record refund"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit refund"))?;

        Ok(RefundOutcome::Applied {
            payment: updated,
            refund,
        })
    }

    async fn mark_transferred(
        &self,
        id: PaymentId,
        reference: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Payment>, AppError> {
        sqlx::query_as::<_, Payment>(
            "UPDATE payments SET transferred_at = $3, transfer_reference = $2, updated_at = $3 \
             WHERE id = $1 AND status = 'completed' AND transferred_at IS NULL \
             RETURNING *",
        )
        .bind(id)
        .bind(reference)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to mark payment transferred"))
    }

    async fn list_refunds(&self, payment_id: PaymentId) -> Result<Vec<PaymentRefund>, AppError> {
        sqlx::query_as::<_, PaymentRefund>(
            "SELECT * FROM payment_refunds WHERE payment_id = $1 ORDER BY created_at ASC",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list refunds"))
    }
}
