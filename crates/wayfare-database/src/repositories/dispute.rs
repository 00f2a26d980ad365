//! Dispute repository on PostgreSQL.
//!
//! Booking and payment disputes share a column layout, so both tables are
//! driven by the same SQL templates.

use async_trait::async_trait;
use sqlx::PgPool;

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, DisputeId, PaymentId};
use wayfare_entity::dispute::{
    BookingDispute, DisputeStatus, DisputeUpdate, PaymentDispute, PaymentDisputeStatus,
};

use crate::error::db_err;
use crate::store::dispute::DisputeStore;

const BOOKING_DISPUTES: &str = "booking_disputes";
const PAYMENT_DISPUTES: &str = "payment_disputes";

fn insert_sql(table: &str, owner_column: &str) -> String {
    format!(
        "INSERT INTO {table} (id, {owner_column}, initiated_by, reason, description, evidence, \
         status, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING *"
    )
}

fn update_sql(table: &str) -> String {
    format!(
        "UPDATE {table} SET \
           status = $3, \
           updated_at = $4, \
           reviewed_by = COALESCE($5, reviewed_by), \
           resolution_type = COALESCE($6, resolution_type), \
           resolution_notes = CASE WHEN $6 IS NULL THEN resolution_notes ELSE $7 END, \
           refund_amount = CASE WHEN $6 IS NULL THEN refund_amount ELSE $8 END, \
           resolved_by = COALESCE($9, resolved_by), \
           resolved_at = CASE WHEN $6 IS NULL THEN resolved_at ELSE $4 END, \
           closed_at = CASE WHEN $3 = 'closed' THEN $4 ELSE closed_at END \
         WHERE id = $1 AND status = $2 \
         RETURNING *"
    )
}

/// Repository for booking and payment disputes.
#[derive(Debug, Clone)]
pub struct DisputeRepository {
    pool: PgPool,
}

impl DisputeRepository {
    /// Create a new dispute repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DisputeStore for DisputeRepository {
    async fn insert_booking_dispute(
        &self,
        dispute: &BookingDispute,
    ) -> Result<BookingDispute, AppError> {
        sqlx::query_as::<_, BookingDispute>(&insert_sql(BOOKING_DISPUTES, "booking_id"))
            .bind(dispute.id)
            .bind(dispute.booking_id)
            .bind(dispute.initiated_by)
            .bind(dispute.reason)
            .bind(&dispute.description)
            .bind(&dispute.evidence)
            .bind(dispute.status)
            .bind(dispute.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to create booking dispute"))
    }

    async fn discard_booking_dispute(&self, id: DisputeId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM booking_disputes WHERE id = $1 AND status = 'open'")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err("Failed to discard booking dispute"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_booking_dispute(
        &self,
        id: DisputeId,
    ) -> Result<Option<BookingDispute>, AppError> {
        sqlx::query_as::<_, BookingDispute>("SELECT * FROM booking_disputes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find booking dispute"))
    }

    async fn active_booking_dispute(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingDispute>, AppError> {
        sqlx::query_as::<_, BookingDispute>(
            "SELECT * FROM booking_disputes \
             WHERE booking_id = $1 AND status IN ('open', 'in_review')",
        )
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find active booking dispute"))
    }

    async fn list_booking_disputes(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<BookingDispute>, AppError> {
        sqlx::query_as::<_, BookingDispute>(
            "SELECT * FROM booking_disputes WHERE booking_id = $1 ORDER BY created_at ASC",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list booking disputes"))
    }

    async fn update_booking_dispute(
        &self,
        update: &DisputeUpdate<DisputeStatus>,
    ) -> Result<Option<BookingDispute>, AppError> {
        let resolution = update.resolution.as_ref();
        sqlx::query_as::<_, BookingDispute>(&update_sql(BOOKING_DISPUTES))
            .bind(update.dispute_id)
            .bind(update.from)
            .bind(update.to)
            .bind(update.at)
            .bind(update.reviewed_by)
            .bind(resolution.map(|r| r.resolution_type))
            .bind(resolution.and_then(|r| r.notes.clone()))
            .bind(resolution.and_then(|r| r.refund_amount))
            .bind(resolution.map(|r| r.resolved_by))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to update booking dispute"))
    }

    async fn insert_payment_dispute(
        &self,
        dispute: &PaymentDispute,
    ) -> Result<PaymentDispute, AppError> {
        sqlx::query_as::<_, PaymentDispute>(&insert_sql(PAYMENT_DISPUTES, "payment_id"))
            .bind(dispute.id)
            .bind(dispute.payment_id)
            .bind(dispute.initiated_by)
            .bind(dispute.reason)
            .bind(&dispute.description)
            .bind(&dispute.evidence)
            .bind(dispute.status)
            .bind(dispute.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to create payment dispute"))
    }

    async fn find_payment_dispute(
        &self,
        id: DisputeId,
    ) -> Result<Option<PaymentDispute>, AppError> {
        sqlx::query_as::<_, PaymentDispute>("SELECT * FROM payment_disputes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find payment dispute"))
    }

    async fn active_payment_dispute(
        &self,
        payment_id: PaymentId,
    ) -> Result<Option<PaymentDispute>, AppError> {
        sqlx::query_as::<_, PaymentDispute>(
            "SELECT * FROM payment_disputes \
             WHERE payment_id = $1 AND status IN ('open', 'in_review')",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find active payment dispute"))
    }

    async fn list_payment_disputes(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentDispute>, AppError> {
        sqlx::query_as::<_, PaymentDispute>(
            "SELECT * FROM payment_disputes WHERE payment_id = $1 ORDER BY created_at ASC",
        )
        .bind(payment_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list payment disputes"))
    }

    async fn update_payment_dispute(
        &self,
        update: &DisputeUpdate<PaymentDisputeStatus>,
    ) -> Result<Option<PaymentDispute>, AppError> {
        let resolution = update.resolution.as_ref();
        sqlx::query_as::<_, PaymentDispute>(&update_sql(PAYMENT_DISPUTES))
            .bind(update.dispute_id)
            .bind(update.from)
            .bind(update.to)
            .bind(update.at)
            .bind(update.reviewed_by)
            .bind(resolution.map(|r| r.resolution_type))
            .bind(resolution.and_then(|r| r.notes.clone()))
            .bind(resolution.and_then(|r| r.refund_amount))
            .bind(resolution.map(|r| r.resolved_by))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to update payment dispute"))
    }
}
