//! Booking repository and capacity ledger on PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;
use tracing::{debug, warn};

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, UserId};
use wayfare_core::types::pagination::{PageRequest, PageResponse};
use wayfare_entity::booking::{
    Booking, BookingPaymentStatus, BookingStatus, BookingTransition, NewBooking,
};
use wayfare_entity::capacity::{CapacitySlot, SlotDrift, SlotKey};

use crate::error::db_err;
use crate::store::booking::{BookingStore, ReserveOutcome};

/// Repository for bookings and capacity slots.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn list_where(
        &self,
        column: &'static str,
        user_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM bookings WHERE {column} = $1 AND deleted_at IS NULL"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count bookings"))?;

        let items = sqlx::query_as::<_, Booking>(&format!(
            "SELECT * FROM bookings WHERE {column} = $1 AND deleted_at IS NULL \
             ORDER BY booking_number DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list bookings"))?;

        Ok(PageResponse::new(
            items,
            page.page,
            page.page_size,
            total as u64,
        ))
    }
}

#[async_trait]
impl BookingStore for BookingRepository {
    async fn reserve(
        &self,
        booking: &NewBooking,
        max_participants: i32,
    ) -> Result<ReserveOutcome, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin reservation"))?;

        sqlx::query(
            "INSERT INTO capacity_slots (experience_id, booking_date, reserved_participants, updated_at) \
             VALUES ($1, $2, 0, $3) ON CONFLICT (experience_id, booking_date) DO NOTHING",
        )
        .bind(booking.experience_id)
        .bind(booking.booking_date)
        .bind(booking.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to create capacity slot"))?;

        let slot = sqlx::query_as::<_, CapacitySlot>(
            "UPDATE capacity_slots \
             SET reserved_participants = reserved_participants + $3, updated_at = $4 \
             WHERE experience_id = $1 AND booking_date = $2 \
               AND reserved_participants + $3 <= $5 \
             RETURNING *",
        )
        .bind(booking.experience_id)
        .bind(booking.booking_date)
        .bind(booking.participants_count)
        .bind(booking.created_at)
        .bind(max_participants)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to reserve capacity"))?;

        let Some(slot) = slot else {
            let reserved: i32 = sqlx::query_scalar(
                "SELECT reserved_participants FROM capacity_slots \
                 WHERE experience_id = $1 AND booking_date = $2",
            )
            .bind(booking.experience_id)
            .bind(booking.booking_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("Failed to read capacity slot"))?;
            tx.rollback()
                .await
                .map_err(db_err("Failed to roll back reservation"))?;
            return Ok(ReserveOutcome::Insufficient {
                remaining: (max_participants - reserved).max(0),
            });
        };

        let stored = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, experience_id, traveler_id, provider_id, status, \
             booking_date, booking_time, participants_count, unit_price, total_amount, currency, \
             payment_status, payment_method, special_requests, metadata, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $16) \
             RETURNING *",
        )
        .bind(booking.id)
        .bind(booking.experience_id)
        .bind(booking.traveler_id)
        .bind(booking.provider_id)
        .bind(BookingStatus::Pending)
        .bind(booking.booking_date)
        .bind(booking.booking_time)
        .bind(booking.participants_count)
        .bind(booking.unit_price)
        .bind(booking.total_amount)
        .bind(&booking.currency)
        .bind(BookingPaymentStatus::Pending)
        .bind(&booking.payment_method)
        .bind(&booking.special_requests)
        .bind(&booking.metadata)
        .bind(booking.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to insert booking"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit reservation"))?;

        Ok(ReserveOutcome::Reserved {
            booking: stored,
            slot,
        })
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find booking"))
    }

    async fn find_by_number(&self, booking_number: i64) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE booking_number = $1 AND deleted_at IS NULL",
        )
        .bind(booking_number)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find booking by number"))
    }

    async fn list_by_traveler(
        &self,
        traveler_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        self.list_where("traveler_id", traveler_id, page).await
    }

    async fn list_by_provider(
        &self,
        provider_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        self.list_where("provider_id", provider_id, page).await
    }

    async fn find_slot(&self, key: SlotKey) -> Result<Option<CapacitySlot>, AppError> {
        sqlx::query_as::<_, CapacitySlot>(
            "SELECT * FROM capacity_slots WHERE experience_id = $1 AND booking_date = $2",
        )
        .bind(key.experience_id)
        .bind(key.booking_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to find capacity slot"))
    }

    async fn apply_transition(
        &self,
        t: &BookingTransition,
    ) -> Result<Option<Booking>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin booking transition"))?;

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET \
               status = $3, \
               payment_status = COALESCE($4, payment_status), \
               confirmed_at = CASE WHEN $3 = 'confirmed' THEN COALESCE(confirmed_at, $5) ELSE confirmed_at END, \
               cancelled_at = CASE WHEN $3 = 'cancelled' THEN $5 ELSE cancelled_at END, \
               cancelled_by = CASE WHEN $3 = 'cancelled' THEN $6 ELSE cancelled_by END, \
               cancellation_reason = CASE WHEN $3 = 'cancelled' THEN $7 ELSE cancellation_reason END, \
               completed_at = CASE WHEN $3 = 'completed' THEN $5 ELSE completed_at END, \
               refunded_at = CASE WHEN $3 = 'refunded' THEN $5 ELSE refunded_at END, \
               updated_at = $5 \
             WHERE id = $1 AND status = $2 AND deleted_at IS NULL \
             RETURNING *",
        )
        .bind(t.booking_id)
        .bind(t.from)
        .bind(t.to)
        .bind(t.payment_status)
        .bind(t.at)
        .bind(t.actor_id)
        .bind(&t.reason)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to update booking status"))?;

        let Some(updated) = updated else {
            tx.rollback()
                .await
                .map_err(db_err("Failed to roll back booking transition"))?;
            return Ok(None);
        };

        if t.releases_capacity() {
            let released = sqlx::query(
                "UPDATE capacity_slots \
                 SET reserved_participants = GREATEST(reserved_participants - $3, 0), updated_at = $4 \
                 WHERE experience_id = $1 AND booking_date = $2",
            )
            .bind(updated.experience_id)
            .bind(updated.booking_date)
            .bind(updated.participants_count)
            .bind(t.at)
            .execute(&mut *tx)
            .await
            .map_err(db_err("Failed to release capacity"))?;

            if released.rows_affected() == 0 {
                warn!(booking_id = %updated.id, "Releasing capacity of a missing slot");
            } else {
                debug!(
                    booking_id = %updated.id,
                    participants = updated.participants_count,
                    "Released slot capacity"
                );
            }
        }

        tx.commit()
            .await
            .map_err(db_err("Failed to commit booking transition"))?;
        Ok(Some(updated))
    }

    async fn set_payment_status(
        &self,
        id: BookingId,
        payment_status: BookingPaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET payment_status = $2, updated_at = $3 \
             WHERE id = $1 AND deleted_at IS NULL RETURNING *",
        )
        .bind(id)
        .bind(payment_status)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to update booking payment status"))
    }

    async fn soft_delete(
        &self,
        id: BookingId,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET deleted_at = $2, updated_at = $2 \
             WHERE id = $1 AND deleted_at IS NULL \
               AND status IN ('cancelled', 'completed', 'refunded') \
             RETURNING *",
        )
        .bind(id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("Failed to archive booking"))
    }

    async fn find_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings \
             WHERE status = 'pending' AND created_at < $1 AND deleted_at IS NULL \
             ORDER BY created_at ASC LIMIT $2",
        )
        .bind(created_before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to find stale pending bookings"))
    }

    async fn find_completable(
        &self,
        date: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings \
             WHERE status = 'confirmed' AND booking_date <= $1 AND deleted_at IS NULL \
             ORDER BY booking_date ASC, booking_number ASC LIMIT $2",
        )
        .bind(date)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to find completable bookings"))
    }

    async fn list_slot_keys(&self, from: NaiveDate, limit: i64) -> Result<Vec<SlotKey>, AppError> {
        let rows = sqlx::query_as::<_, CapacitySlot>(
            "SELECT * FROM capacity_slots WHERE booking_date >= $1 \
             ORDER BY experience_id, booking_date LIMIT $2",
        )
        .bind(from)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to list capacity slots"))?;
        Ok(rows.iter().map(CapacitySlot::key).collect())
    }

    async fn reconcile_slot(
        &self,
        key: SlotKey,
        at: DateTime<Utc>,
    ) -> Result<Option<SlotDrift>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_err("Failed to begin slot reconciliation"))?;

        let recorded: Option<i32> = sqlx::query_scalar(
            "SELECT reserved_participants FROM capacity_slots \
             WHERE experience_id = $1 AND booking_date = $2 FOR UPDATE",
        )
        .bind(key.experience_id)
        .bind(key.booking_date)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err("Failed to lock capacity slot"))?;

        let Some(recorded) = recorded else {
            tx.rollback()
                .await
                .map_err(db_err("Failed to roll back slot reconciliation"))?;
            return Ok(None);
        };

        let actual: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(participants_count), 0)::BIGINT FROM bookings \
             WHERE experience_id = $1 AND booking_date = $2 \
               AND status IN ('pending', 'confirmed', 'disputed')",
        )
        .bind(key.experience_id)
        .bind(key.booking_date)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("Failed to sum slot bookings"))?;
        let actual = i32::try_from(actual)
            .map_err(|_| AppError::internal(format!("Slot total {actual} overflows")))?;

        if recorded == actual {
            tx.commit()
                .await
                .map_err(db_err("Failed to commit slot reconciliation"))?;
            return Ok(None);
        }

        sqlx::query(
            "UPDATE capacity_slots SET reserved_participants = $3, updated_at = $4 \
             WHERE experience_id = $1 AND booking_date = $2",
        )
        .bind(key.experience_id)
        .bind(key.booking_date)
        .bind(actual)
        .bind(at)
        .execute(&mut *tx)
        .await
        .map_err(db_err("Failed to repair capacity slot"))?;

        tx.commit()
            .await
            .map_err(db_err("Failed to commit slot reconciliation"))?;

        Ok(Some(SlotDrift {
            key,
            recorded,
            actual,
        }))
    }
}
