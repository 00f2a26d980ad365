//! Booking persistence and the capacity ledger.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, UserId};
use wayfare_core::types::pagination::{PageRequest, PageResponse};
use wayfare_entity::booking::{Booking, BookingPaymentStatus, BookingTransition, NewBooking};
use wayfare_entity::capacity::{CapacitySlot, SlotDrift, SlotKey};

/// Result of an atomic reserve-and-insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReserveOutcome {
    /// The seats were taken and the booking row written.
    Reserved {
        /// The inserted booking.
        booking: Booking,
        /// The slot after the reservation.
        slot: CapacitySlot,
    },
    /// The slot could not fit the request. Nothing was written.
    Insufficient {
        /// Room left in the slot at the time of the attempt.
        remaining: i32,
    },
}

/// Persistence for bookings and their per-slot capacity counters.
#[async_trait]
pub trait BookingStore: Send + Sync + std::fmt::Debug {
    /// Atomically add `booking.participants_count` to the slot counter if it
    /// stays within `max_participants`, and insert the booking in the same
    /// unit of work.
    async fn reserve(
        &self,
        booking: &NewBooking,
        max_participants: i32,
    ) -> Result<ReserveOutcome, AppError>;

    /// Find a live booking by ID.
    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, AppError>;

    /// Find a live booking by its human-facing number.
    async fn find_by_number(&self, booking_number: i64) -> Result<Option<Booking>, AppError>;

    /// Bookings made by a traveler, newest first.
    async fn list_by_traveler(
        &self,
        traveler_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError>;

    /// Bookings on a provider's experiences, newest first.
    async fn list_by_provider(
        &self,
        provider_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError>;

    /// Read one slot counter.
    async fn find_slot(&self, key: SlotKey) -> Result<Option<CapacitySlot>, AppError>;

    /// Apply a status change if the booking is still in `transition.from`,
    /// releasing its seats in the same unit of work when the change leaves
    /// the capacity-holding set. `None` means another writer moved it first.
    async fn apply_transition(
        &self,
        transition: &BookingTransition,
    ) -> Result<Option<Booking>, AppError>;

    /// Set the mirrored payment status without touching the lifecycle.
    async fn set_payment_status(
        &self,
        id: BookingId,
        payment_status: BookingPaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;

    /// Soft-delete a booking in a terminal status.
    async fn soft_delete(&self, id: BookingId, at: DateTime<Utc>)
    -> Result<Option<Booking>, AppError>;

    /// Pending bookings created before `created_before`, oldest first.
    async fn find_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError>;

    /// Confirmed bookings dated on or before `date`, oldest first.
    async fn find_completable(&self, date: NaiveDate, limit: i64)
    -> Result<Vec<Booking>, AppError>;

    /// Keys of slots dated on or after `from`.
    async fn list_slot_keys(&self, from: NaiveDate, limit: i64) -> Result<Vec<SlotKey>, AppError>;

    /// Recompute a slot's counter from its capacity-holding bookings under
    /// the slot lock, returning the drift when a repair was needed.
    async fn reconcile_slot(
        &self,
        key: SlotKey,
        at: DateTime<Utc>,
    ) -> Result<Option<SlotDrift>, AppError>;
}
