//! Booking entity model.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use wayfare_core::types::id::{BookingId, ExperienceId, UserId};

use super::status::{BookingPaymentStatus, BookingStatus};

/// A traveler's reservation of participant capacity on one experience date.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// External reference.
    pub id: BookingId,
    /// Monotonic human-facing number.
    pub booking_number: i64,
    /// The booked experience.
    pub experience_id: ExperienceId,
    /// The traveler who booked.
    pub traveler_id: UserId,
    /// Provider of the experience at creation time.
    ///
    /// This is a snapshot: reassigning the experience to another provider
    /// must not move historical bookings, so it is never refreshed.
    pub provider_id: UserId,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// The slot date (pure calendar date).
    pub booking_date: NaiveDate,
    /// Optional start time within the date.
    pub booking_time: Option<NaiveTime>,
    /// Number of participants reserved.
    pub participants_count: i32,
    /// Experience price per participant when the booking was made.
    pub unit_price: i64,
    /// `unit_price * participants_count`, frozen at creation.
    pub total_amount: i64,
    /// ISO-4217 currency code.
    pub currency: String,
    /// Payment state mirrored from payment reconciliation.
    pub payment_status: BookingPaymentStatus,
    /// Payment method chosen by the traveler.
    pub payment_method: Option<String>,
    /// Free-form requests for the provider.
    pub special_requests: Option<String>,
    /// Caller-supplied metadata.
    pub metadata: serde_json::Value,
    /// Why the booking was cancelled.
    pub cancellation_reason: Option<String>,
    /// Who cancelled it (`None` when the system expired it).
    pub cancelled_by: Option<UserId>,
    /// When the booking was confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the booking was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// When the booking was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the booking was fully refunded.
    pub refunded_at: Option<DateTime<Utc>>,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Whether `user_id` is the traveler who made this booking.
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.traveler_id == user_id
    }

    /// Whether `user_id` is the provider snapshot on this booking.
    pub fn is_provided_by(&self, user_id: UserId) -> bool {
        self.provider_id == user_id
    }

    /// Whether the booking has been archived.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Data required to insert a booking together with its reservation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBooking {
    /// External reference, generated by the caller.
    pub id: BookingId,
    /// The booked experience.
    pub experience_id: ExperienceId,
    /// The traveler.
    pub traveler_id: UserId,
    /// Provider snapshot.
    pub provider_id: UserId,
    /// The slot date.
    pub booking_date: NaiveDate,
    /// Optional start time.
    pub booking_time: Option<NaiveTime>,
    /// Participants to reserve.
    pub participants_count: i32,
    /// Price per participant.
    pub unit_price: i64,
    /// Frozen total.
    pub total_amount: i64,
    /// ISO-4217 currency code.
    pub currency: String,
    /// Payment method.
    pub payment_method: Option<String>,
    /// Special requests.
    pub special_requests: Option<String>,
    /// Metadata.
    pub metadata: serde_json::Value,
    /// Creation instant.
    pub created_at: DateTime<Utc>,
}

impl NewBooking {
    /// Materialize the stored row once the store has assigned a number.
    pub fn into_booking(self, booking_number: i64) -> Booking {
        Booking {
            id: self.id,
            booking_number,
            experience_id: self.experience_id,
            traveler_id: self.traveler_id,
            provider_id: self.provider_id,
            status: BookingStatus::Pending,
            booking_date: self.booking_date,
            booking_time: self.booking_time,
            participants_count: self.participants_count,
            unit_price: self.unit_price,
            total_amount: self.total_amount,
            currency: self.currency,
            payment_status: BookingPaymentStatus::Pending,
            payment_method: self.payment_method,
            special_requests: self.special_requests,
            metadata: self.metadata,
            cancellation_reason: None,
            cancelled_by: None,
            confirmed_at: None,
            cancelled_at: None,
            completed_at: None,
            refunded_at: None,
            created_at: self.created_at,
            updated_at: self.created_at,
            deleted_at: None,
        }
    }
}
