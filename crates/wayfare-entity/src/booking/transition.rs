//! A compare-and-swap booking status change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wayfare_core::types::id::{BookingId, UserId};

use super::model::Booking;
use super::status::{BookingPaymentStatus, BookingStatus};

/// A status change that only applies while the booking is still in `from`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingTransition {
    /// Target booking.
    pub booking_id: BookingId,
    /// Status the caller observed.
    pub from: BookingStatus,
    /// Status to move to.
    pub to: BookingStatus,
    /// Transition instant; also stamps the matching timestamp column.
    pub at: DateTime<Utc>,
    /// Acting user, recorded as `cancelled_by` on cancellation.
    pub actor_id: Option<UserId>,
    /// Recorded as `cancellation_reason` on cancellation.
    pub reason: Option<String>,
    /// Payment status to set alongside, if any.
    pub payment_status: Option<BookingPaymentStatus>,
}

impl BookingTransition {
    /// Creates a bare transition.
    pub fn new(booking: &Booking, to: BookingStatus, at: DateTime<Utc>) -> Self {
        Self {
            booking_id: booking.id,
            from: booking.status,
            to,
            at,
            actor_id: None,
            reason: None,
            payment_status: None,
        }
    }

    /// Records the acting user.
    pub fn by(mut self, actor_id: Option<UserId>) -> Self {
        self.actor_id = actor_id;
        self
    }

    /// Records a reason.
    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    /// Also sets the booking's payment status.
    pub fn with_payment_status(mut self, payment_status: BookingPaymentStatus) -> Self {
        self.payment_status = Some(payment_status);
        self
    }

    /// Whether this move gives the booking's seats back to the slot.
    pub fn releases_capacity(&self) -> bool {
        self.from.holds_capacity() && !self.to.holds_capacity()
    }
}

impl Booking {
    /// Applies a transition in place. The caller has already checked that
    /// `self.status == t.from`.
    pub fn apply_transition(&mut self, t: &BookingTransition) {
        self.status = t.to;
        self.updated_at = t.at;
        if let Some(payment_status) = t.payment_status {
            self.payment_status = payment_status;
        }
        match t.to {
            BookingStatus::Confirmed => {
                self.confirmed_at.get_or_insert(t.at);
            }
            BookingStatus::Cancelled => {
                self.cancelled_at = Some(t.at);
                self.cancelled_by = t.actor_id;
                self.cancellation_reason = t.reason.clone();
            }
            BookingStatus::Completed => self.completed_at = Some(t.at),
            BookingStatus::Refunded => self.refunded_at = Some(t.at),
            BookingStatus::Pending | BookingStatus::Disputed => {}
        }
    }
}
