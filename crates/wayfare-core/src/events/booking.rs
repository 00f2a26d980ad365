//! Booking lifecycle events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::types::id::{BookingId, ExperienceId, UserId};

/// Events emitted on every booking status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BookingEvent {
    /// A booking was created and its capacity reserved.
    Created {
        /// The booking.
        booking_id: BookingId,
        /// The booked experience.
        experience_id: ExperienceId,
        /// The traveler who booked.
        traveler_id: UserId,
        /// The provider snapshot taken at creation.
        provider_id: UserId,
        /// The slot date.
        booking_date: NaiveDate,
        /// Participants reserved.
        participants: i32,
        /// Frozen total, minor units.
        total_amount: i64,
    },
    /// A booking was confirmed.
    Confirmed {
        /// The booking.
        booking_id: BookingId,
    },
    /// A booking was cancelled and its capacity released.
    Cancelled {
        /// The booking.
        booking_id: BookingId,
        /// Free-form reason.
        reason: Option<String>,
    },
    /// A pending booking expired without payment.
    Expired {
        /// The booking.
        booking_id: BookingId,
    },
    /// A booking was completed.
    Completed {
        /// The booking.
        booking_id: BookingId,
    },
    /// A dispute was opened against a booking.
    Disputed {
        /// The booking.
        booking_id: BookingId,
    },
    /// A booking was fully refunded.
    Refunded {
        /// The booking.
        booking_id: BookingId,
    },
    /// A disputed booking went back to confirmed.
    Reinstated {
        /// The booking.
        booking_id: BookingId,
    },
}

impl BookingEvent {
    /// Dotted event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Created { .. } => "booking.created",
            Self::Confirmed { .. } => "booking.confirmed",
            Self::Cancelled { .. } => "booking.cancelled",
            Self::Expired { .. } => "booking.expired",
            Self::Completed { .. } => "booking.completed",
            Self::Disputed { .. } => "booking.disputed",
            Self::Refunded { .. } => "booking.refunded",
            Self::Reinstated { .. } => "booking.reinstated",
        }
    }
}
