//! Booking status, payment status, and the booking transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Created, capacity reserved, awaiting payment or confirmation.
    Pending,
    /// Confirmed by payment or by an operator.
    Confirmed,
    /// Cancelled by the traveler, an admin, or expiry.
    Cancelled,
    /// The experience took place.
    Completed,
    /// A booking dispute is open.
    Disputed,
    /// The payment was fully refunded.
    Refunded,
}

/// Every legal booking transition. Anything absent is rejected.
pub const BOOKING_TRANSITIONS: &[(BookingStatus, BookingStatus)] = &[
    (BookingStatus::Pending, BookingStatus::Confirmed),
    (BookingStatus::Pending, BookingStatus::Cancelled),
    (BookingStatus::Pending, BookingStatus::Refunded),
    (BookingStatus::Confirmed, BookingStatus::Cancelled),
    (BookingStatus::Confirmed, BookingStatus::Completed),
    (BookingStatus::Confirmed, BookingStatus::Disputed),
    (BookingStatus::Confirmed, BookingStatus::Refunded),
    (BookingStatus::Disputed, BookingStatus::Confirmed),
    (BookingStatus::Disputed, BookingStatus::Refunded),
    (BookingStatus::Completed, BookingStatus::Refunded),
    (BookingStatus::Cancelled, BookingStatus::Refunded),
];

impl BookingStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Cancelled,
        Self::Completed,
        Self::Disputed,
        Self::Refunded,
    ];

    /// Whether `self -> to` appears in [`BOOKING_TRANSITIONS`].
    pub fn can_transition_to(self, to: Self) -> bool {
        BOOKING_TRANSITIONS.contains(&(self, to))
    }

    /// Pending and confirmed bookings may be cancelled.
    pub fn can_be_cancelled(self) -> bool {
        self.can_transition_to(Self::Cancelled)
    }

    /// Whether a booking in this status occupies slot capacity.
    ///
    /// Disputed bookings keep their seats until the dispute is settled.
    pub fn holds_capacity(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Disputed)
    }

    /// Statuses from which only a refund can follow.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::Refunded)
    }

    /// A booking dispute may be opened in these statuses.
    pub fn is_disputable(self) -> bool {
        matches!(self, Self::Confirmed | Self::Completed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Disputed => "disputed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment state as mirrored onto the booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingPaymentStatus {
    /// Not yet paid.
    Pending,
    /// Funds captured.
    Paid,
    /// The last payment attempt failed.
    Failed,
    /// Fully refunded.
    Refunded,
}

impl BookingPaymentStatus {
    /// All payment statuses.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Refunded];

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for BookingPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
