//! Payment status and transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Initiated, not yet submitted to the processor.
    Pending,
    /// Submitted, awaiting the processor's verdict.
    Processing,
    /// Funds captured.
    Completed,
    /// The processor declined.
    Failed,
    /// Abandoned before capture.
    Cancelled,
    /// Some of the captured amount was returned.
    PartiallyRefunded,
    /// The whole captured amount was returned.
    Refunded,
}

/// Every legal payment transition.
///
/// `PartiallyRefunded -> PartiallyRefunded` is the only self-transition: each
/// further partial refund re-enters the same state.
pub const PAYMENT_TRANSITIONS: &[(PaymentStatus, PaymentStatus)] = &[
    (PaymentStatus::Pending, PaymentStatus::Processing),
    (PaymentStatus::Pending, PaymentStatus::Completed),
    (PaymentStatus::Pending, PaymentStatus::Failed),
    (PaymentStatus::Pending, PaymentStatus::Cancelled),
    (PaymentStatus::Processing, PaymentStatus::Completed),
    (PaymentStatus::Processing, PaymentStatus::Failed),
    (PaymentStatus::Processing, PaymentStatus::Cancelled),
    (PaymentStatus::Failed, PaymentStatus::Processing),
    (PaymentStatus::Completed, PaymentStatus::PartiallyRefunded),
    (PaymentStatus::Completed, PaymentStatus::Refunded),
    (PaymentStatus::PartiallyRefunded, PaymentStatus::PartiallyRefunded),
    (PaymentStatus::PartiallyRefunded, PaymentStatus::Refunded),
];

impl PaymentStatus {
    /// All statuses.
    pub const ALL: [Self; 7] = [
        Self::Pending,
        Self::Processing,
        Self::Completed,
        Self::Failed,
        Self::Cancelled,
        Self::PartiallyRefunded,
        Self::Refunded,
    ];

    /// Whether `self -> to` appears in [`PAYMENT_TRANSITIONS`].
    pub fn can_transition_to(self, to: Self) -> bool {
        PAYMENT_TRANSITIONS.contains(&(self, to))
    }

    /// Captured funds remain that could still be refunded.
    pub fn is_refundable(self) -> bool {
        matches!(self, Self::Completed | Self::PartiallyRefunded)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of money movement a payment row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Traveler pays for a booking.
    Booking,
    /// Money returned to the traveler.
    Refund,
    /// Platform commission.
    Commission,
    /// Payout to the provider.
    Transfer,
}
