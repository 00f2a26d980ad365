//! Payment reconciliation events.

use serde::{Deserialize, Serialize};

use crate::types::id::{BookingId, PaymentId};

/// Events emitted when payment state changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PaymentEvent {
    /// A payment was opened for a booking.
    Initiated {
        /// The payment.
        payment_id: PaymentId,
        /// The booking it pays for.
        booking_id: BookingId,
        /// Amount due, minor units.
        amount: i64,
    },
    /// Funds were captured and the commission split frozen.
    Completed {
        /// The payment.
        payment_id: PaymentId,
        /// The booking it pays for.
        booking_id: BookingId,
        /// Platform commission, minor units.
        commission_amount: i64,
        /// Provider share, minor units.
        provider_amount: i64,
    },
    /// The payment failed at the gateway.
    Failed {
        /// The payment.
        payment_id: PaymentId,
        /// The booking it pays for.
        booking_id: BookingId,
        /// Gateway-reported reason.
        reason: Option<String>,
    },
    /// The payment was abandoned before capture.
    Cancelled {
        /// The payment.
        payment_id: PaymentId,
    },
    /// A refund was applied.
    Refunded {
        /// The payment.
        payment_id: PaymentId,
        /// The booking it pays for.
        booking_id: BookingId,
        /// Amount of this refund.
        amount: i64,
        /// Cumulative refunded amount after this refund.
        total_refunded: i64,
        /// Whether the whole payment is now refunded.
        full: bool,
    },
    /// The provider share was paid out.
    Transferred {
        /// The payment.
        payment_id: PaymentId,
        /// Amount paid out to the provider.
        provider_amount: i64,
    },
}

impl PaymentEvent {
    /// Dotted event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initiated { .. } => "payment.initiated",
            Self::Completed { .. } => "payment.completed",
            Self::Failed { .. } => "payment.failed",
            Self::Cancelled { .. } => "payment.cancelled",
            Self::Refunded { full: true, .. } => "payment.refunded",
            Self::Refunded { full: false, .. } => "payment.partially_refunded",
            Self::Transferred { .. } => "payment.transferred",
        }
    }
}
