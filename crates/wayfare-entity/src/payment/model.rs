//! Payment entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use wayfare_core::types::id::{BookingId, PaymentId, UserId};

use super::commission::CommissionSplit;
use super::status::{PaymentStatus, PaymentType};

/// A payment against a booking. At most one exists per booking.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// The booking being paid for.
    pub booking_id: BookingId,
    /// The paying traveler.
    pub traveler_id: UserId,
    /// The provider receiving the payout.
    pub provider_id: UserId,
    /// Captured amount, minor units.
    pub amount: i64,
    /// ISO-4217 currency code.
    pub currency: String,
    /// Lifecycle status.
    pub status: PaymentStatus,
    /// What is being paid for.
    pub payment_type: PaymentType,
    /// Payment method reported by the gateway.
    pub payment_method: Option<String>,
    /// Gateway-side reference.
    pub gateway_reference: Option<String>,
    /// Commission rate applied at completion, basis points.
    pub commission_rate_bps: Option<i32>,
    /// Platform share, frozen at completion.
    pub commission_amount: Option<i64>,
    /// Provider share, frozen at completion.
    pub provider_amount: Option<i64>,
    /// Sum of all refunds applied so far.
    pub total_refunded_amount: i64,
    /// Processor failure reason.
    pub failure_reason: Option<String>,
    /// When funds were captured.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the last attempt failed.
    pub failed_at: Option<DateTime<Utc>>,
    /// When the last refund was applied.
    pub refunded_at: Option<DateTime<Utc>>,
    /// When the provider share was paid out.
    pub transferred_at: Option<DateTime<Utc>>,
    /// Payout reference.
    pub transfer_reference: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Amount still available for refunds.
    pub fn refundable_amount(&self) -> i64 {
        self.amount - self.total_refunded_amount
    }

    /// The frozen commission split, if the payment has completed.
    pub fn commission_split(&self) -> Option<CommissionSplit> {
        match (
            self.commission_rate_bps,
            self.commission_amount,
            self.provider_amount,
        ) {
            (Some(rate_bps), Some(commission_amount), Some(provider_amount)) => {
                Some(CommissionSplit {
                    rate_bps,
                    commission_amount,
                    provider_amount,
                })
            }
            _ => None,
        }
    }

    /// Completed, untransferred, and not refunded at all.
    pub fn is_awaiting_transfer(&self) -> bool {
        self.status == PaymentStatus::Completed && self.transferred_at.is_none()
    }
}

/// Data required to initiate a payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    /// Payment ID.
    pub id: PaymentId,
    /// The booking.
    pub booking_id: BookingId,
    /// Paying traveler.
    pub traveler_id: UserId,
    /// Receiving provider.
    pub provider_id: UserId,
    /// Amount, minor units.
    pub amount: i64,
    /// ISO-4217 currency code.
    pub currency: String,
    /// What is being paid for.
    pub payment_type: PaymentType,
    /// Payment method reported by the gateway.
    pub payment_method: Option<String>,
    /// Gateway-side reference.
    pub gateway_reference: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl NewPayment {
    /// Materialize the pending payment row.
    pub fn into_payment(self) -> Payment {
        Payment {
            id: self.id,
            booking_id: self.booking_id,
            traveler_id: self.traveler_id,
            provider_id: self.provider_id,
            amount: self.amount,
            currency: self.currency,
            status: PaymentStatus::Pending,
            payment_type: self.payment_type,
            payment_method: self.payment_method,
            gateway_reference: self.gateway_reference,
            commission_rate_bps: None,
            commission_amount: None,
            provider_amount: None,
            total_refunded_amount: 0,
            failure_reason: None,
            completed_at: None,
            failed_at: None,
            refunded_at: None,
            transferred_at: None,
            transfer_reference: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
