//! A compare-and-swap payment status change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wayfare_core::types::id::PaymentId;

use super::commission::CommissionSplit;
use super::model::Payment;
use super::status::PaymentStatus;

/// A payment status change that only applies while the payment is in `from`.
///
/// Refunds do not go through here; they are applied with a cumulative
/// conditional update of their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransition {
    /// Target payment.
    pub payment_id: PaymentId,
    /// Status the caller observed.
    pub from: PaymentStatus,
    /// Status to move to.
    pub to: PaymentStatus,
    /// Transition instant.
    pub at: DateTime<Utc>,
    /// Commission split frozen on completion.
    pub split: Option<CommissionSplit>,
    /// Gateway reference recorded when processing starts.
    pub gateway_reference: Option<String>,
    /// Failure reason recorded on failure.
    pub failure_reason: Option<String>,
}

impl PaymentTransition {
    /// Creates a bare transition.
    pub fn new(payment: &Payment, to: PaymentStatus, at: DateTime<Utc>) -> Self {
        Self {
            payment_id: payment.id,
            from: payment.status,
            to,
            at,
            split: None,
            gateway_reference: None,
            failure_reason: None,
        }
    }
}

impl Payment {
    /// Applies a transition in place. The caller has already checked that
    /// `self.status == t.from`.
    pub fn apply_transition(&mut self, t: &PaymentTransition) {
        self.status = t.to;
        self.updated_at = t.at;
        if let Some(reference) = &t.gateway_reference {
            self.gateway_reference = Some(reference.clone());
        }
        match t.to {
            PaymentStatus::Completed => {
                self.completed_at = Some(t.at);
                self.failure_reason = None;
                if let Some(split) = t.split {
                    self.commission_rate_bps = Some(split.rate_bps);
                    self.commission_amount = Some(split.commission_amount);
                    self.provider_amount = Some(split.provider_amount);
                }
            }
            PaymentStatus::Failed => {
                self.failed_at = Some(t.at);
                self.failure_reason = t.failure_reason.clone();
            }
            _ => {}
        }
    }
}
