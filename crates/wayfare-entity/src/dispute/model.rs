//! Dispute entity models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use wayfare_core::types::id::{BookingId, DisputeId, PaymentId, UserId};

use super::status::{DisputeStatus, PaymentDisputeStatus, ResolutionType};

/// Why a traveler or provider disputes a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_dispute_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingDisputeReason {
    /// The experience differed materially from its listing.
    NotAsDescribed,
    /// The provider did not show up.
    ProviderNoShow,
    /// The traveler did not show up.
    TravelerNoShow,
    /// Safety concern during the experience.
    SafetyConcern,
    /// Anything else.
    Other,
}

/// Why a payment is disputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_dispute_reason", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentDisputeReason {
    /// The traveler did not authorize the charge.
    Unauthorized,
    /// Charged more than once.
    Duplicate,
    /// Charged the wrong amount.
    IncorrectAmount,
    /// Paid for a service never delivered.
    ServiceNotProvided,
    /// Anything else.
    Other,
}

/// A dispute against a booking.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingDispute {
    /// Dispute ID.
    pub id: DisputeId,
    /// Disputed booking.
    pub booking_id: BookingId,
    /// Who raised it.
    pub initiated_by: UserId,
    /// Enumerated reason.
    pub reason: BookingDisputeReason,
    /// Free-form description.
    pub description: String,
    /// Opaque evidence references.
    pub evidence: serde_json::Value,
    /// Current status.
    pub status: DisputeStatus,
    /// How it was settled.
    pub resolution_type: Option<ResolutionType>,
    /// Resolver notes.
    pub resolution_notes: Option<String>,
    /// Amount refunded by the resolution.
    pub refund_amount: Option<i64>,
    /// Admin who started the review.
    pub reviewed_by: Option<UserId>,
    /// Admin who resolved it.
    pub resolved_by: Option<UserId>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Closure time.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// A dispute against a payment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentDispute {
    /// Dispute ID.
    pub id: DisputeId,
    /// Disputed payment.
    pub payment_id: PaymentId,
    /// Who raised it.
    pub initiated_by: UserId,
    /// Enumerated reason.
    pub reason: PaymentDisputeReason,
    /// Free-form description.
    pub description: String,
    /// Opaque evidence references.
    pub evidence: serde_json::Value,
    /// Current status.
    pub status: PaymentDisputeStatus,
    /// How it was settled.
    pub resolution_type: Option<ResolutionType>,
    /// Resolver notes.
    pub resolution_notes: Option<String>,
    /// Amount refunded by the resolution.
    pub refund_amount: Option<i64>,
    /// Admin who started the review.
    pub reviewed_by: Option<UserId>,
    /// Admin who resolved it.
    pub resolved_by: Option<UserId>,
    /// Resolution time.
    pub resolved_at: Option<DateTime<Utc>>,
    /// Closure time.
    pub closed_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Fields shared by both dispute kinds at creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDispute<R> {
    /// Dispute ID.
    pub id: DisputeId,
    /// Who raised it.
    pub initiated_by: UserId,
    /// Enumerated reason.
    pub reason: R,
    /// Free-form description.
    pub description: String,
    /// Opaque evidence references.
    pub evidence: Vec<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl NewDispute<BookingDisputeReason> {
    /// Materialize an open booking dispute.
    pub fn into_booking_dispute(self, booking_id: BookingId) -> BookingDispute {
        BookingDispute {
            id: self.id,
            booking_id,
            initiated_by: self.initiated_by,
            reason: self.reason,
            description: self.description,
            evidence: serde_json::Value::from(self.evidence),
            status: DisputeStatus::Open,
            resolution_type: None,
            resolution_notes: None,
            refund_amount: None,
            reviewed_by: None,
            resolved_by: None,
            resolved_at: None,
            closed_at: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

impl NewDispute<PaymentDisputeReason> {
    /// Materialize an open payment dispute.
    pub fn into_payment_dispute(self, payment_id: PaymentId) -> PaymentDispute {
        PaymentDispute {
            id: self.id,
            payment_id,
            initiated_by: self.initiated_by,
            reason: self.reason,
            description: self.description,
            evidence: serde_json::Value::from(self.evidence),
            status: PaymentDisputeStatus::Open,
            resolution_type: None,
            resolution_notes: None,
            refund_amount: None,
            reviewed_by: None,
            resolved_by: None,
            resolved_at: None,
            closed_at: None,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Resolution details recorded when a dispute is settled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeResolution {
    /// How it was settled.
    pub resolution_type: ResolutionType,
    /// Resolver notes.
    pub notes: Option<String>,
    /// Amount refunded, when the resolution implies a refund.
    pub refund_amount: Option<i64>,
    /// Admin who resolved it.
    pub resolved_by: UserId,
}

/// A dispute status change that only applies while the dispute is in `from`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisputeUpdate<S> {
    /// Target dispute.
    pub dispute_id: DisputeId,
    /// Status the caller observed.
    pub from: S,
    /// Status to move to.
    pub to: S,
    /// Change instant.
    pub at: DateTime<Utc>,
    /// Reviewer, set when review starts.
    pub reviewed_by: Option<UserId>,
    /// Resolution, set when the dispute is settled.
    pub resolution: Option<DisputeResolution>,
}

impl<S> DisputeUpdate<S> {
    /// Creates a bare status change.
    pub fn new(dispute_id: DisputeId, from: S, to: S, at: DateTime<Utc>) -> Self {
        Self {
            dispute_id,
            from,
            to,
            at,
            reviewed_by: None,
            resolution: None,
        }
    }
}

macro_rules! impl_apply_update {
    ($entity:ty, $status:ty) => {
        impl $entity {
            /// Applies a status change in place. The caller has already
            /// checked that `self.status == update.from`.
            pub fn apply_update(&mut self, update: &DisputeUpdate<$status>) {
                self.status = update.to;
                self.updated_at = update.at;
                if update.reviewed_by.is_some() {
                    self.reviewed_by = update.reviewed_by;
                }
                if let Some(resolution) = &update.resolution {
                    self.resolution_type = Some(resolution.resolution_type);
                    self.resolution_notes = resolution.notes.clone();
                    self.refund_amount = resolution.refund_amount;
                    self.resolved_by = Some(resolution.resolved_by);
                    self.resolved_at = Some(update.at);
                }
                if update.to == <$status>::Closed {
                    self.closed_at = Some(update.at);
                }
            }
        }
    };
}

impl_apply_update!(BookingDispute, DisputeStatus);
impl_apply_update!(PaymentDispute, PaymentDisputeStatus);
