//! Dispute statuses, resolution types, and their transition tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a booking dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "dispute_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    /// Raised, not yet looked at.
    Open,
    /// An admin is reviewing it.
    InReview,
    /// A resolution was recorded.
    Resolved,
    /// Archived. Terminal.
    Closed,
}

/// Every legal booking-dispute transition.
pub const BOOKING_DISPUTE_TRANSITIONS: &[(DisputeStatus, DisputeStatus)] = &[
    (DisputeStatus::Open, DisputeStatus::InReview),
    (DisputeStatus::Open, DisputeStatus::Resolved),
    (DisputeStatus::InReview, DisputeStatus::Resolved),
    (DisputeStatus::Resolved, DisputeStatus::Closed),
];

impl DisputeStatus {
    /// All statuses.
    pub const ALL: [Self; 4] = [Self::Open, Self::InReview, Self::Resolved, Self::Closed];

    /// Whether `self -> to` appears in [`BOOKING_DISPUTE_TRANSITIONS`].
    pub fn can_transition_to(self, to: Self) -> bool {
        BOOKING_DISPUTE_TRANSITIONS.contains(&(self, to))
    }

    /// Still awaiting a resolution.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::InReview)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InReview => "in_review",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status of a payment dispute. Adds the chargeback outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_dispute_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentDisputeStatus {
    /// Raised, not yet looked at.
    Open,
    /// An admin is reviewing it.
    InReview,
    /// Settled without a win/lose verdict.
    Resolved,
    /// The platform kept the funds.
    Won,
    /// The funds were charged back.
    Lost,
    /// Archived. Terminal.
    Closed,
}

/// Every legal payment-dispute transition.
pub const PAYMENT_DISPUTE_TRANSITIONS: &[(PaymentDisputeStatus, PaymentDisputeStatus)] = &[
    (PaymentDisputeStatus::Open, PaymentDisputeStatus::InReview),
    (PaymentDisputeStatus::Open, PaymentDisputeStatus::Resolved),
    (PaymentDisputeStatus::Open, PaymentDisputeStatus::Won),
    (PaymentDisputeStatus::Open, PaymentDisputeStatus::Lost),
    (PaymentDisputeStatus::InReview, PaymentDisputeStatus::Resolved),
    (PaymentDisputeStatus::InReview, PaymentDisputeStatus::Won),
    (PaymentDisputeStatus::InReview, PaymentDisputeStatus::Lost),
    (PaymentDisputeStatus::Resolved, PaymentDisputeStatus::Closed),
    (PaymentDisputeStatus::Won, PaymentDisputeStatus::Closed),
    (PaymentDisputeStatus::Lost, PaymentDisputeStatus::Closed),
];

impl PaymentDisputeStatus {
    /// All statuses.
    pub const ALL: [Self; 6] = [
        Self::Open,
        Self::InReview,
        Self::Resolved,
        Self::Won,
        Self::Lost,
        Self::Closed,
    ];

    /// Whether `self -> to` appears in [`PAYMENT_DISPUTE_TRANSITIONS`].
    pub fn can_transition_to(self, to: Self) -> bool {
        PAYMENT_DISPUTE_TRANSITIONS.contains(&(self, to))
    }

    /// Still awaiting a resolution.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Open | Self::InReview)
    }

    /// Outcome status recorded for a given resolution.
    pub fn outcome_of(resolution: ResolutionType) -> Self {
        match resolution {
            ResolutionType::Chargeback => Self::Lost,
            ResolutionType::NoAction => Self::Won,
            _ => Self::Resolved,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InReview => "in_review",
            Self::Resolved => "resolved",
            Self::Won => "won",
            Self::Lost => "lost",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PaymentDisputeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a dispute was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "resolution_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ResolutionType {
    /// Return the disputed amount to the traveler.
    Refund,
    /// Return part of it.
    PartialRefund,
    /// The card issuer reversed the charge.
    Chargeback,
    /// Compensate with platform credit.
    Credit,
    /// Dismiss the dispute.
    NoAction,
}

impl ResolutionType {
    /// Resolutions that move money back through the payment and therefore
    /// require a refund amount.
    pub fn implies_refund(self) -> bool {
        matches!(self, Self::Refund | Self::PartialRefund | Self::Chargeback)
    }

    /// Return the resolution as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refund => "refund",
            Self::PartialRefund => "partial_refund",
            Self::Chargeback => "chargeback",
            Self::Credit => "credit",
            Self::NoAction => "no_action",
        }
    }
}

impl fmt::Display for ResolutionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
