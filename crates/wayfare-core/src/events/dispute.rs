//! Dispute resolution events.

use serde::{Deserialize, Serialize};

use crate::types::id::DisputeId;

/// What a dispute is raised against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeSubject {
    /// A booking dispute.
    Booking,
    /// A payment dispute (chargeback).
    Payment,
}

/// Events emitted as disputes move through their lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DisputeEvent {
    /// A dispute was opened.
    Opened {
        /// The dispute.
        dispute_id: DisputeId,
        /// What it targets.
        subject: DisputeSubject,
        /// The disputed booking or payment.
        target_id: uuid::Uuid,
    },
    /// An administrator started reviewing the dispute.
    ReviewStarted {
        /// The dispute.
        dispute_id: DisputeId,
        /// What it targets.
        subject: DisputeSubject,
    },
    /// The dispute was resolved.
    Resolved {
        /// The dispute.
        dispute_id: DisputeId,
        /// What it targets.
        subject: DisputeSubject,
        /// Resolution type as recorded.
        resolution_type: String,
        /// Refund issued as part of the resolution, minor units.
        refund_amount: Option<i64>,
    },
    /// The dispute was closed.
    Closed {
        /// The dispute.
        dispute_id: DisputeId,
        /// What it targets.
        subject: DisputeSubject,
    },
}

impl DisputeEvent {
    /// Dotted event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opened { .. } => "dispute.opened",
            Self::ReviewStarted { .. } => "dispute.review_started",
            Self::Resolved { .. } => "dispute.resolved",
            Self::Closed { .. } => "dispute.closed",
        }
    }
}
