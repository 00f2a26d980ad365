//! Inbound dispute requests.

use serde::{Deserialize, Serialize};
use validator::Validate;

use wayfare_entity::dispute::ResolutionType;

/// Request to open a dispute. `R` is the reason enum of the dispute kind.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct OpenDisputeRequest<R> {
    /// Enumerated reason.
    pub reason: R,
    /// What went wrong.
    #[validate(length(min = 10, max = 5000))]
    pub description: String,
    /// References to uploaded evidence.
    #[serde(default)]
    #[validate(length(max = 20))]
    pub evidence: Vec<String>,
}

impl<R> OpenDisputeRequest<R> {
    /// A request without evidence.
    pub fn new(reason: R, description: impl Into<String>) -> Self {
        Self {
            reason,
            description: description.into(),
            evidence: Vec::new(),
        }
    }
}

/// Request to settle a dispute.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveDisputeRequest {
    /// How the dispute is settled.
    pub resolution_type: ResolutionType,
    /// Notes for the record.
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub notes: Option<String>,
    /// Amount to refund. Required exactly when the resolution implies one.
    #[serde(default)]
    pub refund_amount: Option<i64>,
}
