//! Inbound booking requests.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use wayfare_core::types::id::ExperienceId;

/// Request to book an experience on a date.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateBookingRequest {
    /// The experience to book.
    pub experience_id: ExperienceId,
    /// The slot date.
    pub booking_date: NaiveDate,
    /// Optional start time.
    #[serde(default)]
    pub booking_time: Option<NaiveTime>,
    /// Participants to reserve.
    #[validate(range(min = 1, message = "At least one participant is required"))]
    pub participants_count: i32,
    /// Payment method the traveler intends to use.
    #[serde(default)]
    #[validate(length(min = 1, max = 50))]
    pub payment_method: Option<String>,
    /// Requests for the provider.
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub special_requests: Option<String>,
    /// Caller-supplied metadata, stored verbatim.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl CreateBookingRequest {
    /// A request with only the required fields set.
    pub fn new(experience_id: ExperienceId, booking_date: NaiveDate, participants_count: i32) -> Self {
        Self {
            experience_id,
            booking_date,
            booking_time: None,
            participants_count,
            payment_method: None,
            special_requests: None,
            metadata: None,
        }
    }
}
