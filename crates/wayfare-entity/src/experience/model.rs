//! Experience entity as exposed by the external catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use wayfare_core::types::id::{ExperienceId, UserId};

/// Moderation status of an experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "experience_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExperienceStatus {
    /// Being written by the provider.
    Draft,
    /// Submitted for moderation.
    PendingReview,
    /// Live and bookable.
    Approved,
    /// Refused by moderation.
    Rejected,
    /// Withdrawn from sale.
    Archived,
}

/// A bookable experience.
///
/// Owned by the catalog service; the engine only reads capacity, price, and
/// status, and bumps `bookings_count`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Experience {
    /// Experience ID.
    pub id: ExperienceId,
    /// The provider running the experience.
    pub provider_id: UserId,
    /// Display title.
    pub title: String,
    /// Price per participant, minor units.
    pub price: i64,
    /// ISO-4217 currency code.
    pub currency: String,
    /// Smallest group that can be booked.
    pub min_participants: i32,
    /// Participant capacity of a single date.
    pub max_participants: i32,
    /// Moderation status.
    pub status: ExperienceStatus,
    /// Number of bookings ever made.
    pub bookings_count: i64,
    /// When the experience was created.
    pub created_at: DateTime<Utc>,
    /// When the experience was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Experience {
    /// Only approved experiences accept bookings.
    pub fn is_bookable(&self) -> bool {
        self.status == ExperienceStatus::Approved
    }
}
