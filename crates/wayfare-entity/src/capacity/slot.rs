//! Per-(experience, date) capacity counter.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use wayfare_core::types::id::ExperienceId;

/// Identifies one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    /// The experience.
    pub experience_id: ExperienceId,
    /// The calendar date.
    pub booking_date: NaiveDate,
}

impl SlotKey {
    /// Creates a slot key.
    pub fn new(experience_id: ExperienceId, booking_date: NaiveDate) -> Self {
        Self {
            experience_id,
            booking_date,
        }
    }
}

/// Running participant total of the capacity-holding bookings in a slot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CapacitySlot {
    /// The experience.
    pub experience_id: ExperienceId,
    /// The calendar date.
    pub booking_date: NaiveDate,
    /// Participants currently held.
    pub reserved_participants: i32,
    /// Last change to the counter.
    pub updated_at: DateTime<Utc>,
}

impl CapacitySlot {
    /// The slot's key.
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.experience_id, self.booking_date)
    }

    /// Remaining room against `max_participants`, never negative.
    pub fn remaining(&self, max_participants: i32) -> i32 {
        (max_participants - self.reserved_participants).max(0)
    }
}

/// A slot whose counter disagreed with its bookings and was repaired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDrift {
    /// The repaired slot.
    pub key: SlotKey,
    /// Counter value before repair.
    pub recorded: i32,
    /// Sum recomputed from bookings.
    pub actual: i32,
}
