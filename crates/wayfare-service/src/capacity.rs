//! Capacity ledger: availability checks, atomic reservations, and slot
//! reconciliation.
//!
//! The ledger never keeps its own counters; every decision is delegated to
//! the [`BookingStore`] so that PostgreSQL row locks (or the memory
//! backend's mutex) are the single point of serialization per slot.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use wayfare_core::clock::Clock;
use wayfare_core::error::{AppError, ErrorKind};
use wayfare_core::types::id::{BookingId, ExperienceId};
use wayfare_database::store::{BookingStore, ExperienceCatalog, ReserveOutcome};
use wayfare_entity::booking::{Booking, NewBooking};
use wayfare_entity::capacity::{SlotDrift, SlotKey};
use wayfare_entity::experience::Experience;

/// Answer to an availability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    /// The experience.
    pub experience_id: ExperienceId,
    /// The date asked about.
    pub booking_date: NaiveDate,
    /// Participants asked about.
    pub requested: i32,
    /// Whether a booking of `requested` participants would be accepted now.
    pub available: bool,
    /// Participant capacity per date.
    pub max_participants: i32,
    /// Participants currently held.
    pub reserved: i32,
    /// Room left.
    pub remaining: i32,
    /// Why `available` is false.
    pub unavailable_reason: Option<ErrorKind>,
}

/// Proof that seats were taken for a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationToken {
    /// The experience.
    pub experience_id: ExperienceId,
    /// The slot date.
    pub booking_date: NaiveDate,
    /// Seats taken.
    pub participants: i32,
    /// The booking holding them.
    pub booking_id: BookingId,
    /// Room left in the slot right after the reservation.
    pub remaining: i32,
}

/// A booking together with the seats it holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// The persisted pending booking.
    pub booking: Booking,
    /// The seats it holds.
    pub token: ReservationToken,
}

/// Result of one reconciliation sweep.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Slots examined.
    pub checked: usize,
    /// Slots whose counter was repaired.
    pub repaired: Vec<SlotDrift>,
}

/// The capacity ledger.
#[derive(Debug, Clone)]
pub struct CapacityLedger {
    bookings: Arc<dyn BookingStore>,
    catalog: Arc<dyn ExperienceCatalog>,
    clock: Arc<dyn Clock>,
}

impl CapacityLedger {
    /// Creates a new capacity ledger.
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        catalog: Arc<dyn ExperienceCatalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            bookings,
            catalog,
            clock,
        }
    }

    /// Load an experience or fail with `NotFound`.
    pub async fn experience(&self, id: ExperienceId) -> Result<Experience, AppError> {
        self.catalog
            .find(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Experience {id} not found")))
    }

    /// Bump the experience's derived bookings count.
    pub async fn record_booking(&self, id: ExperienceId) -> Result<(), AppError> {
        self.catalog.record_booking(id).await
    }

    /// Reject requests the experience can never accept, whatever the slot
    /// state.
    pub fn check_bookable(experience: &Experience, participants: i32) -> Result<(), AppError> {
        if !experience.is_bookable() {
            return Err(AppError::new(
                ErrorKind::ExperienceNotBookable,
                format!("Experience {} is not open for booking", experience.id),
            ));
        }
        if participants < experience.min_participants {
            return Err(AppError::new(
                ErrorKind::BelowMinimumParticipants,
                format!(
                    "At least {} participants are required, got {participants}",
                    experience.min_participants
                ),
            ));
        }
        if participants > experience.max_participants {
            return Err(AppError::new(
                ErrorKind::AboveMaximumParticipants,
                format!(
                    "At most {} participants are allowed, got {participants}",
                    experience.max_participants
                ),
            ));
        }
        Ok(())
    }

    /// Whether `participants` seats are free on `date`.
    pub async fn check_availability(
        &self,
        experience_id: ExperienceId,
        booking_date: NaiveDate,
        participants: i32,
    ) -> Result<Availability, AppError> {
        let experience = self.experience(experience_id).await?;
        let reserved = self
            .bookings
            .find_slot(SlotKey::new(experience_id, booking_date))
            .await?
            .map(|slot| slot.reserved_participants)
            .unwrap_or(0);
        let remaining = (experience.max_participants - reserved).max(0);

        let unavailable_reason = match Self::check_bookable(&experience, participants) {
            Err(e) => Some(e.kind),
            Ok(()) if booking_date < self.clock.today() => Some(ErrorKind::Validation),
            Ok(()) if participants > remaining => Some(ErrorKind::CapacityExceeded),
            Ok(()) => None,
        };

        Ok(Availability {
            experience_id,
            booking_date,
            requested: participants,
            available: unavailable_reason.is_none(),
            max_participants: experience.max_participants,
            reserved,
            remaining,
            unavailable_reason,
        })
    }

    /// Take the booking's seats and persist it, atomically.
    pub async fn reserve(
        &self,
        experience: &Experience,
        booking: &NewBooking,
    ) -> Result<Reservation, AppError> {
        Self::check_bookable(experience, booking.participants_count)?;

        match self
            .bookings
            .reserve(booking, experience.max_participants)
            .await?
        {
            ReserveOutcome::Reserved { booking, slot } => {
                let remaining = slot.remaining(experience.max_participants);
                info!(
                    booking_id = %booking.id,
                    experience_id = %booking.experience_id,
                    booking_date = %booking.booking_date,
                    participants = booking.participants_count,
                    remaining,
                    "Capacity reserved"
                );
                let token = ReservationToken {
                    experience_id: booking.experience_id,
                    booking_date: booking.booking_date,
                    participants: booking.participants_count,
                    booking_id: booking.id,
                    remaining,
                };
                Ok(Reservation { booking, token })
            }
            ReserveOutcome::Insufficient { remaining } => {
                info!(
                    experience_id = %booking.experience_id,
                    booking_date = %booking.booking_date,
                    requested = booking.participants_count,
                    remaining,
                    "Reservation refused, slot full"
                );
                Err(AppError::capacity_exceeded(
                    booking.participants_count,
                    remaining,
                ))
            }
        }
    }

    /// Recompute every slot from today on from its capacity-holding
    /// bookings.
    pub async fn reconcile_slots(&self, batch_size: i64) -> Result<ReconcileReport, AppError> {
        let keys = self
            .bookings
            .list_slot_keys(self.clock.today(), batch_size)
            .await?;
        let mut report = ReconcileReport {
            checked: keys.len(),
            repaired: Vec::new(),
        };

        for key in keys {
            if let Some(drift) = self.bookings.reconcile_slot(key, self.clock.now()).await? {
                warn!(
                    experience_id = %drift.key.experience_id,
                    booking_date = %drift.key.booking_date,
                    recorded = drift.recorded,
                    actual = drift.actual,
                    "Slot drift repaired"
                );
                report.repaired.push(drift);
            }
        }

        Ok(report)
    }
}
