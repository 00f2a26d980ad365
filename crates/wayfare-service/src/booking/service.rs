//! Booking lifecycle service.

use std::sync::Arc;

use chrono::Duration;
use tracing::{info, warn};
use validator::Validate;

use wayfare_core::clock::Clock;
use wayfare_core::config::BookingConfig;
use wayfare_core::error::{AppError, ErrorKind};
use wayfare_core::events::BookingEvent;
use wayfare_core::traits::EventPublisher;
use wayfare_core::types::id::{BookingId, UserId};
use wayfare_core::types::pagination::{PageRequest, PageResponse};
use wayfare_database::store::BookingStore;
use wayfare_entity::booking::{
    Booking, BookingPaymentStatus, BookingStatus, BookingTransition, NewBooking,
};

use super::request::CreateBookingRequest;
use crate::capacity::{CapacityLedger, Reservation};
use crate::context::RequestContext;
use crate::events::EventSink;

/// Reason recorded on bookings cancelled by the expiry job.
pub const EXPIRY_REASON: &str = "Payment not received in time";

/// Creates bookings and drives them through their lifecycle.
#[derive(Debug, Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingStore>,
    ledger: Arc<CapacityLedger>,
    events: EventSink,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
}

impl BookingService {
    /// Creates a new booking service.
    pub fn new(
        bookings: Arc<dyn BookingStore>,
        ledger: Arc<CapacityLedger>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        Self {
            bookings,
            ledger,
            events: EventSink::new(publisher, clock.clone()),
            clock,
            config,
        }
    }

    /// Books an experience for the acting traveler.
    ///
    /// The price is read once and frozen into `total_amount`. A transient
    /// store conflict is retried exactly once; business rejections are not.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateBookingRequest,
    ) -> Result<Booking, AppError> {
        req.validate()?;
        let traveler_id = ctx.require_user()?;

        if req.participants_count > self.config.max_participants_per_booking {
            return Err(AppError::new(
                ErrorKind::AboveMaximumParticipants,
                format!(
                    "At most {} participants may be booked at once",
                    self.config.max_participants_per_booking
                ),
            ));
        }
        if req.booking_date < self.clock.today() {
            return Err(AppError::validation("Booking date is in the past"));
        }

        let experience = self.ledger.experience(req.experience_id).await?;
        CapacityLedger::check_bookable(&experience, req.participants_count)?;

        let total_amount = experience
            .price
            .checked_mul(i64::from(req.participants_count))
            .ok_or_else(|| AppError::validation("Booking total overflows"))?;

        let new_booking = NewBooking {
            id: BookingId::new(),
            experience_id: experience.id,
            traveler_id,
            provider_id: experience.provider_id,
            booking_date: req.booking_date,
            booking_time: req.booking_time,
            participants_count: req.participants_count,
            unit_price: experience.price,
            total_amount,
            currency: experience.currency.clone(),
            payment_method: req.payment_method,
            special_requests: req.special_requests,
            metadata: req.metadata.unwrap_or_else(|| serde_json::json!({})),
            created_at: self.clock.now(),
        };

        let Reservation { booking, token } =
            match self.ledger.reserve(&experience, &new_booking).await {
                Err(e) if e.is_transient() => {
                    warn!(
                        experience_id = %new_booking.experience_id,
                        error = %e,
                        "Reservation conflicted, retrying once"
                    );
                    self.ledger.reserve(&experience, &new_booking).await?
                }
                other => other?,
            };

        if let Err(e) = self.ledger.record_booking(booking.experience_id).await {
            warn!(booking_id = %booking.id, error = %e, "Failed to bump experience bookings count");
        }

        info!(
            booking_id = %booking.id,
            booking_number = booking.booking_number,
            traveler_id = %traveler_id,
            remaining = token.remaining,
            "Booking created"
        );
        self.events
            .emit(
                Some(traveler_id),
                BookingEvent::Created {
                    booking_id: booking.id,
                    experience_id: booking.experience_id,
                    traveler_id,
                    provider_id: booking.provider_id,
                    booking_date: booking.booking_date,
                    participants: booking.participants_count,
                    total_amount: booking.total_amount,
                },
            )
            .await;

        Ok(booking)
    }

    /// Loads a booking visible to the actor.
    pub async fn get(&self, ctx: &RequestContext, id: BookingId) -> Result<Booking, AppError> {
        let booking = self.load(id).await?;
        Self::authorize_view(ctx, &booking)?;
        Ok(booking)
    }

    /// Loads a booking by its human-facing number.
    pub async fn get_by_number(
        &self,
        ctx: &RequestContext,
        booking_number: i64,
    ) -> Result<Booking, AppError> {
        let booking = self
            .bookings
            .find_by_number(booking_number)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking #{booking_number} not found")))?;
        Self::authorize_view(ctx, &booking)?;
        Ok(booking)
    }

    /// Bookings made by a traveler (the traveler themselves or an admin).
    pub async fn list_for_traveler(
        &self,
        ctx: &RequestContext,
        traveler_id: UserId,
        page: PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        if !(ctx.is_user(traveler_id) || ctx.is_privileged()) {
            return Err(AppError::forbidden("Cannot list another traveler's bookings"));
        }
        self.bookings.list_by_traveler(traveler_id, &page).await
    }

    /// Bookings on a provider's experiences (the provider or an admin).
    pub async fn list_for_provider(
        &self,
        ctx: &RequestContext,
        provider_id: UserId,
        page: PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        if !(ctx.is_user(provider_id) || ctx.is_privileged()) {
            return Err(AppError::forbidden("Cannot list another provider's bookings"));
        }
        self.bookings.list_by_provider(provider_id, &page).await
    }

    /// Cancels a pending or confirmed booking and frees its seats.
    ///
    /// Only the traveler who booked it or an admin may cancel. A paid
    /// booking keeps its payment; refunds are issued separately.
    pub async fn cancel(
        &self,
        ctx: &RequestContext,
        id: BookingId,
        reason: Option<String>,
    ) -> Result<Booking, AppError> {
        let booking = self.load(id).await?;
        if !(ctx.is_admin() || ctx.user_id.is_some_and(|u| booking.is_owned_by(u))) {
            return Err(AppError::forbidden("Only the traveler or an admin may cancel"));
        }
        if !booking.status.can_be_cancelled() {
            return Err(AppError::not_cancellable(format!(
                "Booking {} is {} and cannot be cancelled",
                booking.id, booking.status
            )));
        }

        let transition = BookingTransition::new(&booking, BookingStatus::Cancelled, self.clock.now())
            .by(ctx.user_id)
            .with_reason(reason);
        self.apply(transition).await
    }

    /// Confirms a pending booking.
    pub async fn confirm(&self, ctx: &RequestContext, id: BookingId) -> Result<Booking, AppError> {
        let booking = self.load(id).await?;
        Self::authorize_operate(ctx, &booking)?;
        let transition = BookingTransition::new(&booking, BookingStatus::Confirmed, self.clock.now())
            .by(ctx.user_id);
        self.apply(transition).await
    }

    /// Marks a confirmed booking as having taken place. Not before its date.
    pub async fn complete(&self, ctx: &RequestContext, id: BookingId) -> Result<Booking, AppError> {
        let booking = self.load(id).await?;
        Self::authorize_operate(ctx, &booking)?;
        if booking.booking_date > self.clock.today() {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!(
                    "Booking {} cannot be completed before {}",
                    booking.id, booking.booking_date
                ),
            ));
        }
        let transition = BookingTransition::new(&booking, BookingStatus::Completed, self.clock.now())
            .by(ctx.user_id);
        self.apply(transition).await
    }

    /// Administrative status override, still bound by the transition table.
    pub async fn update_status(
        &self,
        ctx: &RequestContext,
        id: BookingId,
        status: BookingStatus,
        reason: Option<String>,
    ) -> Result<Booking, AppError> {
        ctx.require_admin()?;
        let booking = self.load(id).await?;
        let mut transition = BookingTransition::new(&booking, status, self.clock.now())
            .by(ctx.user_id)
            .with_reason(reason);
        if status == BookingStatus::Refunded {
            transition = transition.with_payment_status(BookingPaymentStatus::Refunded);
        }
        self.apply(transition).await
    }

    /// Soft-deletes a booking in a terminal status.
    pub async fn archive(&self, ctx: &RequestContext, id: BookingId) -> Result<Booking, AppError> {
        ctx.require_admin()?;
        let booking = self.load(id).await?;
        if !booking.status.is_terminal() {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Booking {} is {} and cannot be archived", id, booking.status),
            ));
        }
        let archived = self
            .bookings
            .soft_delete(id, self.clock.now())
            .await?
            .ok_or_else(|| AppError::conflict(format!("Booking {id} changed concurrently")))?;
        info!(booking_id = %id, "Booking archived");
        Ok(archived)
    }

    /// Succeeds when `traveler_id` may review the experience of this booking.
    pub async fn ensure_reviewable(
        &self,
        id: BookingId,
        traveler_id: UserId,
    ) -> Result<Booking, AppError> {
        let booking = self.load(id).await?;
        if !booking.is_owned_by(traveler_id) {
            return Err(AppError::forbidden("Only the traveler may review this booking"));
        }
        if booking.status != BookingStatus::Completed {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Booking {} is {}, not completed", id, booking.status),
            ));
        }
        Ok(booking)
    }

    /// Cancels pending bookings older than the configured expiry window.
    /// Returns how many were expired; does nothing when expiry is disabled.
    pub async fn expire_stale_pending(&self, batch_size: i64) -> Result<usize, AppError> {
        let Some(minutes) = self.config.pending_expiry_minutes else {
            return Ok(0);
        };
        let minutes = i64::try_from(minutes)
            .map_err(|_| AppError::configuration("pending_expiry_minutes is too large"))?;
        let cutoff = self.clock.now() - Duration::minutes(minutes);

        let mut expired = 0;
        for booking in self.bookings.find_stale_pending(cutoff, batch_size).await? {
            let transition =
                BookingTransition::new(&booking, BookingStatus::Cancelled, self.clock.now())
                    .with_reason(Some(EXPIRY_REASON.to_string()));
            match self
                .commit(transition, BookingEvent::Expired { booking_id: booking.id })
                .await
            {
                Ok(_) => expired += 1,
                // Paid or cancelled in the meantime.
                Err(e) if e.is_transient() => {
                    info!(booking_id = %booking.id, "Skipped expiry, booking moved on")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(expired)
    }

    /// Completes confirmed bookings whose date is at least the configured
    /// number of days in the past. Does nothing when disabled.
    pub async fn complete_due(&self, batch_size: i64) -> Result<usize, AppError> {
        let Some(days) = self.config.auto_complete_after_days else {
            return Ok(0);
        };
        let due_by = self.clock.today() - Duration::days(i64::from(days));

        let mut completed = 0;
        for booking in self.bookings.find_completable(due_by, batch_size).await? {
            let transition =
                BookingTransition::new(&booking, BookingStatus::Completed, self.clock.now());
            match self.apply(transition).await {
                Ok(_) => completed += 1,
                Err(e) if e.is_transient() => {
                    info!(booking_id = %booking.id, "Skipped completion, booking moved on")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(completed)
    }

    /// Load a live booking or fail with `NotFound`.
    pub(crate) async fn load(&self, id: BookingId) -> Result<Booking, AppError> {
        self.bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking {id} not found")))
    }

    /// Set the mirrored payment status without a lifecycle change.
    pub(crate) async fn set_payment_status(
        &self,
        booking: &Booking,
        payment_status: BookingPaymentStatus,
    ) -> Result<Booking, AppError> {
        self.bookings
            .set_payment_status(booking.id, payment_status, self.clock.now())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking {} not found", booking.id)))
    }

    /// Check the table, compare-and-swap, and emit the matching event.
    pub(crate) async fn apply(&self, transition: BookingTransition) -> Result<Booking, AppError> {
        let event = lifecycle_event(&transition)
            .ok_or_else(|| AppError::invalid_transition(transition.from, transition.to))?;
        self.commit(transition, event).await
    }

    async fn commit(
        &self,
        transition: BookingTransition,
        event: BookingEvent,
    ) -> Result<Booking, AppError> {
        if !transition.from.can_transition_to(transition.to) {
            return Err(AppError::invalid_transition(transition.from, transition.to));
        }

        let updated = self
            .bookings
            .apply_transition(&transition)
            .await?
            .ok_or_else(|| {
                AppError::conflict(format!(
                    "Booking {} is no longer {}",
                    transition.booking_id, transition.from
                ))
            })?;

        info!(
            booking_id = %updated.id,
            from = %transition.from,
            to = %transition.to,
            released = transition.releases_capacity(),
            "Booking status changed"
        );
        self.events.emit(transition.actor_id, event).await;
        Ok(updated)
    }

    fn authorize_view(ctx: &RequestContext, booking: &Booking) -> Result<(), AppError> {
        let involved = ctx
            .user_id
            .is_some_and(|u| booking.is_owned_by(u) || booking.is_provided_by(u));
        if involved || ctx.is_privileged() {
            Ok(())
        } else {
            Err(AppError::forbidden("Not a party to this booking"))
        }
    }

    fn authorize_operate(ctx: &RequestContext, booking: &Booking) -> Result<(), AppError> {
        if ctx.is_privileged() || ctx.user_id.is_some_and(|u| booking.is_provided_by(u)) {
            Ok(())
        } else {
            Err(AppError::forbidden(
                "Only the provider or an admin may change this booking",
            ))
        }
    }
}

/// The event a transition publishes. Nothing moves into `pending`.
fn lifecycle_event(transition: &BookingTransition) -> Option<BookingEvent> {
    let booking_id = transition.booking_id;
    let event = match transition.to {
        BookingStatus::Confirmed if transition.from == BookingStatus::Disputed => {
            BookingEvent::Reinstated { booking_id }
        }
        BookingStatus::Confirmed => BookingEvent::Confirmed { booking_id },
        BookingStatus::Cancelled => BookingEvent::Cancelled {
            booking_id,
            reason: transition.reason.clone(),
        },
        BookingStatus::Completed => BookingEvent::Completed { booking_id },
        BookingStatus::Disputed => BookingEvent::Disputed { booking_id },
        BookingStatus::Refunded => BookingEvent::Refunded { booking_id },
        BookingStatus::Pending => return None,
    };
    Some(event)
}
