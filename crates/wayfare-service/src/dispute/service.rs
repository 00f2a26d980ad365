//! Dispute service.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use wayfare_core::clock::Clock;
use wayfare_core::error::{AppError, ErrorKind};
use wayfare_core::events::{DisputeEvent, dispute::DisputeSubject};
use wayfare_core::traits::EventPublisher;
use wayfare_core::types::id::{BookingId, DisputeId, PaymentId, UserId};
use wayfare_database::store::DisputeStore;
use wayfare_entity::booking::{BookingStatus, BookingTransition};
use wayfare_entity::dispute::{
    BookingDispute, BookingDisputeReason, DisputeResolution, DisputeStatus, DisputeUpdate,
    NewDispute, PaymentDispute, PaymentDisputeReason, PaymentDisputeStatus,
};

use super::request::{OpenDisputeRequest, ResolveDisputeRequest};
use crate::booking::BookingService;
use crate::context::RequestContext;
use crate::events::EventSink;
use crate::payment::PaymentService;

/// Either kind of dispute.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "subject", rename_all = "snake_case")]
pub enum Dispute {
    /// Raised against a booking.
    Booking(BookingDispute),
    /// Raised against a payment.
    Payment(PaymentDispute),
}

impl Dispute {
    /// Dispute ID.
    pub fn id(&self) -> DisputeId {
        match self {
            Self::Booking(d) => d.id,
            Self::Payment(d) => d.id,
        }
    }

    /// Who raised it.
    pub fn initiated_by(&self) -> UserId {
        match self {
            Self::Booking(d) => d.initiated_by,
            Self::Payment(d) => d.initiated_by,
        }
    }

    /// Still awaiting a resolution.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Booking(d) => d.status.is_active(),
            Self::Payment(d) => d.status.is_active(),
        }
    }

    fn subject(&self) -> DisputeSubject {
        match self {
            Self::Booking(_) => DisputeSubject::Booking,
            Self::Payment(_) => DisputeSubject::Payment,
        }
    }
}

/// Opens, reviews, resolves, and closes disputes.
#[derive(Debug, Clone)]
pub struct DisputeService {
    disputes: Arc<dyn DisputeStore>,
    bookings: BookingService,
    payments: PaymentService,
    events: EventSink,
    clock: Arc<dyn Clock>,
}

impl DisputeService {
    /// Creates a new dispute service.
    pub fn new(
        disputes: Arc<dyn DisputeStore>,
        bookings: BookingService,
        payments: PaymentService,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            disputes,
            bookings,
            payments,
            events: EventSink::new(publisher, clock.clone()),
            clock,
        }
    }

    /// Disputes a confirmed or completed booking. A confirmed booking moves
    /// to `disputed` and keeps its seats until the dispute is resolved.
    pub async fn open_booking_dispute(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        req: OpenDisputeRequest<BookingDisputeReason>,
    ) -> Result<BookingDispute, AppError> {
        req.validate()?;
        let initiated_by = ctx.require_user()?;
        let booking = self.bookings.load(booking_id).await?;
        if !(ctx.is_admin() || booking.is_owned_by(initiated_by) || booking.is_provided_by(initiated_by))
        {
            return Err(AppError::forbidden("Not a party to this booking"));
        }
        if !booking.status.is_disputable() {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Booking {} is {} and cannot be disputed", booking.id, booking.status),
            ));
        }
        if self.disputes.active_booking_dispute(booking_id).await?.is_some() {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Booking {booking_id} already has an open dispute"),
            ));
        }

        let dispute = NewDispute {
            id: DisputeId::new(),
            initiated_by,
            reason: req.reason,
            description: req.description,
            evidence: req.evidence,
            created_at: self.clock.now(),
        }
        .into_booking_dispute(booking_id);
        let dispute = self.disputes.insert_booking_dispute(&dispute).await?;

        if booking.status == BookingStatus::Confirmed {
            let transition =
                BookingTransition::new(&booking, BookingStatus::Disputed, self.clock.now())
                    .by(Some(initiated_by));
            if let Err(e) = self.bookings.apply(transition).await {
                // Lost the swap to a concurrent change; drop the orphan.
                if !self.disputes.discard_booking_dispute(dispute.id).await? {
                    warn!(dispute_id = %dispute.id, "Dispute changed before it could be discarded");
                }
                return Err(e);
            }
        }

        info!(dispute_id = %dispute.id, booking_id = %booking_id, reason = ?dispute.reason, "Booking dispute opened");
        self.events
            .emit(
                Some(initiated_by),
                DisputeEvent::Opened {
                    dispute_id: dispute.id,
                    subject: DisputeSubject::Booking,
                    target_id: booking_id.into_uuid(),
                },
            )
            .await;
        Ok(dispute)
    }

    /// Disputes a captured payment (chargeback).
    pub async fn open_payment_dispute(
        &self,
        ctx: &RequestContext,
        payment_id: PaymentId,
        req: OpenDisputeRequest<PaymentDisputeReason>,
    ) -> Result<PaymentDispute, AppError> {
        req.validate()?;
        let initiated_by = ctx.require_user()?;
        let payment = self.payments.load(payment_id).await?;
        if !(ctx.is_admin() || payment.traveler_id == initiated_by) {
            return Err(AppError::forbidden("Only the paying traveler may dispute a payment"));
        }
        if !payment.status.is_refundable() {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Payment {} is {} and cannot be disputed", payment.id, payment.status),
            ));
        }
        if self.disputes.active_payment_dispute(payment_id).await?.is_some() {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Payment {payment_id} already has an open dispute"),
            ));
        }

        let dispute = NewDispute {
            id: DisputeId::new(),
            initiated_by,
            reason: req.reason,
            description: req.description,
            evidence: req.evidence,
            created_at: self.clock.now(),
        }
        .into_payment_dispute(payment_id);
        let dispute = self.disputes.insert_payment_dispute(&dispute).await?;

        info!(dispute_id = %dispute.id, payment_id = %payment_id, reason = ?dispute.reason, "Payment dispute opened");
        self.events
            .emit(
                Some(initiated_by),
                DisputeEvent::Opened {
                    dispute_id: dispute.id,
                    subject: DisputeSubject::Payment,
                    target_id: payment_id.into_uuid(),
                },
            )
            .await;
        Ok(dispute)
    }

    /// An admin picks the dispute up.
    pub async fn start_review(
        &self,
        ctx: &RequestContext,
        id: DisputeId,
    ) -> Result<Dispute, AppError> {
        ctx.require_admin()?;
        let dispute = self.load(id).await?;
        let at = self.clock.now();
        let updated = match &dispute {
            Dispute::Booking(d) => {
                let mut update =
                    DisputeUpdate::new(id, d.status, DisputeStatus::InReview, at);
                update.reviewed_by = ctx.user_id;
                Dispute::Booking(self.update_booking(&update).await?)
            }
            Dispute::Payment(d) => {
                let mut update =
                    DisputeUpdate::new(id, d.status, PaymentDisputeStatus::InReview, at);
                update.reviewed_by = ctx.user_id;
                Dispute::Payment(self.update_payment(&update).await?)
            }
        };

        self.events
            .emit(
                ctx.user_id,
                DisputeEvent::ReviewStarted {
                    dispute_id: id,
                    subject: updated.subject(),
                },
            )
            .await;
        Ok(updated)
    }

    /// Settles a dispute.
    ///
    /// Refund-implying resolutions refund through the payment service under
    /// the key `dispute:{id}`, so a retried resolution never refunds twice.
    /// A booking still `disputed` afterwards returns to `confirmed`.
    pub async fn resolve(
        &self,
        ctx: &RequestContext,
        id: DisputeId,
        req: ResolveDisputeRequest,
    ) -> Result<Dispute, AppError> {
        ctx.require_admin()?;
        let resolved_by = ctx.require_user()?;
        req.validate()?;
        match (req.resolution_type.implies_refund(), req.refund_amount) {
            (true, None) => {
                return Err(AppError::validation(format!(
                    "A {} resolution requires a refund amount",
                    req.resolution_type
                )));
            }
            (false, Some(_)) => {
                return Err(AppError::validation(format!(
                    "A {} resolution cannot carry a refund amount",
                    req.resolution_type
                )));
            }
            _ => {}
        }

        let dispute = self.load(id).await?;
        if !dispute.is_active() {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Dispute {id} is already settled"),
            ));
        }

        let resolution = DisputeResolution {
            resolution_type: req.resolution_type,
            notes: req.notes,
            refund_amount: req.refund_amount,
            resolved_by,
        };
        let at = self.clock.now();

        let resolved = match dispute {
            Dispute::Booking(d) => {
                if let Some(amount) = resolution.refund_amount {
                    let payment = self
                        .payments
                        .find_by_booking(ctx, d.booking_id)
                        .await?
                        .ok_or_else(|| {
                            AppError::new(
                                ErrorKind::InvalidStateTransition,
                                format!("Booking {} has no payment to refund", d.booking_id),
                            )
                        })?;
                    self.refund(ctx, id, payment.id, amount, &resolution).await?;
                }

                let mut update = DisputeUpdate::new(id, d.status, DisputeStatus::Resolved, at);
                update.resolution = Some(resolution.clone());
                let resolved = self.update_booking(&update).await?;
                self.reinstate_booking(ctx, d.booking_id).await?;
                Dispute::Booking(resolved)
            }
            Dispute::Payment(d) => {
                if let Some(amount) = resolution.refund_amount {
                    self.refund(ctx, id, d.payment_id, amount, &resolution).await?;
                }

                let outcome = PaymentDisputeStatus::outcome_of(resolution.resolution_type);
                let mut update = DisputeUpdate::new(id, d.status, outcome, at);
                update.resolution = Some(resolution.clone());
                Dispute::Payment(self.update_payment(&update).await?)
            }
        };

        info!(
            dispute_id = %id,
            resolution = %resolution.resolution_type,
            refund_amount = ?resolution.refund_amount,
            "Dispute resolved"
        );
        self.events
            .emit(
                ctx.user_id,
                DisputeEvent::Resolved {
                    dispute_id: id,
                    subject: resolved.subject(),
                    resolution_type: resolution.resolution_type.as_str().to_string(),
                    refund_amount: resolution.refund_amount,
                },
            )
            .await;
        Ok(resolved)
    }

    /// Archives a settled dispute.
    pub async fn close(&self, ctx: &RequestContext, id: DisputeId) -> Result<Dispute, AppError> {
        ctx.require_admin()?;
        let dispute = self.load(id).await?;
        let at = self.clock.now();
        let closed = match &dispute {
            Dispute::Booking(d) => Dispute::Booking(
                self.update_booking(&DisputeUpdate::new(id, d.status, DisputeStatus::Closed, at))
                    .await?,
            ),
            Dispute::Payment(d) => Dispute::Payment(
                self.update_payment(&DisputeUpdate::new(
                    id,
                    d.status,
                    PaymentDisputeStatus::Closed,
                    at,
                ))
                .await?,
            ),
        };

        self.events
            .emit(
                ctx.user_id,
                DisputeEvent::Closed {
                    dispute_id: id,
                    subject: closed.subject(),
                },
            )
            .await;
        Ok(closed)
    }

    /// Loads a dispute visible to the actor.
    pub async fn get(&self, ctx: &RequestContext, id: DisputeId) -> Result<Dispute, AppError> {
        let dispute = self.load(id).await?;
        if ctx.is_privileged() || ctx.is_user(dispute.initiated_by()) {
            return Ok(dispute);
        }
        // Parties to the disputed booking or payment may read it too.
        match &dispute {
            Dispute::Booking(d) => {
                self.bookings.get(ctx, d.booking_id).await?;
            }
            Dispute::Payment(d) => {
                self.payments.get(ctx, d.payment_id).await?;
            }
        }
        Ok(dispute)
    }

    /// Disputes raised against a booking, oldest first.
    pub async fn list_for_booking(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
    ) -> Result<Vec<BookingDispute>, AppError> {
        self.bookings.get(ctx, booking_id).await?;
        self.disputes.list_booking_disputes(booking_id).await
    }

    /// Disputes raised against a payment, oldest first.
    pub async fn list_for_payment(
        &self,
        ctx: &RequestContext,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentDispute>, AppError> {
        self.payments.get(ctx, payment_id).await?;
        self.disputes.list_payment_disputes(payment_id).await
    }

    async fn load(&self, id: DisputeId) -> Result<Dispute, AppError> {
        if let Some(d) = self.disputes.find_booking_dispute(id).await? {
            return Ok(Dispute::Booking(d));
        }
        if let Some(d) = self.disputes.find_payment_dispute(id).await? {
            return Ok(Dispute::Payment(d));
        }
        Err(AppError::not_found(format!("Dispute {id} not found")))
    }

    async fn refund(
        &self,
        ctx: &RequestContext,
        id: DisputeId,
        payment_id: PaymentId,
        amount: i64,
        resolution: &DisputeResolution,
    ) -> Result<(), AppError> {
        let key = format!("dispute:{id}");
        let reason = resolution
            .notes
            .clone()
            .or_else(|| Some(format!("Dispute {id} resolved as {}", resolution.resolution_type)));
        self.payments
            .refund(ctx, payment_id, amount, reason, &key)
            .await?;
        Ok(())
    }

    /// Return a booking left in `disputed` to `confirmed`.
    async fn reinstate_booking(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
    ) -> Result<(), AppError> {
        let booking = self.bookings.load(booking_id).await?;
        if booking.status != BookingStatus::Disputed {
            return Ok(());
        }
        let transition = BookingTransition::new(&booking, BookingStatus::Confirmed, self.clock.now())
            .by(ctx.user_id);
        match self.bookings.apply(transition).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_transient() => {
                warn!(booking_id = %booking_id, "Booking moved while reinstating, left as is");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn update_booking(
        &self,
        update: &DisputeUpdate<DisputeStatus>,
    ) -> Result<BookingDispute, AppError> {
        if !update.from.can_transition_to(update.to) {
            return Err(AppError::invalid_transition(update.from, update.to));
        }
        self.disputes
            .update_booking_dispute(update)
            .await?
            .ok_or_else(|| stale_dispute(update.dispute_id, update.from))
    }

    async fn update_payment(
        &self,
        update: &DisputeUpdate<PaymentDisputeStatus>,
    ) -> Result<PaymentDispute, AppError> {
        if !update.from.can_transition_to(update.to) {
            return Err(AppError::invalid_transition(update.from, update.to));
        }
        self.disputes
            .update_payment_dispute(update)
            .await?
            .ok_or_else(|| stale_dispute(update.dispute_id, update.from))
    }
}

fn stale_dispute(id: DisputeId, from: impl std::fmt::Display) -> AppError {
    AppError::conflict(format!("Dispute {id} is no longer {from}"))
}
