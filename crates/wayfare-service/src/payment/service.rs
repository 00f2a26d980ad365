//! Payment service.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use wayfare_core::clock::Clock;
use wayfare_core::config::BookingConfig;
use wayfare_core::error::{AppError, ErrorKind};
use wayfare_core::events::PaymentEvent;
use wayfare_core::traits::EventPublisher;
use wayfare_core::types::id::{BookingId, PaymentId};
use wayfare_database::store::{PaymentStore, RefundOutcome, RefundRequest};
use wayfare_entity::booking::{Booking, BookingPaymentStatus, BookingStatus, BookingTransition};
use wayfare_entity::payment::{
    CommissionSplit, NewPayment, Payment, PaymentRefund, PaymentStatus, PaymentTransition,
    PaymentType,
};

use crate::booking::BookingService;
use crate::context::RequestContext;
use crate::events::EventSink;

/// Result of a refund call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundReceipt {
    /// The payment after the call.
    pub payment: Payment,
    /// The ledger entry for this operation key.
    pub refund: PaymentRefund,
    /// Whether the key had been used before and nothing was applied.
    pub replayed: bool,
}

/// Tracks money against bookings.
#[derive(Debug, Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentStore>,
    bookings: BookingService,
    events: EventSink,
    clock: Arc<dyn Clock>,
    config: BookingConfig,
}

impl PaymentService {
    /// Creates a new payment service.
    pub fn new(
        payments: Arc<dyn PaymentStore>,
        bookings: BookingService,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Self {
        Self {
            payments,
            bookings,
            events: EventSink::new(publisher, clock.clone()),
            clock,
            config,
        }
    }

    /// Opens the payment for a booking. One payment per booking.
    pub async fn initiate(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        payment_method: Option<String>,
    ) -> Result<Payment, AppError> {
        let booking = self.bookings.load(booking_id).await?;
        if !(ctx.is_privileged() || ctx.user_id.is_some_and(|u| booking.is_owned_by(u))) {
            return Err(AppError::forbidden("Only the traveler may pay for this booking"));
        }
        if !matches!(
            booking.status,
            BookingStatus::Pending | BookingStatus::Confirmed
        ) {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Booking {} is {} and cannot be paid", booking.id, booking.status),
            ));
        }
        if self.payments.find_by_booking(booking_id).await?.is_some() {
            return Err(AppError::new(
                ErrorKind::InvalidStateTransition,
                format!("Booking {booking_id} already has a payment"),
            ));
        }

        let payment = self
            .payments
            .insert(&NewPayment {
                id: PaymentId::new(),
                booking_id,
                traveler_id: booking.traveler_id,
                provider_id: booking.provider_id,
                amount: booking.total_amount,
                currency: booking.currency.clone(),
                payment_type: PaymentType::Booking,
                payment_method: payment_method.or(booking.payment_method),
                gateway_reference: None,
                created_at: self.clock.now(),
            })
            .await?;

        info!(payment_id = %payment.id, booking_id = %booking_id, amount = payment.amount, "Payment initiated");
        self.events
            .emit(
                ctx.user_id,
                PaymentEvent::Initiated {
                    payment_id: payment.id,
                    booking_id,
                    amount: payment.amount,
                },
            )
            .await;
        Ok(payment)
    }

    /// The gateway accepted the payment for processing.
    pub async fn mark_processing(
        &self,
        ctx: &RequestContext,
        id: PaymentId,
        gateway_reference: Option<String>,
    ) -> Result<Payment, AppError> {
        ctx.require_privileged()?;
        let payment = self.load(id).await?;
        let mut transition =
            PaymentTransition::new(&payment, PaymentStatus::Processing, self.clock.now());
        transition.gateway_reference = gateway_reference;
        self.commit(&transition).await
    }

    /// Funds were captured. Freezes the commission split, marks the booking
    /// paid, and confirms it if it was still pending.
    pub async fn complete(&self, ctx: &RequestContext, id: PaymentId) -> Result<Payment, AppError> {
        ctx.require_privileged()?;
        let payment = self.load(id).await?;
        let split = CommissionSplit::compute(payment.amount, self.config.commission_rate_bps);
        let mut transition =
            PaymentTransition::new(&payment, PaymentStatus::Completed, self.clock.now());
        transition.split = Some(split);
        let payment = self.commit(&transition).await?;

        let booking = self.bookings.load(payment.booking_id).await?;
        if booking.status == BookingStatus::Pending {
            let confirm =
                BookingTransition::new(&booking, BookingStatus::Confirmed, self.clock.now())
                    .by(ctx.user_id)
                    .with_payment_status(BookingPaymentStatus::Paid);
            match self.bookings.apply(confirm).await {
                Ok(_) => {}
                // Cancelled or expired while the capture was in flight. The
                // money is already taken, so record it on the current row.
                Err(e) if e.is_transient() => {
                    let current = self.bookings.load(payment.booking_id).await?;
                    self.mark_booking_paid(&payment, &current).await?;
                }
                Err(e) => return Err(e),
            }
        } else {
            self.mark_booking_paid(&payment, &booking).await?;
        }

        info!(
            payment_id = %payment.id,
            commission = split.commission_amount,
            provider_amount = split.provider_amount,
            "Payment completed"
        );
        self.events
            .emit(
                ctx.user_id,
                PaymentEvent::Completed {
                    payment_id: payment.id,
                    booking_id: payment.booking_id,
                    commission_amount: split.commission_amount,
                    provider_amount: split.provider_amount,
                },
            )
            .await;
        Ok(payment)
    }

    async fn mark_booking_paid(&self, payment: &Payment, booking: &Booking) -> Result<(), AppError> {
        if booking.status == BookingStatus::Cancelled {
            warn!(
                payment_id = %payment.id,
                booking_id = %booking.id,
                "Payment captured for a cancelled booking, refund required"
            );
        }
        self.bookings
            .set_payment_status(booking, BookingPaymentStatus::Paid)
            .await?;
        Ok(())
    }

    /// The gateway declined. The booking keeps its seats until cancelled or
    /// expired.
    pub async fn fail(
        &self,
        ctx: &RequestContext,
        id: PaymentId,
        reason: Option<String>,
    ) -> Result<Payment, AppError> {
        ctx.require_privileged()?;
        let payment = self.load(id).await?;
        let mut transition =
            PaymentTransition::new(&payment, PaymentStatus::Failed, self.clock.now());
        transition.failure_reason = reason.clone();
        let payment = self.commit(&transition).await?;

        let booking = self.bookings.load(payment.booking_id).await?;
        self.bookings
            .set_payment_status(&booking, BookingPaymentStatus::Failed)
            .await?;

        warn!(payment_id = %payment.id, reason = ?reason, "Payment failed");
        self.events
            .emit(
                ctx.user_id,
                PaymentEvent::Failed {
                    payment_id: payment.id,
                    booking_id: payment.booking_id,
                    reason,
                },
            )
            .await;
        Ok(payment)
    }

    /// Abandons a payment before capture.
    pub async fn cancel(&self, ctx: &RequestContext, id: PaymentId) -> Result<Payment, AppError> {
        let payment = self.load(id).await?;
        if !(ctx.is_privileged() || ctx.is_user(payment.traveler_id)) {
            return Err(AppError::forbidden("Only the traveler may cancel this payment"));
        }
        let transition =
            PaymentTransition::new(&payment, PaymentStatus::Cancelled, self.clock.now());
        let payment = self.commit(&transition).await?;

        self.events
            .emit(ctx.user_id, PaymentEvent::Cancelled { payment_id: payment.id })
            .await;
        Ok(payment)
    }

    /// Returns `amount` of a captured payment to the traveler.
    ///
    /// Refunds accumulate; the payment becomes `refunded` once nothing is
    /// left. The `operation_key` makes the call idempotent: repeating it
    /// returns the original ledger entry and applies nothing. A refund that
    /// empties the payment also moves the booking to `refunded`.
    pub async fn refund(
        &self,
        ctx: &RequestContext,
        id: PaymentId,
        amount: i64,
        reason: Option<String>,
        operation_key: &str,
    ) -> Result<RefundReceipt, AppError> {
        ctx.require_privileged()?;
        if amount <= 0 {
            return Err(AppError::invalid_refund(format!(
                "Refund amount must be positive, got {amount}"
            )));
        }
        if operation_key.trim().is_empty() {
            return Err(AppError::validation("A refund needs an operation key"));
        }

        let request = RefundRequest {
            payment_id: id,
            amount,
            reason,
            operation_key: operation_key.to_string(),
            at: self.clock.now(),
        };

        let receipt = match self.payments.apply_refund(&request).await? {
            RefundOutcome::Applied { payment, refund } => {
                let full = payment.status == PaymentStatus::Refunded;
                info!(
                    payment_id = %id,
                    amount,
                    total_refunded = payment.total_refunded_amount,
                    full,
                    "Refund applied"
                );
                self.events
                    .emit(
                        ctx.user_id,
                        PaymentEvent::Refunded {
                            payment_id: id,
                            booking_id: payment.booking_id,
                            amount,
                            total_refunded: payment.total_refunded_amount,
                            full,
                        },
                    )
                    .await;
                RefundReceipt {
                    payment,
                    refund,
                    replayed: false,
                }
            }
            RefundOutcome::Replayed { payment, refund } => {
                info!(payment_id = %id, operation_key, "Refund replayed");
                RefundReceipt {
                    payment,
                    refund,
                    replayed: true,
                }
            }
            RefundOutcome::Rejected { status, refundable } => {
                // A fully refunded payment has nothing left: an amount error.
                return Err(if status.is_refundable() || status == PaymentStatus::Refunded {
                    AppError::invalid_refund(format!(
                        "Refund of {amount} exceeds the refundable {refundable}"
                    ))
                } else {
                    AppError::new(
                        ErrorKind::InvalidStateTransition,
                        format!("Payment {id} is {status} and cannot be refunded"),
                    )
                });
            }
        };

        // A replay still converges the booking if the first attempt stopped
        // after the refund.
        if receipt.payment.status == PaymentStatus::Refunded {
            self.mark_booking_refunded(ctx, receipt.payment.booking_id)
                .await?;
        }
        Ok(receipt)
    }

    /// Pays the provider share out. Exactly once per payment.
    pub async fn transfer(
        &self,
        ctx: &RequestContext,
        id: PaymentId,
        operation_key: &str,
    ) -> Result<Payment, AppError> {
        ctx.require_privileged()?;
        if operation_key.trim().is_empty() {
            return Err(AppError::validation("A transfer needs an operation key"));
        }

        let Some(payment) = self
            .payments
            .mark_transferred(id, operation_key, self.clock.now())
            .await?
        else {
            let current = self.load(id).await?;
            return Err(if current.transferred_at.is_some() {
                AppError::already_transferred(format!("Payment {id} was already transferred"))
            } else {
                AppError::new(
                    ErrorKind::InvalidStateTransition,
                    format!(
                        "Payment {id} is {} and cannot be transferred",
                        current.status
                    ),
                )
            });
        };

        let provider_amount = payment.provider_amount.unwrap_or_default();
        info!(payment_id = %id, provider_amount, "Provider share transferred");
        self.events
            .emit(
                ctx.user_id,
                PaymentEvent::Transferred {
                    payment_id: id,
                    provider_amount,
                },
            )
            .await;
        Ok(payment)
    }

    /// Loads a payment visible to the actor.
    pub async fn get(&self, ctx: &RequestContext, id: PaymentId) -> Result<Payment, AppError> {
        let payment = self.load(id).await?;
        Self::authorize_view(ctx, &payment)?;
        Ok(payment)
    }

    /// The payment for a booking, if one was initiated.
    pub async fn find_by_booking(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
    ) -> Result<Option<Payment>, AppError> {
        let payment = self.payments.find_by_booking(booking_id).await?;
        if let Some(payment) = &payment {
            Self::authorize_view(ctx, payment)?;
        }
        Ok(payment)
    }

    /// Refund ledger of a payment, oldest first.
    pub async fn list_refunds(
        &self,
        ctx: &RequestContext,
        id: PaymentId,
    ) -> Result<Vec<PaymentRefund>, AppError> {
        let payment = self.load(id).await?;
        Self::authorize_view(ctx, &payment)?;
        self.payments.list_refunds(id).await
    }

    pub(crate) async fn load(&self, id: PaymentId) -> Result<Payment, AppError> {
        self.payments
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Payment {id} not found")))
    }

    async fn commit(&self, transition: &PaymentTransition) -> Result<Payment, AppError> {
        if !transition.from.can_transition_to(transition.to) {
            return Err(AppError::invalid_transition(transition.from, transition.to));
        }
        let payment = self.payments.transition(transition).await?.ok_or_else(|| {
            AppError::conflict(format!(
                "Payment {} is no longer {}",
                transition.payment_id, transition.from
            ))
        })?;
        info!(
            payment_id = %payment.id,
            from = %transition.from,
            to = %transition.to,
            "Payment status changed"
        );
        Ok(payment)
    }

    /// Drive the booking to `refunded`, retrying once if it moved under us.
    async fn mark_booking_refunded(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
    ) -> Result<(), AppError> {
        for attempt in 0..2 {
            let booking = self.bookings.load(booking_id).await?;
            if booking.status == BookingStatus::Refunded {
                return Ok(());
            }
            let transition =
                BookingTransition::new(&booking, BookingStatus::Refunded, self.clock.now())
                    .by(ctx.user_id)
                    .with_payment_status(BookingPaymentStatus::Refunded);
            match self.bookings.apply(transition).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_transient() && attempt == 0 => {
                    warn!(booking_id = %booking_id, "Booking changed during refund, retrying");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    fn authorize_view(ctx: &RequestContext, payment: &Payment) -> Result<(), AppError> {
        if ctx.is_privileged() || ctx.is_user(payment.traveler_id) || ctx.is_user(payment.provider_id)
        {
            Ok(())
        } else {
            Err(AppError::forbidden("Not a party to this payment"))
        }
    }
}
