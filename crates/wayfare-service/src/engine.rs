//! The assembled booking engine.
//!
//! [`BookingEngine`] wires the services over one set of stores and exposes
//! the inbound operations of the engine. Expanded operations are reached
//! through the service accessors.

use std::sync::Arc;

use chrono::NaiveDate;

use wayfare_core::clock::Clock;
use wayfare_core::config::BookingConfig;
use wayfare_core::error::AppError;
use wayfare_core::traits::EventPublisher;
use wayfare_core::types::id::{BookingId, DisputeId, ExperienceId, PaymentId};
use wayfare_database::store::{
    BookingStatistics, BookingStore, DisputeStore, ExperienceCatalog, PaymentStore,
    StatisticsStore,
};
use wayfare_database::{MemoryExperienceCatalog, MemoryStore, PgStores};
use wayfare_entity::booking::{Booking, BookingStatus};
use wayfare_entity::dispute::{
    BookingDispute, BookingDisputeReason, PaymentDispute, PaymentDisputeReason,
};
use wayfare_entity::payment::Payment;

use crate::booking::{BookingService, CreateBookingRequest};
use crate::capacity::{Availability, CapacityLedger};
use crate::context::RequestContext;
use crate::dispute::{Dispute, DisputeService, OpenDisputeRequest, ResolveDisputeRequest};
use crate::payment::{PaymentService, RefundReceipt};
use crate::statistics::{StatisticsScope, StatisticsService};

/// The stores one engine runs on.
#[derive(Debug, Clone)]
pub struct EngineStores {
    /// Bookings and capacity slots.
    pub bookings: Arc<dyn BookingStore>,
    /// Payments and refunds.
    pub payments: Arc<dyn PaymentStore>,
    /// Disputes.
    pub disputes: Arc<dyn DisputeStore>,
    /// Statistics queries.
    pub statistics: Arc<dyn StatisticsStore>,
    /// The experience catalog.
    pub catalog: Arc<dyn ExperienceCatalog>,
}

impl EngineStores {
    /// Every store backed by one in-memory backend.
    pub fn memory(store: MemoryStore, catalog: MemoryExperienceCatalog) -> Self {
        let store = Arc::new(store);
        Self {
            bookings: store.clone(),
            payments: store.clone(),
            disputes: store.clone(),
            statistics: store,
            catalog: Arc::new(catalog),
        }
    }

    /// Every store backed by PostgreSQL.
    pub fn postgres(stores: PgStores) -> Self {
        Self {
            bookings: Arc::new(stores.bookings),
            payments: Arc::new(stores.payments),
            disputes: Arc::new(stores.disputes),
            statistics: Arc::new(stores.statistics),
            catalog: Arc::new(stores.experiences),
        }
    }
}

/// The booking and availability engine.
#[derive(Debug, Clone)]
pub struct BookingEngine {
    ledger: Arc<CapacityLedger>,
    bookings: BookingService,
    payments: PaymentService,
    disputes: DisputeService,
    statistics: StatisticsService,
}

impl BookingEngine {
    /// Wire the services. Fails on an invalid booking policy.
    pub fn new(
        stores: EngineStores,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        config: BookingConfig,
    ) -> Result<Self, AppError> {
        config.validate()?;

        let ledger = Arc::new(CapacityLedger::new(
            stores.bookings.clone(),
            stores.catalog,
            clock.clone(),
        ));
        let bookings = BookingService::new(
            stores.bookings,
            ledger.clone(),
            publisher.clone(),
            clock.clone(),
            config.clone(),
        );
        let payments = PaymentService::new(
            stores.payments,
            bookings.clone(),
            publisher.clone(),
            clock.clone(),
            config,
        );
        let disputes = DisputeService::new(
            stores.disputes,
            bookings.clone(),
            payments.clone(),
            publisher,
            clock.clone(),
        );
        let statistics = StatisticsService::new(stores.statistics, clock);

        Ok(Self {
            ledger,
            bookings,
            payments,
            disputes,
            statistics,
        })
    }

    /// Capacity ledger.
    pub fn ledger(&self) -> &CapacityLedger {
        &self.ledger
    }

    /// Booking lifecycle.
    pub fn bookings(&self) -> &BookingService {
        &self.bookings
    }

    /// Payment reconciliation.
    pub fn payments(&self) -> &PaymentService {
        &self.payments
    }

    /// Dispute resolution.
    pub fn disputes(&self) -> &DisputeService {
        &self.disputes
    }

    /// Statistics.
    pub fn statistics_service(&self) -> &StatisticsService {
        &self.statistics
    }

    /// Book an experience.
    pub async fn create_booking(
        &self,
        ctx: &RequestContext,
        req: CreateBookingRequest,
    ) -> Result<Booking, AppError> {
        self.bookings.create(ctx, req).await
    }

    /// Cancel a booking and free its seats.
    pub async fn cancel_booking(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        reason: Option<String>,
    ) -> Result<Booking, AppError> {
        self.bookings.cancel(ctx, booking_id, reason).await
    }

    /// Read a booking.
    pub async fn get_booking(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
    ) -> Result<Booking, AppError> {
        self.bookings.get(ctx, booking_id).await
    }

    /// Whether a slot can take `participants` more.
    pub async fn check_availability(
        &self,
        experience_id: ExperienceId,
        booking_date: NaiveDate,
        participants: i32,
    ) -> Result<Availability, AppError> {
        self.ledger
            .check_availability(experience_id, booking_date, participants)
            .await
    }

    /// Administrative status change.
    pub async fn update_booking_status(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        status: BookingStatus,
        reason: Option<String>,
    ) -> Result<Booking, AppError> {
        self.bookings
            .update_status(ctx, booking_id, status, reason)
            .await
    }

    /// Refund part or all of a payment, idempotent per operation key.
    pub async fn refund_payment(
        &self,
        ctx: &RequestContext,
        payment_id: PaymentId,
        amount: i64,
        reason: Option<String>,
        operation_key: &str,
    ) -> Result<RefundReceipt, AppError> {
        self.payments
            .refund(ctx, payment_id, amount, reason, operation_key)
            .await
    }

    /// Pay the provider share out.
    pub async fn transfer_payment(
        &self,
        ctx: &RequestContext,
        payment_id: PaymentId,
        operation_key: &str,
    ) -> Result<Payment, AppError> {
        self.payments.transfer(ctx, payment_id, operation_key).await
    }

    /// Dispute a booking.
    pub async fn open_booking_dispute(
        &self,
        ctx: &RequestContext,
        booking_id: BookingId,
        req: OpenDisputeRequest<BookingDisputeReason>,
    ) -> Result<BookingDispute, AppError> {
        self.disputes
            .open_booking_dispute(ctx, booking_id, req)
            .await
    }

    /// Dispute a payment.
    pub async fn open_payment_dispute(
        &self,
        ctx: &RequestContext,
        payment_id: PaymentId,
        req: OpenDisputeRequest<PaymentDisputeReason>,
    ) -> Result<PaymentDispute, AppError> {
        self.disputes
            .open_payment_dispute(ctx, payment_id, req)
            .await
    }

    /// Settle a dispute.
    pub async fn resolve_dispute(
        &self,
        ctx: &RequestContext,
        dispute_id: DisputeId,
        req: ResolveDisputeRequest,
    ) -> Result<Dispute, AppError> {
        self.disputes.resolve(ctx, dispute_id, req).await
    }

    /// Booking statistics for a scope.
    pub async fn statistics(
        &self,
        ctx: &RequestContext,
        scope: StatisticsScope,
    ) -> Result<BookingStatistics, AppError> {
        self.statistics.statistics(ctx, scope).await
    }
}
