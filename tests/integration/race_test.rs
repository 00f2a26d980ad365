//! Cross-record flows that lose a booking race to a concurrent cancel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use wayfare_core::error::{AppError, ErrorKind};
use wayfare_core::types::id::{BookingId, UserId};
use wayfare_core::types::pagination::{PageRequest, PageResponse};
use wayfare_database::MemoryStore;
use wayfare_database::store::{BookingStore, ReserveOutcome};
use wayfare_entity::booking::{
    Booking, BookingPaymentStatus, BookingStatus, BookingTransition, NewBooking,
};
use wayfare_entity::capacity::{CapacitySlot, SlotDrift, SlotKey};
use wayfare_entity::dispute::BookingDisputeReason;
use wayfare_entity::payment::PaymentStatus;
use wayfare_service::{OpenDisputeRequest, RequestContext, StatisticsScope};

use crate::helpers::{TestApp, date};

/// Cancels the booking just before the first transition into `target`
/// reaches the inner store, so that transition loses its swap.
#[derive(Debug)]
struct CancelFirst {
    inner: MemoryStore,
    target: BookingStatus,
    armed: AtomicBool,
}

impl CancelFirst {
    fn wrap(target: BookingStatus) -> impl FnOnce(MemoryStore) -> Arc<dyn BookingStore> {
        move |inner| {
            Arc::new(Self {
                inner,
                target,
                armed: AtomicBool::new(true),
            }) as Arc<dyn BookingStore>
        }
    }
}

#[async_trait]
impl BookingStore for CancelFirst {
    async fn reserve(
        &self,
        booking: &NewBooking,
        max_participants: i32,
    ) -> Result<ReserveOutcome, AppError> {
        self.inner.reserve(booking, max_participants).await
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, AppError> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_number(&self, booking_number: i64) -> Result<Option<Booking>, AppError> {
        self.inner.find_by_number(booking_number).await
    }

    async fn list_by_traveler(
        &self,
        traveler_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        self.inner.list_by_traveler(traveler_id, page).await
    }

    async fn list_by_provider(
        &self,
        provider_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        self.inner.list_by_provider(provider_id, page).await
    }

    async fn find_slot(&self, key: SlotKey) -> Result<Option<CapacitySlot>, AppError> {
        self.inner.find_slot(key).await
    }

    async fn apply_transition(
        &self,
        transition: &BookingTransition,
    ) -> Result<Option<Booking>, AppError> {
        if transition.to == self.target && self.armed.swap(false, Ordering::SeqCst) {
            if let Some(current) = self.inner.find_by_id(transition.booking_id).await? {
                let cancel = BookingTransition::new(&current, BookingStatus::Cancelled, transition.at)
                    .by(Some(current.traveler_id))
                    .with_reason(Some("Changed plans".to_string()));
                self.inner.apply_transition(&cancel).await?;
            }
        }
        self.inner.apply_transition(transition).await
    }

    async fn set_payment_status(
        &self,
        id: BookingId,
        payment_status: BookingPaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        self.inner.set_payment_status(id, payment_status, at).await
    }

    async fn soft_delete(
        &self,
        id: BookingId,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        self.inner.soft_delete(id, at).await
    }

    async fn find_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError> {
        self.inner.find_stale_pending(created_before, limit).await
    }

    async fn find_completable(
        &self,
        date: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError> {
        self.inner.find_completable(date, limit).await
    }

    async fn list_slot_keys(&self, from: NaiveDate, limit: i64) -> Result<Vec<SlotKey>, AppError> {
        self.inner.list_slot_keys(from, limit).await
    }

    async fn reconcile_slot(
        &self,
        key: SlotKey,
        at: DateTime<Utc>,
    ) -> Result<Option<SlotDrift>, AppError> {
        self.inner.reconcile_slot(key, at).await
    }
}

#[tokio::test]
async fn test_dispute_not_kept_when_booking_cancelled_first() {
    let app = TestApp::with_booking_store(CancelFirst::wrap(BookingStatus::Disputed));
    let experience = app.experience(6, 10_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 15), 2)
        .await
        .unwrap();
    app.pay(&booking).await;
    assert_eq!(app.remaining(&experience, date(3, 15)).await, 4);

    let err = app
        .engine
        .open_booking_dispute(
            &RequestContext::traveler(booking.traveler_id),
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::ProviderNoShow, "Nobody came"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    assert_eq!(app.booking(booking.id).await.status, BookingStatus::Cancelled);
    assert_eq!(app.remaining(&experience, date(3, 15)).await, 6);
    let disputes = app
        .engine
        .disputes()
        .list_for_booking(&app.admin, booking.id)
        .await
        .unwrap();
    assert!(disputes.is_empty());

    let stats = app
        .engine
        .statistics(&app.admin, StatisticsScope::All)
        .await
        .unwrap();
    assert_eq!(stats.open_disputes, 0);
}

#[tokio::test]
async fn test_capture_recorded_when_booking_cancelled_first() {
    let app = TestApp::with_booking_store(CancelFirst::wrap(BookingStatus::Confirmed));
    let experience = app.experience(6, 10_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 15), 2)
        .await
        .unwrap();
    let payment = app.pay(&booking).await;
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.commission_amount, Some(3_000));

    let cancelled = app.booking(booking.id).await;
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.payment_status, BookingPaymentStatus::Paid);
    assert_eq!(app.remaining(&experience, date(3, 15)).await, 6);

    let stats = app
        .engine
        .statistics(&app.admin, StatisticsScope::All)
        .await
        .unwrap();
    assert_eq!(stats.paid_revenue.get("EUR"), Some(&20_000));

    // The captured money can be given back.
    let receipt = app
        .engine
        .refund_payment(&app.admin, payment.id, 20_000, None, "cancelled-capture")
        .await
        .unwrap();
    assert_eq!(receipt.payment.status, PaymentStatus::Refunded);
    let refunded = app.booking(booking.id).await;
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert_eq!(refunded.payment_status, BookingPaymentStatus::Refunded);
}
