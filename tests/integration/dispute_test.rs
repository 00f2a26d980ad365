//! Dispute workflow through the engine.

use wayfare_core::error::ErrorKind;
use wayfare_core::types::id::UserId;
use wayfare_entity::booking::{Booking, BookingStatus};
use wayfare_entity::dispute::{
    BookingDisputeReason, DisputeStatus, PaymentDisputeReason, PaymentDisputeStatus,
    ResolutionType,
};
use wayfare_entity::experience::Experience;
use wayfare_entity::payment::{Payment, PaymentStatus};
use wayfare_service::{Dispute, OpenDisputeRequest, RequestContext, ResolveDisputeRequest};

use crate::helpers::{TestApp, date};

const NO_SHOW: &str = "Nobody showed up at the harbour";

async fn paid_booking(app: &TestApp) -> (Experience, Booking, Payment) {
    let experience = app.experience(6, 10_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 15), 2)
        .await
        .unwrap();
    let payment = app.pay(&booking).await;
    (experience, booking, payment)
}

fn resolution(resolution_type: ResolutionType, refund_amount: Option<i64>) -> ResolveDisputeRequest {
    ResolveDisputeRequest {
        resolution_type,
        notes: None,
        refund_amount,
    }
}

#[tokio::test]
async fn test_dispute_dismissed_reinstates_booking() {
    let app = TestApp::new();
    let (experience, booking, _) = paid_booking(&app).await;
    let traveler = RequestContext::traveler(booking.traveler_id);

    let dispute = app
        .engine
        .open_booking_dispute(
            &traveler,
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::ProviderNoShow, NO_SHOW),
        )
        .await
        .unwrap();
    assert_eq!(dispute.status, DisputeStatus::Open);
    assert_eq!(app.booking(booking.id).await.status, BookingStatus::Disputed);
    // Disputed bookings keep their seats.
    assert_eq!(app.remaining(&experience, date(3, 15)).await, 4);

    let resolved = app
        .engine
        .resolve_dispute(&app.admin, dispute.id, resolution(ResolutionType::NoAction, None))
        .await
        .unwrap();
    let Dispute::Booking(resolved) = resolved else {
        panic!("expected a booking dispute");
    };
    assert_eq!(resolved.status, DisputeStatus::Resolved);
    assert_eq!(resolved.resolved_by, app.admin.user_id);
    assert_eq!(app.booking(booking.id).await.status, BookingStatus::Confirmed);
    assert_eq!(app.remaining(&experience, date(3, 15)).await, 4);
}

#[tokio::test]
async fn test_full_refund_resolution() {
    let app = TestApp::new();
    let (experience, booking, payment) = paid_booking(&app).await;
    let traveler = RequestContext::traveler(booking.traveler_id);
    let dispute = app
        .engine
        .open_booking_dispute(
            &traveler,
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::NotAsDescribed, NO_SHOW),
        )
        .await
        .unwrap();

    app.engine
        .disputes()
        .start_review(&app.admin, dispute.id)
        .await
        .unwrap();
    app.engine
        .resolve_dispute(
            &app.admin,
            dispute.id,
            resolution(ResolutionType::Refund, Some(payment.amount)),
        )
        .await
        .unwrap();

    let booking = app.booking(booking.id).await;
    assert_eq!(booking.status, BookingStatus::Refunded);
    assert_eq!(app.remaining(&experience, date(3, 15)).await, 6);

    let payment = app
        .engine
        .payments()
        .get(&app.admin, payment.id)
        .await
        .unwrap();
    assert_eq!(payment.status, PaymentStatus::Refunded);
    assert_eq!(payment.total_refunded_amount, 20_000);
}

#[tokio::test]
async fn test_dispute_refund_is_keyed_to_the_dispute() {
    let app = TestApp::new();
    let (_, booking, payment) = paid_booking(&app).await;
    let dispute = app
        .engine
        .open_booking_dispute(
            &RequestContext::traveler(booking.traveler_id),
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::SafetyConcern, NO_SHOW),
        )
        .await
        .unwrap();
    app.engine
        .resolve_dispute(
            &app.admin,
            dispute.id,
            resolution(ResolutionType::PartialRefund, Some(5_000)),
        )
        .await
        .unwrap();

    // Replaying the dispute's refund key applies nothing.
    let replay = app
        .engine
        .refund_payment(
            &app.admin,
            payment.id,
            5_000,
            None,
            &format!("dispute:{}", dispute.id),
        )
        .await
        .unwrap();
    assert!(replay.replayed);
    assert_eq!(replay.payment.total_refunded_amount, 5_000);
    assert_eq!(replay.payment.status, PaymentStatus::PartiallyRefunded);
    assert_eq!(app.booking(booking.id).await.status, BookingStatus::Confirmed);

    let err = app
        .engine
        .resolve_dispute(&app.admin, dispute.id, resolution(ResolutionType::NoAction, None))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStateTransition);
}

#[tokio::test]
async fn test_refund_amount_must_match_resolution() {
    let app = TestApp::new();
    let (_, booking, _) = paid_booking(&app).await;
    let dispute = app
        .engine
        .open_booking_dispute(
            &RequestContext::provider(booking.provider_id),
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::TravelerNoShow, NO_SHOW),
        )
        .await
        .unwrap();

    let err = app
        .engine
        .resolve_dispute(&app.admin, dispute.id, resolution(ResolutionType::Refund, None))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = app
        .engine
        .resolve_dispute(
            &app.admin,
            dispute.id,
            resolution(ResolutionType::Credit, Some(100)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_only_admins_resolve() {
    let app = TestApp::new();
    let (_, booking, _) = paid_booking(&app).await;
    let traveler = RequestContext::traveler(booking.traveler_id);
    let dispute = app
        .engine
        .open_booking_dispute(
            &traveler,
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::Other, NO_SHOW),
        )
        .await
        .unwrap();

    let err = app
        .engine
        .resolve_dispute(&traveler, dispute.id, resolution(ResolutionType::NoAction, None))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_one_active_dispute_per_booking() {
    let app = TestApp::new();
    let (_, booking, _) = paid_booking(&app).await;
    let traveler = RequestContext::traveler(booking.traveler_id);
    let open = || OpenDisputeRequest::new(BookingDisputeReason::Other, NO_SHOW);

    let first = app
        .engine
        .open_booking_dispute(&traveler, booking.id, open())
        .await
        .unwrap();
    // The booking is now disputed, and the admin may not pile on.
    let err = app
        .engine
        .open_booking_dispute(&app.admin, booking.id, open())
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStateTransition);

    app.engine
        .resolve_dispute(&app.admin, first.id, resolution(ResolutionType::NoAction, None))
        .await
        .unwrap();
    let closed = app
        .engine
        .disputes()
        .close(&app.admin, first.id)
        .await
        .unwrap();
    assert!(!closed.is_active());

    app.engine
        .open_booking_dispute(&traveler, booking.id, open())
        .await
        .unwrap();
    let history = app
        .engine
        .disputes()
        .list_for_booking(&traveler, booking.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn test_outsiders_cannot_dispute_or_read() {
    let app = TestApp::new();
    let (_, booking, _) = paid_booking(&app).await;
    let outsider = RequestContext::traveler(UserId::new());

    let err = app
        .engine
        .open_booking_dispute(
            &outsider,
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::Other, NO_SHOW),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let dispute = app
        .engine
        .open_booking_dispute(
            &RequestContext::traveler(booking.traveler_id),
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::Other, NO_SHOW),
        )
        .await
        .unwrap();
    let provider = RequestContext::provider(booking.provider_id);
    assert!(app.engine.disputes().get(&provider, dispute.id).await.is_ok());
    let err = app
        .engine
        .disputes()
        .get(&outsider, dispute.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_pending_booking_cannot_be_disputed() {
    let app = TestApp::new();
    let experience = app.experience(6, 10_000).await;
    let traveler = UserId::new();
    let booking = app
        .book(traveler, &experience, date(3, 15), 1)
        .await
        .unwrap();

    let err = app
        .engine
        .open_booking_dispute(
            &RequestContext::traveler(traveler),
            booking.id,
            OpenDisputeRequest::new(BookingDisputeReason::Other, NO_SHOW),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStateTransition);
}

#[tokio::test]
async fn test_chargeback_is_lost() {
    let app = TestApp::new();
    let (_, booking, payment) = paid_booking(&app).await;

    let dispute = app
        .engine
        .open_payment_dispute(
            &RequestContext::traveler(booking.traveler_id),
            payment.id,
            OpenDisputeRequest::new(
                PaymentDisputeReason::Unauthorized,
                "I never authorised this charge",
            ),
        )
        .await
        .unwrap();
    assert_eq!(dispute.status, PaymentDisputeStatus::Open);
    // Payment disputes leave the booking alone.
    assert_eq!(app.booking(booking.id).await.status, BookingStatus::Confirmed);

    let resolved = app
        .engine
        .resolve_dispute(
            &app.admin,
            dispute.id,
            resolution(ResolutionType::Chargeback, Some(payment.amount)),
        )
        .await
        .unwrap();
    let Dispute::Payment(resolved) = resolved else {
        panic!("expected a payment dispute");
    };
    assert_eq!(resolved.status, PaymentDisputeStatus::Lost);
    assert_eq!(resolved.refund_amount, Some(20_000));
    assert_eq!(app.booking(booking.id).await.status, BookingStatus::Refunded);
}

#[tokio::test]
async fn test_payment_dispute_dismissed_is_won() {
    let app = TestApp::new();
    let (_, booking, payment) = paid_booking(&app).await;

    let dispute = app
        .engine
        .open_payment_dispute(
            &RequestContext::traveler(booking.traveler_id),
            payment.id,
            OpenDisputeRequest::new(PaymentDisputeReason::Duplicate, "Charged twice for one trip"),
        )
        .await
        .unwrap();
    let resolved = app
        .engine
        .resolve_dispute(&app.admin, dispute.id, resolution(ResolutionType::NoAction, None))
        .await
        .unwrap();
    let Dispute::Payment(resolved) = resolved else {
        panic!("expected a payment dispute");
    };
    assert_eq!(resolved.status, PaymentDisputeStatus::Won);

    let payment = app
        .engine
        .payments()
        .get(&app.admin, payment.id)
        .await
        .unwrap();
    assert_eq!(payment.total_refunded_amount, 0);
}
