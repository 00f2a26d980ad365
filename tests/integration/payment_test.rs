//! Payment reconciliation through the engine.

use wayfare_core::error::ErrorKind;
use wayfare_core::types::id::UserId;
use wayfare_entity::booking::{BookingPaymentStatus, BookingStatus};
use wayfare_entity::payment::PaymentStatus;
use wayfare_service::RequestContext;

use crate::helpers::{TestApp, date};

#[tokio::test]
async fn test_cumulative_refund_scenario() {
    let app = TestApp::new();
    let experience = app.experience(8, 10_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 15), 2)
        .await
        .unwrap();
    let payment = app.pay(&booking).await;
    assert_eq!(payment.amount, 20_000);

    let first = app
        .engine
        .refund_payment(&app.admin, payment.id, 5_000, None, "r1")
        .await
        .unwrap();
    assert_eq!(first.payment.status, PaymentStatus::PartiallyRefunded);
    assert_eq!(first.payment.total_refunded_amount, 5_000);
    assert_eq!(app.booking(booking.id).await.status, BookingStatus::Confirmed);

    let second = app
        .engine
        .refund_payment(&app.admin, payment.id, 15_000, None, "r2")
        .await
        .unwrap();
    assert_eq!(second.payment.status, PaymentStatus::Refunded);
    assert_eq!(second.payment.total_refunded_amount, 20_000);

    let err = app
        .engine
        .refund_payment(&app.admin, payment.id, 1, None, "r3")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidRefundAmount);

    let refunded = app.booking(booking.id).await;
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert_eq!(refunded.payment_status, BookingPaymentStatus::Refunded);
    // Full refund released the seats.
    assert_eq!(app.remaining(&experience, date(3, 15)).await, 8);

    let ledger = app
        .engine
        .payments()
        .list_refunds(&app.admin, payment.id)
        .await
        .unwrap();
    let amounts: Vec<i64> = ledger.iter().map(|r| r.amount).collect();
    assert_eq!(amounts, vec![5_000, 15_000]);
}

#[tokio::test]
async fn test_refund_bounds() {
    let app = TestApp::new();
    let experience = app.experience(8, 10_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 15), 1)
        .await
        .unwrap();
    let payment = app.pay(&booking).await;

    for amount in [0, -5, 10_001] {
        let err = app
            .engine
            .refund_payment(&app.admin, payment.id, amount, None, "k")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidRefundAmount, "amount {amount}");
    }

    let err = app
        .engine
        .refund_payment(&app.admin, payment.id, 100, None, "  ")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_transfer_idempotency() {
    let app = TestApp::new();
    let experience = app.experience(8, 10_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 15), 1)
        .await
        .unwrap();
    let payment = app.pay(&booking).await;
    assert_eq!(payment.provider_amount, Some(8_500));

    let transferred = app
        .engine
        .transfer_payment(&app.admin, payment.id, "payout-42")
        .await
        .unwrap();
    assert!(transferred.transferred_at.is_some());

    let err = app
        .engine
        .transfer_payment(&app.admin, payment.id, "payout-42")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AlreadyTransferred);
}

#[tokio::test]
async fn test_refunded_payment_cannot_be_transferred() {
    let app = TestApp::new();
    let experience = app.experience(8, 10_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 15), 1)
        .await
        .unwrap();
    let payment = app.pay(&booking).await;
    app.engine
        .refund_payment(&app.admin, payment.id, 2_000, None, "partial")
        .await
        .unwrap();

    let err = app
        .engine
        .transfer_payment(&app.admin, payment.id, "payout")
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStateTransition);
}

#[tokio::test]
async fn test_commission_uses_configured_rate() {
    let app = TestApp::with_config(wayfare_core::config::BookingConfig {
        commission_rate_bps: 1_250,
        ..Default::default()
    });
    let experience = app.experience(8, 999).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 15), 1)
        .await
        .unwrap();
    let payment = app.pay(&booking).await;

    // 12.5% of 999 = 124.875, rounded half-up.
    assert_eq!(payment.commission_rate_bps, Some(1_250));
    assert_eq!(payment.commission_amount, Some(125));
    assert_eq!(payment.provider_amount, Some(874));
}

#[tokio::test]
async fn test_payment_after_cancellation_leaves_booking_cancelled() {
    let app = TestApp::new();
    let experience = app.experience(8, 10_000).await;
    let traveler = UserId::new();
    let booking = app
        .book(traveler, &experience, date(3, 15), 1)
        .await
        .unwrap();
    let ctx = RequestContext::traveler(traveler);
    let payment = app
        .engine
        .payments()
        .initiate(&ctx, booking.id, None)
        .await
        .unwrap();
    app.engine
        .cancel_booking(&ctx, booking.id, None)
        .await
        .unwrap();

    app.engine
        .payments()
        .complete(&RequestContext::system(), payment.id)
        .await
        .unwrap();

    let booking = app.booking(booking.id).await;
    assert_eq!(booking.status, BookingStatus::Cancelled);
    assert_eq!(booking.payment_status, BookingPaymentStatus::Paid);
}

#[tokio::test]
async fn test_failed_payment_can_be_retried() {
    let app = TestApp::new();
    let experience = app.experience(8, 10_000).await;
    let traveler = UserId::new();
    let booking = app
        .book(traveler, &experience, date(3, 15), 1)
        .await
        .unwrap();
    let system = RequestContext::system();
    let payments = app.engine.payments();
    let payment = payments
        .initiate(&RequestContext::traveler(traveler), booking.id, None)
        .await
        .unwrap();

    payments
        .fail(&system, payment.id, Some("insufficient funds".into()))
        .await
        .unwrap();
    let err = payments.complete(&system, payment.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStateTransition);

    payments
        .mark_processing(&system, payment.id, Some("gw-881".into()))
        .await
        .unwrap();
    let completed = payments.complete(&system, payment.id).await.unwrap();
    assert_eq!(completed.status, PaymentStatus::Completed);
    assert_eq!(completed.gateway_reference.as_deref(), Some("gw-881"));
    assert_eq!(completed.failure_reason, None);
    assert_eq!(app.booking(booking.id).await.status, BookingStatus::Confirmed);
}
