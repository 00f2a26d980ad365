//! Concurrent reservations and refunds against one slot or payment.

use futures::future::join_all;

use wayfare_core::error::ErrorKind;
use wayfare_core::types::id::UserId;
use wayfare_entity::payment::PaymentStatus;

use crate::helpers::{TestApp, date};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reservations_never_oversell() {
    let app = TestApp::new();
    let experience = app.experience(10, 1_000).await;
    let day = date(4, 1);

    let attempts = (0..25).map(|_| app.book(UserId::new(), &experience, day, 2));
    let results = join_all(attempts).await;

    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 5);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.kind, ErrorKind::CapacityExceeded);
    }
    assert_eq!(app.remaining(&experience, day).await, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cancellations_release_once() {
    let app = TestApp::new();
    let experience = app.experience(6, 1_000).await;
    let day = date(4, 2);
    let traveler = UserId::new();
    let booking = app.book(traveler, &experience, day, 4).await.unwrap();
    let ctx = wayfare_service::RequestContext::traveler(traveler);

    let cancels = (0..8).map(|_| app.engine.cancel_booking(&ctx, booking.id, None));
    let results = join_all(cancels).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(app.remaining(&experience, day).await, 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refunds_never_exceed_amount() {
    let app = TestApp::new();
    let experience = app.experience(6, 10_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(4, 3), 1)
        .await
        .unwrap();
    let payment = app.pay(&booking).await;

    let keys: Vec<String> = (0..6).map(|i| format!("refund-{i}")).collect();
    let refunds = keys.iter().map(|key| {
        app.engine
            .refund_payment(&app.admin, payment.id, 3_000, None, key)
    });
    let results = join_all(refunds).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 3);
    let payment = app
        .engine
        .payments()
        .get(&app.admin, payment.id)
        .await
        .unwrap();
    assert_eq!(payment.total_refunded_amount, 9_000);
    assert_eq!(payment.status, PaymentStatus::PartiallyRefunded);
}
