//! Statistics snapshots over the in-memory backend.

use chrono::Duration;

use wayfare_core::error::ErrorKind;
use wayfare_core::types::id::UserId;
use wayfare_entity::booking::{BookingPaymentStatus, BookingStatus};
use wayfare_entity::dispute::BookingDisputeReason;
use wayfare_service::{OpenDisputeRequest, RequestContext, StatisticsScope};

use crate::helpers::{TestApp, date};

#[tokio::test]
async fn test_platform_and_provider_snapshots() {
    let app = TestApp::new();
    let sailing = app.experience(10, 10_000).await;
    let kayak = app.experience(10, 5_000).await;

    // Sunday 1 March.
    let first = app
        .book(UserId::new(), &sailing, date(3, 15), 2)
        .await
        .unwrap();
    app.pay(&first).await;

    // Monday 2 March starts a new week.
    app.clock.advance(Duration::days(1));
    app.book(UserId::new(), &sailing, date(3, 15), 1)
        .await
        .unwrap();
    let third = app
        .book(UserId::new(), &kayak, date(3, 20), 1)
        .await
        .unwrap();
    app.pay(&third).await;
    app.engine
        .open_booking_dispute(
            &RequestContext::traveler(third.traveler_id),
            third.id,
            OpenDisputeRequest::new(BookingDisputeReason::NotAsDescribed, "The kayak had a hole in it"),
        )
        .await
        .unwrap();

    let all = app
        .engine
        .statistics(&app.admin, StatisticsScope::All)
        .await
        .unwrap();
    assert_eq!(all.total_bookings, 3);
    assert_eq!(all.by_status.get(&BookingStatus::Confirmed), Some(&1));
    assert_eq!(all.by_status.get(&BookingStatus::Pending), Some(&1));
    assert_eq!(all.by_status.get(&BookingStatus::Disputed), Some(&1));
    assert_eq!(all.by_payment_status.get(&BookingPaymentStatus::Paid), Some(&2));
    assert_eq!(all.created_today, 2);
    assert_eq!(all.created_this_week, 2);
    assert_eq!(all.created_this_month, 3);
    assert_eq!(all.paid_revenue.get("EUR"), Some(&25_000));
    assert_eq!(all.open_disputes, 1);
    assert_eq!(all.pending_transfers, 2);
    assert_eq!(all.pending_transfer_amount, 17_000 + 4_250);

    let provider = RequestContext::provider(sailing.provider_id);
    let own = app
        .engine
        .statistics(&provider, StatisticsScope::Provider(sailing.provider_id))
        .await
        .unwrap();
    assert_eq!(own.total_bookings, 2);
    assert_eq!(own.paid_revenue.get("EUR"), Some(&20_000));
    assert_eq!(own.open_disputes, 0);
    assert_eq!(own.pending_transfers, 1);
    assert_eq!(own.pending_transfer_amount, 17_000);
}

#[tokio::test]
async fn test_transfers_and_archives_leave_the_snapshot() {
    let app = TestApp::new();
    let sailing = app.experience(10, 10_000).await;
    let paid = app
        .book(UserId::new(), &sailing, date(3, 15), 1)
        .await
        .unwrap();
    let payment = app.pay(&paid).await;
    let cancelled = app
        .book(UserId::new(), &sailing, date(3, 15), 1)
        .await
        .unwrap();
    app.engine
        .cancel_booking(&app.admin, cancelled.id, None)
        .await
        .unwrap();

    app.engine
        .transfer_payment(&app.admin, payment.id, "payout-1")
        .await
        .unwrap();
    app.engine
        .bookings()
        .archive(&app.admin, cancelled.id)
        .await
        .unwrap();

    let stats = app
        .engine
        .statistics(&app.admin, StatisticsScope::All)
        .await
        .unwrap();
    assert_eq!(stats.total_bookings, 1);
    assert_eq!(stats.by_status.get(&BookingStatus::Cancelled), None);
    assert_eq!(stats.pending_transfers, 0);
    assert_eq!(stats.pending_transfer_amount, 0);
}

#[tokio::test]
async fn test_scope_authorization() {
    let app = TestApp::new();
    let sailing = app.experience(10, 10_000).await;
    let other_provider = RequestContext::provider(UserId::new());

    let err = app
        .engine
        .statistics(&other_provider, StatisticsScope::All)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let err = app
        .engine
        .statistics(&other_provider, StatisticsScope::Provider(sailing.provider_id))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let empty = app
        .engine
        .statistics(&app.admin, StatisticsScope::Provider(sailing.provider_id))
        .await
        .unwrap();
    assert_eq!(empty.total_bookings, 0);
    assert!(empty.paid_revenue.is_empty());

    assert!(
        app.engine
            .statistics(&RequestContext::system(), StatisticsScope::All)
            .await
            .is_ok()
    );
}
