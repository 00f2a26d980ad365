//! Booking lifecycle through the engine.

use wayfare_core::clock::Clock;
use wayfare_core::error::ErrorKind;
use wayfare_core::events::{BookingEvent, EventPayload};
use wayfare_core::types::id::UserId;
use wayfare_core::types::pagination::PageRequest;
use wayfare_entity::booking::{BookingPaymentStatus, BookingStatus};
use wayfare_service::RequestContext;

use crate::helpers::{TestApp, date};

#[tokio::test]
async fn test_paid_booking_is_confirmed_then_completed() {
    let app = TestApp::new();
    let experience = app.experience(8, 3_000).await;
    let traveler = UserId::new();
    let booking = app
        .book(traveler, &experience, date(3, 5), 2)
        .await
        .unwrap();
    assert_eq!(booking.booking_number, 1);

    app.pay(&booking).await;
    let confirmed = app.booking(booking.id).await;
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.payment_status, BookingPaymentStatus::Paid);

    app.clock.advance(chrono::Duration::days(4));
    let provider = RequestContext::provider(experience.provider_id);
    let completed = app
        .engine
        .bookings()
        .complete(&provider, booking.id)
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    let err = app
        .engine
        .cancel_booking(&RequestContext::traveler(traveler), booking.id, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotCancellable);
}

#[tokio::test]
async fn test_terminal_states_reject_admin_moves() {
    let app = TestApp::new();
    let experience = app.experience(8, 3_000).await;
    let traveler = UserId::new();
    let booking = app
        .book(traveler, &experience, date(3, 5), 2)
        .await
        .unwrap();
    app.engine
        .cancel_booking(&RequestContext::traveler(traveler), booking.id, None)
        .await
        .unwrap();

    for status in [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Disputed,
        BookingStatus::Cancelled,
    ] {
        let err = app
            .engine
            .update_booking_status(&app.admin, booking.id, status, None)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidStateTransition, "{status}");
    }

    let refunded = app
        .engine
        .update_booking_status(&app.admin, booking.id, BookingStatus::Refunded, None)
        .await
        .unwrap();
    assert_eq!(refunded.status, BookingStatus::Refunded);
    assert!(refunded.refunded_at.is_some());
}

#[tokio::test]
async fn test_admin_cancel_records_actor_and_reason() {
    let app = TestApp::new();
    let experience = app.experience(8, 3_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 6), 1)
        .await
        .unwrap();

    let cancelled = app
        .engine
        .cancel_booking(&app.admin, booking.id, Some("Provider unavailable".into()))
        .await
        .unwrap();
    assert_eq!(cancelled.cancelled_by, app.admin.user_id);
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("Provider unavailable")
    );
    assert_eq!(cancelled.cancelled_at, Some(app.clock.now()));
}

#[tokio::test]
async fn test_visibility_and_listing() {
    let app = TestApp::new();
    let experience = app.experience(8, 3_000).await;
    let traveler = UserId::new();
    for day in 10..13 {
        app.book(traveler, &experience, date(3, day), 1)
            .await
            .unwrap();
    }
    let other = app
        .book(UserId::new(), &experience, date(3, 10), 1)
        .await
        .unwrap();

    let ctx = RequestContext::traveler(traveler);
    let page = app
        .engine
        .bookings()
        .list_for_traveler(&ctx, traveler, PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_items, 3);

    let err = app.engine.get_booking(&ctx, other.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);

    let provider = RequestContext::provider(experience.provider_id);
    let page = app
        .engine
        .bookings()
        .list_for_provider(&provider, experience.provider_id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_items, 4);

    let by_number = app
        .engine
        .bookings()
        .get_by_number(&provider, other.booking_number)
        .await
        .unwrap();
    assert_eq!(by_number.id, other.id);
}

#[tokio::test]
async fn test_archive_hides_terminal_bookings() {
    let app = TestApp::new();
    let experience = app.experience(8, 3_000).await;
    let traveler = UserId::new();
    let booking = app
        .book(traveler, &experience, date(3, 6), 1)
        .await
        .unwrap();

    let err = app
        .engine
        .bookings()
        .archive(&app.admin, booking.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidStateTransition);

    app.engine
        .cancel_booking(&RequestContext::traveler(traveler), booking.id, None)
        .await
        .unwrap();
    let archived = app
        .engine
        .bookings()
        .archive(&app.admin, booking.id)
        .await
        .unwrap();
    assert!(archived.deleted_at.is_some());

    let err = app.engine.get_booking(&app.admin, booking.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_events_follow_the_lifecycle() {
    let app = TestApp::new();
    let mut events = app.bus.subscribe();
    let experience = app.experience(8, 3_000).await;
    let traveler = UserId::new();
    let booking = app
        .book(traveler, &experience, date(3, 6), 1)
        .await
        .unwrap();
    app.engine
        .cancel_booking(&RequestContext::traveler(traveler), booking.id, Some("ill".into()))
        .await
        .unwrap();

    let created = events.recv().await.unwrap();
    assert!(matches!(
        created.payload,
        EventPayload::Booking(BookingEvent::Created { participants: 1, .. })
    ));
    assert_eq!(created.actor_id, Some(traveler));

    let cancelled = events.recv().await.unwrap();
    match cancelled.payload {
        EventPayload::Booking(BookingEvent::Cancelled { booking_id, reason }) => {
            assert_eq!(booking_id, booking.id);
            assert_eq!(reason.as_deref(), Some("ill"));
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn test_auto_completion_job_window() {
    let app = TestApp::with_config(wayfare_core::config::BookingConfig {
        auto_complete_after_days: Some(2),
        ..Default::default()
    });
    let experience = app.experience(8, 3_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 3), 1)
        .await
        .unwrap();
    app.pay(&booking).await;

    // 3 March + 2 days: not yet on the 4th.
    app.clock.advance(chrono::Duration::days(3));
    assert_eq!(app.engine.bookings().complete_due(50).await.unwrap(), 0);

    app.clock.advance(chrono::Duration::days(1));
    assert_eq!(app.engine.bookings().complete_due(50).await.unwrap(), 1);
    assert_eq!(
        app.booking(booking.id).await.status,
        BookingStatus::Completed
    );
}

#[tokio::test]
async fn test_pending_expiry_frees_unpaid_seats() {
    let app = TestApp::with_config(wayfare_core::config::BookingConfig {
        pending_expiry_minutes: Some(30),
        ..Default::default()
    });
    let experience = app.experience(4, 3_000).await;
    let unpaid = app
        .book(UserId::new(), &experience, date(3, 10), 3)
        .await
        .unwrap();
    let paid = app
        .book(UserId::new(), &experience, date(3, 10), 1)
        .await
        .unwrap();
    app.pay(&paid).await;
    assert_eq!(app.remaining(&experience, date(3, 10)).await, 0);

    app.clock.advance(chrono::Duration::minutes(30));
    assert_eq!(app.engine.bookings().expire_stale_pending(50).await.unwrap(), 0);

    app.clock.advance(chrono::Duration::minutes(1));
    assert_eq!(app.engine.bookings().expire_stale_pending(50).await.unwrap(), 1);
    assert_eq!(app.booking(unpaid.id).await.status, BookingStatus::Cancelled);
    assert_eq!(app.booking(paid.id).await.status, BookingStatus::Confirmed);
    assert_eq!(app.remaining(&experience, date(3, 10)).await, 3);
}

#[tokio::test]
async fn test_pending_expiry_disabled_by_default() {
    let app = TestApp::new();
    let experience = app.experience(4, 3_000).await;
    app.book(UserId::new(), &experience, date(3, 10), 2)
        .await
        .unwrap();

    app.clock.advance(chrono::Duration::days(7));
    assert_eq!(app.engine.bookings().expire_stale_pending(50).await.unwrap(), 0);
    assert_eq!(app.remaining(&experience, date(3, 10)).await, 2);
}
