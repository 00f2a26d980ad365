//! Capacity ledger behavior through the engine.

use wayfare_core::clock::Clock;
use wayfare_core::error::ErrorKind;
use wayfare_core::types::id::UserId;
use wayfare_entity::experience::ExperienceStatus;

use crate::helpers::{TestApp, date};

#[tokio::test]
async fn test_five_seat_slot_scenario() {
    let app = TestApp::new();
    let experience = app.experience(5, 4_000).await;
    let day = date(3, 15);
    let traveler_a = UserId::new();
    let traveler_b = UserId::new();

    let booking_a = app.book(traveler_a, &experience, day, 3).await.unwrap();
    assert_eq!(app.remaining(&experience, day).await, 2);

    let err = app.book(traveler_b, &experience, day, 3).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::CapacityExceeded);

    app.engine
        .cancel_booking(
            &wayfare_service::RequestContext::traveler(traveler_a),
            booking_a.id,
            None,
        )
        .await
        .unwrap();
    assert_eq!(app.remaining(&experience, day).await, 5);

    app.book(traveler_b, &experience, day, 3).await.unwrap();
    assert_eq!(app.remaining(&experience, day).await, 2);
}

#[tokio::test]
async fn test_slots_are_per_date() {
    let app = TestApp::new();
    let experience = app.experience(4, 1_000).await;
    app.book(UserId::new(), &experience, date(3, 20), 4)
        .await
        .unwrap();
    app.book(UserId::new(), &experience, date(3, 21), 4)
        .await
        .unwrap();
    assert_eq!(app.remaining(&experience, date(3, 20)).await, 0);
    assert_eq!(app.remaining(&experience, date(3, 22)).await, 4);
}

#[tokio::test]
async fn test_participant_bounds() {
    let app = TestApp::new();
    let mut experience = app.experience(6, 1_000).await;
    experience.min_participants = 2;
    app.catalog.upsert(experience.clone()).await;

    let err = app
        .book(UserId::new(), &experience, date(3, 10), 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::BelowMinimumParticipants);

    let err = app
        .book(UserId::new(), &experience, date(3, 10), 7)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::AboveMaximumParticipants);

    let err = app
        .book(UserId::new(), &experience, date(3, 10), 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
}

#[tokio::test]
async fn test_unapproved_experience_is_not_bookable() {
    let app = TestApp::new();
    let experience = app.experience(6, 1_000).await;
    app.catalog
        .set_status(experience.id, ExperienceStatus::Draft, app.clock.now())
        .await;

    let err = app
        .book(UserId::new(), &experience, date(3, 10), 2)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::ExperienceNotBookable);

    let availability = app
        .engine
        .check_availability(experience.id, date(3, 10), 2)
        .await
        .unwrap();
    assert!(!availability.available);
    assert_eq!(
        availability.unavailable_reason,
        Some(ErrorKind::ExperienceNotBookable)
    );
}

#[tokio::test]
async fn test_price_is_frozen_at_booking_time() {
    let app = TestApp::new();
    let experience = app.experience(6, 2_500).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 10), 2)
        .await
        .unwrap();

    app.catalog
        .set_price(experience.id, 9_900, app.clock.now())
        .await;

    let reloaded = app.booking(booking.id).await;
    assert_eq!(reloaded.unit_price, 2_500);
    assert_eq!(reloaded.total_amount, 5_000);
}

#[tokio::test]
async fn test_no_drift_after_full_lifecycle() {
    let app = TestApp::new();
    let experience = app.experience(3, 1_000).await;
    let booking = app
        .book(UserId::new(), &experience, date(3, 2), 3)
        .await
        .unwrap();
    app.pay(&booking).await;

    app.clock.advance(chrono::Duration::days(1));
    app.engine
        .bookings()
        .complete(&wayfare_service::RequestContext::system(), booking.id)
        .await
        .unwrap();

    assert_eq!(app.remaining(&experience, date(3, 2)).await, 3);
    let report = app.engine.ledger().reconcile_slots(100).await.unwrap();
    assert_eq!(report.checked, 1);
    assert!(report.repaired.is_empty());
}
