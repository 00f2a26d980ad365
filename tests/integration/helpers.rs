//! Shared test helpers for integration tests.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use wayfare_core::clock::FixedClock;
use wayfare_core::config::BookingConfig;
use wayfare_core::types::id::{BookingId, ExperienceId, UserId};
use wayfare_database::store::BookingStore;
use wayfare_database::{MemoryExperienceCatalog, MemoryStore};
use wayfare_entity::booking::Booking;
use wayfare_entity::experience::{Experience, ExperienceStatus};
use wayfare_entity::payment::Payment;
use wayfare_service::{
    BookingEngine, CreateBookingRequest, EngineStores, MemoryEventBus, RequestContext,
};

/// Test application context over the in-memory backend.
pub struct TestApp {
    /// The engine under test
    pub engine: BookingEngine,
    /// The engine's clock
    pub clock: Arc<FixedClock>,
    /// Shared in-memory store
    pub store: MemoryStore,
    /// Experience catalog
    pub catalog: MemoryExperienceCatalog,
    /// Event bus the engine publishes to
    pub bus: MemoryEventBus,
    /// An admin actor
    pub admin: RequestContext,
}

impl TestApp {
    /// Create a new test application with the default booking policy
    pub fn new() -> Self {
        Self::with_config(BookingConfig::default())
    }

    /// Create a new test application with a custom booking policy
    pub fn with_config(config: BookingConfig) -> Self {
        Self::build(config, |store| Arc::new(store) as Arc<dyn BookingStore>)
    }

    /// Create a test application whose booking store is `wrap` applied to
    /// the shared in-memory store
    pub fn with_booking_store(wrap: impl FnOnce(MemoryStore) -> Arc<dyn BookingStore>) -> Self {
        Self::build(BookingConfig::default(), wrap)
    }

    fn build(
        config: BookingConfig,
        wrap: impl FnOnce(MemoryStore) -> Arc<dyn BookingStore>,
    ) -> Self {
        let clock = Arc::new(FixedClock::new(start_time()));
        let store = MemoryStore::new();
        let catalog = MemoryExperienceCatalog::new();
        let bus = MemoryEventBus::new(256);
        let mut stores = EngineStores::memory(store.clone(), catalog.clone());
        stores.bookings = wrap(store.clone());
        let engine = BookingEngine::new(
            stores,
            Arc::new(bus.clone()),
            clock.clone(),
            config,
        )
        .expect("valid booking config");

        Self {
            engine,
            clock,
            store,
            catalog,
            bus,
            admin: RequestContext::admin(UserId::new()),
        }
    }

    /// Register an approved experience with the given capacity and price
    pub async fn experience(&self, max_participants: i32, price: i64) -> Experience {
        let experience = Experience {
            id: ExperienceId::new(),
            provider_id: UserId::new(),
            title: "Sunset sailing".to_string(),
            price,
            currency: "EUR".to_string(),
            min_participants: 1,
            max_participants,
            status: ExperienceStatus::Approved,
            bookings_count: 0,
            created_at: start_time(),
            updated_at: start_time(),
        };
        self.catalog.upsert(experience.clone()).await;
        experience
    }

    /// Book `participants` seats as `traveler`
    pub async fn book(
        &self,
        traveler: UserId,
        experience: &Experience,
        date: NaiveDate,
        participants: i32,
    ) -> Result<Booking, wayfare_core::error::AppError> {
        self.engine
            .create_booking(
                &RequestContext::traveler(traveler),
                CreateBookingRequest::new(experience.id, date, participants),
            )
            .await
    }

    /// Initiate and capture the payment of a booking
    pub async fn pay(&self, booking: &Booking) -> Payment {
        let payment = self
            .engine
            .payments()
            .initiate(
                &RequestContext::traveler(booking.traveler_id),
                booking.id,
                Some("card".to_string()),
            )
            .await
            .expect("payment initiated");
        self.engine
            .payments()
            .complete(&RequestContext::system(), payment.id)
            .await
            .expect("payment completed")
    }

    /// Reload a booking as admin
    pub async fn booking(&self, id: BookingId) -> Booking {
        self.engine
            .get_booking(&self.admin, id)
            .await
            .expect("booking exists")
    }

    /// Remaining capacity of a slot
    pub async fn remaining(&self, experience: &Experience, date: NaiveDate) -> i32 {
        self.engine
            .check_availability(experience.id, date, 1)
            .await
            .expect("availability")
            .remaining
    }
}

/// The instant every test starts at
pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
}

/// A date in the test calendar
pub fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, month, day).unwrap()
}
