//! In-memory backend.
//!
//! One tokio mutex guards every table, so each trait method is a single
//! critical section. That gives the same all-or-nothing behavior as the
//! PostgreSQL transactions for a single-node deployment or a test.

mod booking;
mod dispute;
mod experience;
mod payment;
mod statistics;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use wayfare_core::types::id::{BookingId, DisputeId, PaymentId};
use wayfare_entity::booking::Booking;
use wayfare_entity::capacity::{CapacitySlot, SlotKey};
use wayfare_entity::dispute::{BookingDispute, PaymentDispute};
use wayfare_entity::payment::{Payment, PaymentRefund};

pub use experience::MemoryExperienceCatalog;

/// Every table of the in-memory backend.
#[derive(Debug, Default)]
struct Tables {
    bookings: HashMap<BookingId, Booking>,
    last_booking_number: i64,
    slots: HashMap<SlotKey, CapacitySlot>,
    payments: HashMap<PaymentId, Payment>,
    refunds: Vec<PaymentRefund>,
    booking_disputes: HashMap<DisputeId, BookingDispute>,
    payment_disputes: HashMap<DisputeId, PaymentDispute>,
}

impl Tables {
    fn live_booking(&self, id: BookingId) -> Option<&Booking> {
        self.bookings.get(&id).filter(|b| !b.is_deleted())
    }
}

/// In-memory implementation of the booking, payment, dispute, and
/// statistics stores.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}
