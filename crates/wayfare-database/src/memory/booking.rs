use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, UserId};
use wayfare_core::types::pagination::{PageRequest, PageResponse};
use wayfare_entity::booking::{
    Booking, BookingPaymentStatus, BookingStatus, BookingTransition, NewBooking,
};
use wayfare_entity::capacity::{CapacitySlot, SlotDrift, SlotKey};

use super::{MemoryStore, Tables};
use crate::store::booking::{BookingStore, ReserveOutcome};

fn held_in_slot(tables: &Tables, key: SlotKey) -> i32 {
    tables
        .bookings
        .values()
        .filter(|b| {
            b.experience_id == key.experience_id
                && b.booking_date == key.booking_date
                && b.status.holds_capacity()
        })
        .map(|b| b.participants_count)
        .sum()
}

fn newest_first<'a>(iter: impl Iterator<Item = &'a Booking>) -> Vec<Booking> {
    let mut bookings: Vec<Booking> = iter.cloned().collect();
    bookings.sort_by(|a, b| b.booking_number.cmp(&a.booking_number));
    bookings
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn reserve(
        &self,
        booking: &NewBooking,
        max_participants: i32,
    ) -> Result<ReserveOutcome, AppError> {
        let mut tables = self.tables.lock().await;
        let key = SlotKey::new(booking.experience_id, booking.booking_date);

        let reserved = tables
            .slots
            .get(&key)
            .map(|s| s.reserved_participants)
            .unwrap_or(0);
        if reserved + booking.participants_count > max_participants {
            return Ok(ReserveOutcome::Insufficient {
                remaining: (max_participants - reserved).max(0),
            });
        }

        let slot = tables.slots.entry(key).or_insert_with(|| CapacitySlot {
            experience_id: key.experience_id,
            booking_date: key.booking_date,
            reserved_participants: 0,
            updated_at: booking.created_at,
        });
        slot.reserved_participants += booking.participants_count;
        slot.updated_at = booking.created_at;
        let slot = slot.clone();

        tables.last_booking_number += 1;
        let stored = booking.clone().into_booking(tables.last_booking_number);
        tables.bookings.insert(stored.id, stored.clone());

        Ok(ReserveOutcome::Reserved {
            booking: stored,
            slot,
        })
    }

    async fn find_by_id(&self, id: BookingId) -> Result<Option<Booking>, AppError> {
        Ok(self.tables.lock().await.live_booking(id).cloned())
    }

    async fn find_by_number(&self, booking_number: i64) -> Result<Option<Booking>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .values()
            .find(|b| b.booking_number == booking_number && !b.is_deleted())
            .cloned())
    }

    async fn list_by_traveler(
        &self,
        traveler_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        let tables = self.tables.lock().await;
        let all = newest_first(
            tables
                .bookings
                .values()
                .filter(|b| b.traveler_id == traveler_id && !b.is_deleted()),
        );
        Ok(PageResponse::from_slice(&all, page))
    }

    async fn list_by_provider(
        &self,
        provider_id: UserId,
        page: &PageRequest,
    ) -> Result<PageResponse<Booking>, AppError> {
        let tables = self.tables.lock().await;
        let all = newest_first(
            tables
                .bookings
                .values()
                .filter(|b| b.provider_id == provider_id && !b.is_deleted()),
        );
        Ok(PageResponse::from_slice(&all, page))
    }

    async fn find_slot(&self, key: SlotKey) -> Result<Option<CapacitySlot>, AppError> {
        Ok(self.tables.lock().await.slots.get(&key).cloned())
    }

    async fn apply_transition(
        &self,
        transition: &BookingTransition,
    ) -> Result<Option<Booking>, AppError> {
        let mut tables = self.tables.lock().await;
        let Some(booking) = tables
            .bookings
            .get_mut(&transition.booking_id)
            .filter(|b| b.status == transition.from && !b.is_deleted())
        else {
            return Ok(None);
        };

        booking.apply_transition(transition);
        let updated = booking.clone();

        if transition.releases_capacity() {
            let key = SlotKey::new(updated.experience_id, updated.booking_date);
            match tables.slots.get_mut(&key) {
                Some(slot) => {
                    slot.reserved_participants =
                        (slot.reserved_participants - updated.participants_count).max(0);
                    slot.updated_at = transition.at;
                    debug!(
                        booking_id = %updated.id,
                        reserved = slot.reserved_participants,
                        "Released slot capacity"
                    );
                }
                None => warn!(booking_id = %updated.id, "Releasing capacity of a missing slot"),
            }
        }

        Ok(Some(updated))
    }

    async fn set_payment_status(
        &self,
        id: BookingId,
        payment_status: BookingPaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .get_mut(&id)
            .filter(|b| !b.is_deleted())
            .map(|b| {
                b.payment_status = payment_status;
                b.updated_at = at;
                b.clone()
            }))
    }

    async fn soft_delete(
        &self,
        id: BookingId,
        at: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .bookings
            .get_mut(&id)
            .filter(|b| !b.is_deleted() && b.status.is_terminal())
            .map(|b| {
                b.deleted_at = Some(at);
                b.updated_at = at;
                b.clone()
            }))
    }

    async fn find_stale_pending(
        &self,
        created_before: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError> {
        let tables = self.tables.lock().await;
        let mut stale: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| {
                b.status == BookingStatus::Pending
                    && b.created_at < created_before
                    && !b.is_deleted()
            })
            .cloned()
            .collect();
        stale.sort_by_key(|b| b.created_at);
        stale.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(stale)
    }

    async fn find_completable(
        &self,
        date: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError> {
        let tables = self.tables.lock().await;
        let mut due: Vec<Booking> = tables
            .bookings
            .values()
            .filter(|b| {
                b.status == BookingStatus::Confirmed && b.booking_date <= date && !b.is_deleted()
            })
            .cloned()
            .collect();
        due.sort_by_key(|b| (b.booking_date, b.booking_number));
        due.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(due)
    }

    async fn list_slot_keys(&self, from: NaiveDate, limit: i64) -> Result<Vec<SlotKey>, AppError> {
        let tables = self.tables.lock().await;
        let mut keys: Vec<SlotKey> = tables
            .slots
            .keys()
            .filter(|k| k.booking_date >= from)
            .copied()
            .collect();
        keys.sort();
        keys.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(keys)
    }

    async fn reconcile_slot(
        &self,
        key: SlotKey,
        at: DateTime<Utc>,
    ) -> Result<Option<SlotDrift>, AppError> {
        let mut tables = self.tables.lock().await;
        let actual = held_in_slot(&tables, key);
        let Some(slot) = tables.slots.get_mut(&key) else {
            return Ok(None);
        };
        if slot.reserved_participants == actual {
            return Ok(None);
        }
        let drift = SlotDrift {
            key,
            recorded: slot.reserved_participants,
            actual,
        };
        slot.reserved_participants = actual;
        slot.updated_at = at;
        Ok(Some(drift))
    }
}

impl MemoryStore {
    /// Overwrite a slot counter. Lets tests simulate drift left behind by a
    /// crashed writer.
    pub async fn force_slot_counter(&self, key: SlotKey, reserved: i32, at: DateTime<Utc>) {
        let mut tables = self.tables.lock().await;
        let slot = tables.slots.entry(key).or_insert_with(|| CapacitySlot {
            experience_id: key.experience_id,
            booking_date: key.booking_date,
            reserved_participants: 0,
            updated_at: at,
        });
        slot.reserved_participants = reserved;
        slot.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_core::types::id::ExperienceId;

    fn new_booking(experience_id: ExperienceId, participants: i32) -> NewBooking {
        NewBooking {
            id: BookingId::new(),
            experience_id,
            traveler_id: UserId::new(),
            provider_id: UserId::new(),
            booking_date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            booking_time: None,
            participants_count: participants,
            unit_price: 1_000,
            total_amount: 1_000 * i64::from(participants),
            currency: "EUR".to_string(),
            payment_method: None,
            special_requests: None,
            metadata: serde_json::json!({}),
            created_at: DateTime::from_timestamp(1_780_000_000, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_reserve_refuses_overflow_without_writing() {
        let store = MemoryStore::new();
        let experience_id = ExperienceId::new();

        let first = store.reserve(&new_booking(experience_id, 4), 5).await.unwrap();
        assert!(matches!(first, ReserveOutcome::Reserved { ref slot, .. } if slot.reserved_participants == 4));

        let second = store.reserve(&new_booking(experience_id, 2), 5).await.unwrap();
        assert!(matches!(second, ReserveOutcome::Insufficient { remaining: 1 }));

        let slot = store
            .find_slot(SlotKey::new(experience_id, NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(slot.reserved_participants, 4);
    }

    #[tokio::test]
    async fn test_booking_numbers_increase() {
        let store = MemoryStore::new();
        let experience_id = ExperienceId::new();
        let mut numbers = Vec::new();
        for _ in 0..3 {
            if let ReserveOutcome::Reserved { booking, .. } =
                store.reserve(&new_booking(experience_id, 1), 10).await.unwrap()
            {
                numbers.push(booking.booking_number);
            }
        }
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stale_transition_is_rejected() {
        let store = MemoryStore::new();
        let ReserveOutcome::Reserved { booking, .. } = store
            .reserve(&new_booking(ExperienceId::new(), 2), 5)
            .await
            .unwrap()
        else {
            panic!("expected reservation");
        };

        let cancel = BookingTransition::new(&booking, BookingStatus::Cancelled, booking.created_at);
        assert!(store.apply_transition(&cancel).await.unwrap().is_some());
        // Same observed status again: the CAS no longer matches.
        assert!(store.apply_transition(&cancel).await.unwrap().is_none());

        let slot = store
            .find_slot(SlotKey::new(booking.experience_id, booking.booking_date))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(slot.reserved_participants, 0);
    }

    #[tokio::test]
    async fn test_reconcile_repairs_drift() {
        let store = MemoryStore::new();
        let nb = new_booking(ExperienceId::new(), 3);
        let key = SlotKey::new(nb.experience_id, nb.booking_date);
        store.reserve(&nb, 10).await.unwrap();
        store.force_slot_counter(key, 7, nb.created_at).await;

        let drift = store.reconcile_slot(key, nb.created_at).await.unwrap();
        assert_eq!(
            drift,
            Some(SlotDrift {
                key,
                recorded: 7,
                actual: 3
            })
        );
        assert!(store.reconcile_slot(key, nb.created_at).await.unwrap().is_none());
    }
}
