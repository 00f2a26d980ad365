use async_trait::async_trait;

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, UserId};
use wayfare_entity::booking::BookingPaymentStatus;

use super::MemoryStore;
use crate::store::statistics::{BookingStatistics, StatisticsQuery, StatisticsStore};

#[async_trait]
impl StatisticsStore for MemoryStore {
    async fn collect(&self, query: &StatisticsQuery) -> Result<BookingStatistics, AppError> {
        let tables = self.tables.lock().await;
        let in_scope = |provider_id: UserId| query.provider_id.is_none_or(|p| p == provider_id);
        let mut stats = BookingStatistics::default();

        for booking in tables
            .bookings
            .values()
            .filter(|b| !b.is_deleted() && in_scope(b.provider_id))
        {
            stats.total_bookings += 1;
            *stats.by_status.entry(booking.status).or_default() += 1;
            *stats
                .by_payment_status
                .entry(booking.payment_status)
                .or_default() += 1;
            if booking.created_at >= query.day_start {
                stats.created_today += 1;
            }
            if booking.created_at >= query.week_start {
                stats.created_this_week += 1;
            }
            if booking.created_at >= query.month_start {
                stats.created_this_month += 1;
            }
            if booking.payment_status == BookingPaymentStatus::Paid {
                *stats
                    .paid_revenue
                    .entry(booking.currency.clone())
                    .or_default() += booking.total_amount;
            }
        }

        let booking_provider =
            |booking_id: BookingId| tables.bookings.get(&booking_id).map(|b| b.provider_id);
        stats.open_disputes += tables
            .booking_disputes
            .values()
            .filter(|d| d.status.is_active())
            .filter(|d| booking_provider(d.booking_id).is_some_and(in_scope))
            .count() as i64;
        stats.open_disputes += tables
            .payment_disputes
            .values()
            .filter(|d| d.status.is_active())
            .filter(|d| {
                tables
                    .payments
                    .get(&d.payment_id)
                    .is_some_and(|p| in_scope(p.provider_id))
            })
            .count() as i64;

        for payment in tables
            .payments
            .values()
            .filter(|p| p.is_awaiting_transfer() && in_scope(p.provider_id))
        {
            stats.pending_transfers += 1;
            stats.pending_transfer_amount += payment.provider_amount.unwrap_or(0);
        }

        Ok(stats)
    }
}
