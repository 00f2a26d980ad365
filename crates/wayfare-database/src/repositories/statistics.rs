//! Statistics queries on PostgreSQL.
//!
//! Each figure is its own statement outside a transaction; the snapshot
//! may mix slightly different instants.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use wayfare_core::error::AppError;
use wayfare_entity::booking::{BookingPaymentStatus, BookingStatus};

use crate::error::db_err;
use crate::store::statistics::{BookingStatistics, StatisticsQuery, StatisticsStore};

/// Provider filter shared by every statement; `$1` is the optional provider.
const BOOKING_SCOPE: &str = "deleted_at IS NULL AND ($1::uuid IS NULL OR provider_id = $1)";

/// Repository for read-side booking statistics.
#[derive(Debug, Clone)]
pub struct StatisticsRepository {
    pool: PgPool,
}

impl StatisticsRepository {
    /// Create a new statistics repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatisticsStore for StatisticsRepository {
    async fn collect(&self, query: &StatisticsQuery) -> Result<BookingStatistics, AppError> {
        let by_status = sqlx::query_as::<_, (BookingStatus, i64)>(&format!(
            "SELECT status, COUNT(*) FROM bookings WHERE {BOOKING_SCOPE} GROUP BY status"
        ))
        .bind(query.provider_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to count bookings by status"))?;

        let by_payment_status = sqlx::query_as::<_, (BookingPaymentStatus, i64)>(&format!(
            "SELECT payment_status, COUNT(*) FROM bookings WHERE {BOOKING_SCOPE} \
             GROUP BY payment_status"
        ))
        .bind(query.provider_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to count bookings by payment status"))?;

        let (total_bookings, created_today, created_this_week, created_this_month) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(&format!(
                "SELECT COUNT(*), \
                        COUNT(*) FILTER (WHERE created_at >= $2), \
                        COUNT(*) FILTER (WHERE created_at >= $3), \
                        COUNT(*) FILTER (WHERE created_at >= $4) \
                 FROM bookings WHERE {BOOKING_SCOPE}"
            ))
            .bind(query.provider_id)
            .bind(query.day_start)
            .bind(query.week_start)
            .bind(query.month_start)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Failed to count bookings by period"))?;

        let paid_revenue = sqlx::query_as::<_, (String, i64)>(&format!(
            "SELECT currency, COALESCE(SUM(total_amount), 0)::BIGINT FROM bookings \
             WHERE payment_status = 'paid' AND {BOOKING_SCOPE} GROUP BY currency"
        ))
        .bind(query.provider_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err("Failed to sum paid revenue"))?;

        let open_disputes: i64 = sqlx::query_scalar(
            "SELECT \
               (SELECT COUNT(*) FROM booking_disputes d JOIN bookings b ON b.id = d.booking_id \
                 WHERE d.status IN ('open', 'in_review') \
                   AND ($1::uuid IS NULL OR b.provider_id = $1)) \
             + (SELECT COUNT(*) FROM payment_disputes d JOIN payments p ON p.id = d.payment_id \
                 WHERE d.status IN ('open', 'in_review') \
                   AND ($1::uuid IS NULL OR p.provider_id = $1))",
        )
        .bind(query.provider_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count open disputes"))?;

        let (pending_transfers, pending_transfer_amount) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COALESCE(SUM(provider_amount), 0)::BIGINT FROM payments \
             WHERE status = 'completed' AND transferred_at IS NULL \
               AND ($1::uuid IS NULL OR provider_id = $1)",
        )
        .bind(query.provider_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err("Failed to count pending transfers"))?;

        debug!(
            provider_id = ?query.provider_id,
            total_bookings,
            open_disputes,
            "Collected booking statistics"
        );

        Ok(BookingStatistics {
            total_bookings,
            by_status: by_status.into_iter().collect(),
            by_payment_status: by_payment_status.into_iter().collect(),
            created_today,
            created_this_week,
            created_this_month,
            paid_revenue: paid_revenue.into_iter().collect(),
            open_disputes,
            pending_transfers,
            pending_transfer_amount,
        })
    }
}
