//! Booking statistics for admins and providers.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use wayfare_core::clock::Clock;
use wayfare_core::error::AppError;
use wayfare_core::types::id::UserId;
use wayfare_database::store::{BookingStatistics, StatisticsQuery, StatisticsStore};

use crate::context::RequestContext;

/// Which bookings a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "provider_id", rename_all = "snake_case")]
pub enum StatisticsScope {
    /// The whole platform. Admins only.
    All,
    /// One provider's bookings.
    Provider(UserId),
}

/// Read-only statistics over bookings, payments, and disputes.
#[derive(Debug, Clone)]
pub struct StatisticsService {
    store: Arc<dyn StatisticsStore>,
    clock: Arc<dyn Clock>,
}

impl StatisticsService {
    /// Creates a new statistics service.
    pub fn new(store: Arc<dyn StatisticsStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Snapshot for `scope`. Time buckets are relative to the engine clock
    /// and use UTC calendar boundaries; weeks start on Monday.
    pub async fn statistics(
        &self,
        ctx: &RequestContext,
        scope: StatisticsScope,
    ) -> Result<BookingStatistics, AppError> {
        let provider_id = match scope {
            StatisticsScope::All if ctx.is_privileged() => None,
            StatisticsScope::All => {
                return Err(AppError::forbidden("Platform statistics are for admins"));
            }
            StatisticsScope::Provider(id) if ctx.is_privileged() || ctx.is_user(id) => Some(id),
            StatisticsScope::Provider(_) => {
                return Err(AppError::forbidden("Cannot read another provider's statistics"));
            }
        };

        let query = buckets(provider_id, self.clock.today());
        debug!(provider_id = ?provider_id, day_start = %query.day_start, "Collecting statistics");
        self.store.collect(&query).await
    }
}

fn buckets(provider_id: Option<UserId>, today: NaiveDate) -> StatisticsQuery {
    let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
    let month_start = today.with_day(1).unwrap_or(today);
    StatisticsQuery {
        provider_id,
        day_start: midnight(today),
        week_start: midnight(week_start),
        month_start: midnight(month_start),
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}
