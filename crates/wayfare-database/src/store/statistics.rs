//! Read-side booking statistics.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wayfare_core::error::AppError;
use wayfare_core::types::id::UserId;
use wayfare_entity::booking::{BookingPaymentStatus, BookingStatus};

/// Scope and time buckets for one statistics snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatisticsQuery {
    /// Restrict to one provider's bookings; `None` for the whole platform.
    pub provider_id: Option<UserId>,
    /// Start of the current day.
    pub day_start: DateTime<Utc>,
    /// Start of the current ISO week.
    pub week_start: DateTime<Utc>,
    /// Start of the current month.
    pub month_start: DateTime<Utc>,
}

/// A point-in-time statistics snapshot. May be slightly stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingStatistics {
    /// Live bookings in scope.
    pub total_bookings: i64,
    /// Booking counts per lifecycle status.
    pub by_status: HashMap<BookingStatus, i64>,
    /// Booking counts per payment status.
    pub by_payment_status: HashMap<BookingPaymentStatus, i64>,
    /// Bookings created since `day_start`.
    pub created_today: i64,
    /// Bookings created since `week_start`.
    pub created_this_week: i64,
    /// Bookings created since `month_start`.
    pub created_this_month: i64,
    /// Total amount of paid bookings, per currency.
    pub paid_revenue: BTreeMap<String, i64>,
    /// Open or in-review disputes of both kinds.
    pub open_disputes: i64,
    /// Completed payments not yet transferred.
    pub pending_transfers: i64,
    /// Sum of the provider shares awaiting transfer.
    pub pending_transfer_amount: i64,
}

/// Computes statistics snapshots.
#[async_trait]
pub trait StatisticsStore: Send + Sync + std::fmt::Debug {
    /// Collect a snapshot for the given scope.
    async fn collect(&self, query: &StatisticsQuery) -> Result<BookingStatistics, AppError>;
}
