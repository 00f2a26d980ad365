//! Dispute persistence.

use async_trait::async_trait;

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, DisputeId, PaymentId};
use wayfare_entity::dispute::{
    BookingDispute, DisputeStatus, DisputeUpdate, PaymentDispute, PaymentDisputeStatus,
};

/// Persistence for booking and payment disputes.
///
/// At most one open or in-review dispute may exist per booking and per
/// payment; a second insert is a `Conflict`.
#[async_trait]
pub trait DisputeStore: Send + Sync + std::fmt::Debug {
    /// Insert an open booking dispute.
    async fn insert_booking_dispute(
        &self,
        dispute: &BookingDispute,
    ) -> Result<BookingDispute, AppError>;

    /// Remove a booking dispute that is still `open`. Used when the booking
    /// could not be moved to `disputed` after the insert.
    async fn discard_booking_dispute(&self, id: DisputeId) -> Result<bool, AppError>;

    /// Find a booking dispute by ID.
    async fn find_booking_dispute(&self, id: DisputeId)
    -> Result<Option<BookingDispute>, AppError>;

    /// The unresolved dispute on a booking, if any.
    async fn active_booking_dispute(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingDispute>, AppError>;

    /// All disputes on a booking, oldest first.
    async fn list_booking_disputes(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<BookingDispute>, AppError>;

    /// Apply a status change if the dispute is still in `update.from`.
    async fn update_booking_dispute(
        &self,
        update: &DisputeUpdate<DisputeStatus>,
    ) -> Result<Option<BookingDispute>, AppError>;

    /// Insert an open payment dispute.
    async fn insert_payment_dispute(
        &self,
        dispute: &PaymentDispute,
    ) -> Result<PaymentDispute, AppError>;

    /// Find a payment dispute by ID.
    async fn find_payment_dispute(&self, id: DisputeId)
    -> Result<Option<PaymentDispute>, AppError>;

    /// The unresolved dispute on a payment, if any.
    async fn active_payment_dispute(
        &self,
        payment_id: PaymentId,
    ) -> Result<Option<PaymentDispute>, AppError>;

    /// All disputes on a payment, oldest first.
    async fn list_payment_disputes(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentDispute>, AppError>;

    /// Apply a status change if the dispute is still in `update.from`.
    async fn update_payment_dispute(
        &self,
        update: &DisputeUpdate<PaymentDisputeStatus>,
    ) -> Result<Option<PaymentDispute>, AppError>;
}
