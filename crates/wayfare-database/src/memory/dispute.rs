use async_trait::async_trait;

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, DisputeId, PaymentId};
use wayfare_entity::dispute::{
    BookingDispute, DisputeStatus, DisputeUpdate, PaymentDispute, PaymentDisputeStatus,
};

use super::MemoryStore;
use crate::store::dispute::DisputeStore;

#[async_trait]
impl DisputeStore for MemoryStore {
    async fn insert_booking_dispute(
        &self,
        dispute: &BookingDispute,
    ) -> Result<BookingDispute, AppError> {
        let mut tables = self.tables.lock().await;
        if tables
            .booking_disputes
            .values()
            .any(|d| d.booking_id == dispute.booking_id && d.status.is_active())
        {
            return Err(AppError::conflict(format!(
                "Booking {} already has an unresolved dispute",
                dispute.booking_id
            )));
        }
        tables.booking_disputes.insert(dispute.id, dispute.clone());
        Ok(dispute.clone())
    }

    async fn discard_booking_dispute(&self, id: DisputeId) -> Result<bool, AppError> {
        let mut tables = self.tables.lock().await;
        let open = tables
            .booking_disputes
            .get(&id)
            .is_some_and(|d| d.status == DisputeStatus::Open);
        if open {
            tables.booking_disputes.remove(&id);
        }
        Ok(open)
    }

    async fn find_booking_dispute(
        &self,
        id: DisputeId,
    ) -> Result<Option<BookingDispute>, AppError> {
        Ok(self.tables.lock().await.booking_disputes.get(&id).cloned())
    }

    async fn active_booking_dispute(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<BookingDispute>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .booking_disputes
            .values()
            .find(|d| d.booking_id == booking_id && d.status.is_active())
            .cloned())
    }

    async fn list_booking_disputes(
        &self,
        booking_id: BookingId,
    ) -> Result<Vec<BookingDispute>, AppError> {
        let tables = self.tables.lock().await;
        let mut disputes: Vec<BookingDispute> = tables
            .booking_disputes
            .values()
            .filter(|d| d.booking_id == booking_id)
            .cloned()
            .collect();
        disputes.sort_by_key(|d| d.created_at);
        Ok(disputes)
    }

    async fn update_booking_dispute(
        &self,
        update: &DisputeUpdate<DisputeStatus>,
    ) -> Result<Option<BookingDispute>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .booking_disputes
            .get_mut(&update.dispute_id)
            .filter(|d| d.status == update.from)
            .map(|d| {
                d.apply_update(update);
                d.clone()
            }))
    }

    async fn insert_payment_dispute(
        &self,
        dispute: &PaymentDispute,
    ) -> Result<PaymentDispute, AppError> {
        let mut tables = self.tables.lock().await;
        if tables
            .payment_disputes
            .values()
            .any(|d| d.payment_id == dispute.payment_id && d.status.is_active())
        {
            return Err(AppError::conflict(format!(
                "Payment {} already has an unresolved dispute",
                dispute.payment_id
            )));
        }
        tables.payment_disputes.insert(dispute.id, dispute.clone());
        Ok(dispute.clone())
    }

    async fn find_payment_dispute(
        &self,
        id: DisputeId,
    ) -> Result<Option<PaymentDispute>, AppError> {
        Ok(self.tables.lock().await.payment_disputes.get(&id).cloned())
    }

    async fn active_payment_dispute(
        &self,
        payment_id: PaymentId,
    ) -> Result<Option<PaymentDispute>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .payment_disputes
            .values()
            .find(|d| d.payment_id == payment_id && d.status.is_active())
            .cloned())
    }

    async fn list_payment_disputes(
        &self,
        payment_id: PaymentId,
    ) -> Result<Vec<PaymentDispute>, AppError> {
        let tables = self.tables.lock().await;
        let mut disputes: Vec<PaymentDispute> = tables
            .payment_disputes
            .values()
            .filter(|d| d.payment_id == payment_id)
            .cloned()
            .collect();
        disputes.sort_by_key(|d| d.created_at);
        Ok(disputes)
    }

    async fn update_payment_dispute(
        &self,
        update: &DisputeUpdate<PaymentDisputeStatus>,
    ) -> Result<Option<PaymentDispute>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .payment_disputes
            .get_mut(&update.dispute_id)
            .filter(|d| d.status == update.from)
            .map(|d| {
                d.apply_update(update);
                d.clone()
            }))
    }
}
