use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wayfare_core::error::AppError;
use wayfare_core::types::id::{BookingId, PaymentId, RefundId};
use wayfare_entity::payment::{
    NewPayment, Payment, PaymentRefund, PaymentStatus, PaymentTransition,
};

use super::MemoryStore;
use crate::store::payment::{PaymentStore, RefundOutcome, RefundRequest};

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn insert(&self, payment: &NewPayment) -> Result<Payment, AppError> {
        let mut tables = self.tables.lock().await;
        if tables
            .payments
            .values()
            .any(|p| p.booking_id == payment.booking_id)
        {
            return Err(AppError::conflict(format!(
                "Booking {} already has a payment",
                payment.booking_id
            )));
        }
        let stored = payment.clone().into_payment();
        tables.payments.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: PaymentId) -> Result<Option<Payment>, AppError> {
        Ok(self.tables.lock().await.payments.get(&id).cloned())
    }

    async fn find_by_booking(&self, booking_id: BookingId) -> Result<Option<Payment>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .payments
            .values()
            .find(|p| p.booking_id == booking_id)
            .cloned())
    }

    async fn transition(
        &self,
        transition: &PaymentTransition,
    ) -> Result<Option<Payment>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .payments
            .get_mut(&transition.payment_id)
            .filter(|p| p.status == transition.from)
            .map(|p| {
                p.apply_transition(transition);
                p.clone()
            }))
    }

    async fn apply_refund(&self, request: &RefundRequest) -> Result<RefundOutcome, AppError> {
        let mut tables = self.tables.lock().await;

        let Some(payment) = tables.payments.get(&request.payment_id).cloned() else {
            return Err(AppError::not_found(format!(
                "Payment {} not found",
                request.payment_id
            )));
        };

        if let Some(earlier) = tables
            .refunds
            .iter()
            .find(|r| r.payment_id == request.payment_id && r.operation_key == request.operation_key)
        {
            return Ok(RefundOutcome::Replayed {
                payment,
                refund: earlier.clone(),
            });
        }

        if !payment.status.is_refundable()
            || request.amount <= 0
            || request.amount > payment.refundable_amount()
        {
            return Ok(RefundOutcome::Rejected {
                status: payment.status,
                refundable: if payment.status.is_refundable() {
                    payment.refundable_amount()
                } else {
                    0
                },
            });
        }

        let refund = PaymentRefund {
            id: RefundId::new(),
            payment_id: payment.id,
            amount: request.amount,
            reason: request.reason.clone(),
            operation_key: request.operation_key.clone(),
            created_at: request.at,
        };
        tables.refunds.push(refund.clone());

        let Some(stored) = tables.payments.get_mut(&request.payment_id) else {
            return Err(AppError::internal("Payment vanished during refund"));
        };
        stored.total_refunded_amount += request.amount;
        stored.status = if stored.total_refunded_amount == stored.amount {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        stored.refunded_at = Some(request.at);
        stored.updated_at = request.at;

        Ok(RefundOutcome::Applied {
            payment: stored.clone(),
            refund,
        })
    }

    async fn mark_transferred(
        &self,
        id: PaymentId,
        reference: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<Payment>, AppError> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .payments
            .get_mut(&id)
            .filter(|p| p.is_awaiting_transfer())
            .map(|p| {
                p.transferred_at = Some(at);
                p.transfer_reference = Some(reference.to_string());
                p.updated_at = at;
                p.clone()
            }))
    }

    async fn list_refunds(&self, payment_id: PaymentId) -> Result<Vec<PaymentRefund>, AppError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .refunds
            .iter()
            .filter(|r| r.payment_id == payment_id)
            .cloned()
            .collect())
    }
}
