//! Payment reconciliation: capture, failure, refunds, and provider payouts.

pub mod service;

pub use service::{PaymentService, RefundReceipt};
