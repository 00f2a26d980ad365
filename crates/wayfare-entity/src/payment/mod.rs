//! Payment entities, the payment transition table, and commission math.

pub mod commission;
pub mod model;
pub mod refund;
pub mod status;
pub mod transition;

pub use commission::CommissionSplit;
pub use model::{NewPayment, Payment};
pub use refund::PaymentRefund;
pub use status::{PAYMENT_TRANSITIONS, PaymentStatus, PaymentType};
pub use transition::PaymentTransition;
