//! Built-in job handler implementations.

pub mod completion;
pub mod expiry;
pub mod reconcile;

use std::sync::Arc;

use wayfare_core::config::WorkerConfig;
use wayfare_service::BookingEngine;

use crate::executor::JobExecutor;

pub use completion::CompletionJobHandler;
pub use expiry::ExpiryJobHandler;
pub use reconcile::ReconcileJobHandler;

/// An executor with every built-in job registered against `engine`.
pub fn default_executor(engine: &BookingEngine, config: &WorkerConfig) -> JobExecutor {
    let mut executor = JobExecutor::new();
    executor.register(Arc::new(ExpiryJobHandler::new(
        engine.bookings().clone(),
        config.batch_size,
    )));
    executor.register(Arc::new(ReconcileJobHandler::new(
        engine.ledger().clone(),
        config.batch_size,
    )));
    executor.register(Arc::new(CompletionJobHandler::new(
        engine.bookings().clone(),
        config.batch_size,
    )));
    executor
}
