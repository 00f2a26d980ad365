//! Scheduled maintenance for the Wayfare booking engine.
//!
//! This crate provides:
//! - A job executor that dispatches a job type to its handler
//! - A cron scheduler that runs the handlers on their configured schedules
//! - The built-in jobs: pending expiry, slot reconciliation, auto-completion

pub mod executor;
pub mod jobs;
pub mod scheduler;

pub use executor::{JobExecutionError, JobExecutor, JobHandler};
pub use scheduler::CronScheduler;
