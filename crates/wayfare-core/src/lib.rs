//! # wayfare-core
//!
//! Core crate for the Wayfare booking engine. Contains configuration
//! schemas, typed identifiers, domain events, pagination types, the
//! clock and event publisher seams, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Wayfare crates.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{AppError, ErrorKind};
pub use result::AppResult;
