//! # wayfare-database
//!
//! Persistence for the Wayfare booking engine. The services talk to the
//! traits in [`store`]; two backends implement them:
//!
//! - [`repositories`]: PostgreSQL via sqlx, with slot reservations made
//!   atomic by a conditional counter update inside one transaction.
//! - [`memory`]: a single-mutex in-process backend for tests and
//!   single-node demos.

pub mod connection;
pub mod error;
pub mod memory;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::{MemoryExperienceCatalog, MemoryStore};
pub use repositories::PgStores;
