//! # wayfare-entity
//!
//! Domain entity models for the Wayfare booking engine. Every struct in
//! this crate represents a database table row or a domain value object.
//! All entities derive `Debug`, `Clone`, `Serialize`, `Deserialize`, and
//! database entities additionally derive `sqlx::FromRow`.
//!
//! Each stateful entity owns exactly one transition table; services ask the
//! status enum whether a move is legal instead of re-deriving the rule.

pub mod booking;
pub mod capacity;
pub mod dispute;
pub mod experience;
pub mod payment;
