//! Capacity ledger entities.

pub mod slot;

pub use slot::{CapacitySlot, SlotDrift, SlotKey};
