//! Experience catalog entities (read-only from the engine's perspective).

pub mod model;

pub use model::{Experience, ExperienceStatus};
