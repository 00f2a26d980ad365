//! Read access to the external experience catalog.

use async_trait::async_trait;

use wayfare_core::error::AppError;
use wayfare_core::types::id::ExperienceId;
use wayfare_entity::experience::Experience;

/// The slice of the experience catalog the engine needs.
#[async_trait]
pub trait ExperienceCatalog: Send + Sync + std::fmt::Debug {
    /// Load an experience.
    async fn find(&self, id: ExperienceId) -> Result<Option<Experience>, AppError>;

    /// Bump the derived `bookings_count`.
    async fn record_booking(&self, id: ExperienceId) -> Result<(), AppError>;
}
