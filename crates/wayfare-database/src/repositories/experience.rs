//! Experience catalog projection on PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use wayfare_core::error::AppError;
use wayfare_core::types::id::ExperienceId;
use wayfare_entity::experience::Experience;

use crate::error::db_err;
use crate::store::experience::ExperienceCatalog;

/// Reads experiences from the local `experiences` table.
#[derive(Debug, Clone)]
pub struct ExperienceRepository {
    pool: PgPool,
}

impl ExperienceRepository {
    /// Create a new experience repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ExperienceCatalog for ExperienceRepository {
    async fn find(&self, id: ExperienceId) -> Result<Option<Experience>, AppError> {
        sqlx::query_as::<_, Experience>("SELECT * FROM experiences WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err("Failed to find experience"))
    }

    async fn record_booking(&self, id: ExperienceId) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE experiences SET bookings_count = bookings_count + 1 WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err("Failed to bump bookings count"))?;
        Ok(())
    }
}
