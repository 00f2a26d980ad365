use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use wayfare_core::error::AppError;
use wayfare_core::types::id::ExperienceId;
use wayfare_entity::experience::{Experience, ExperienceStatus};

use crate::store::experience::ExperienceCatalog;

/// In-memory experience catalog. The engine only reads it; the mutators
/// stand in for the external catalog service.
#[derive(Debug, Clone, Default)]
pub struct MemoryExperienceCatalog {
    experiences: Arc<Mutex<HashMap<ExperienceId, Experience>>>,
}

impl MemoryExperienceCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an experience.
    pub async fn upsert(&self, experience: Experience) {
        self.experiences
            .lock()
            .await
            .insert(experience.id, experience);
    }

    /// Change the per-participant price.
    pub async fn set_price(&self, id: ExperienceId, price: i64, at: DateTime<Utc>) {
        if let Some(experience) = self.experiences.lock().await.get_mut(&id) {
            experience.price = price;
            experience.updated_at = at;
        }
    }

    /// Change the moderation status.
    pub async fn set_status(&self, id: ExperienceId, status: ExperienceStatus, at: DateTime<Utc>) {
        if let Some(experience) = self.experiences.lock().await.get_mut(&id) {
            experience.status = status;
            experience.updated_at = at;
        }
    }
}

#[async_trait]
impl ExperienceCatalog for MemoryExperienceCatalog {
    async fn find(&self, id: ExperienceId) -> Result<Option<Experience>, AppError> {
        Ok(self.experiences.lock().await.get(&id).cloned())
    }

    async fn record_booking(&self, id: ExperienceId) -> Result<(), AppError> {
        if let Some(experience) = self.experiences.lock().await.get_mut(&id) {
            experience.bookings_count += 1;
        }
        Ok(())
    }
}
