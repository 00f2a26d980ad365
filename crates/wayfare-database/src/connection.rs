//! PostgreSQL pool startup: connect, verify, migrate.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::info;

use wayfare_core::config::DatabaseConfig;
use wayfare_core::error::{AppError, ErrorKind};

use crate::error::db_err;
use crate::repositories::PgStores;

/// The engine's PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connect, check the server answers, and apply pending migrations when
    /// `database.run_migrations` is set.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let options: PgConnectOptions = config.url.parse().map_err(|e| {
            AppError::with_source(ErrorKind::Configuration, "Invalid database.url", e)
        })?;
        info!(
            host = options.get_host(),
            port = options.get_port(),
            database = options.get_database().unwrap_or_default(),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect_with(options)
            .await
            .map_err(db_err("Failed to connect to database"))?;

        let db = Self { pool };
        db.ping().await?;
        if config.run_migrations {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Repositories sharing this pool.
    pub fn stores(&self) -> PgStores {
        PgStores::new(self.pool.clone())
    }

    /// Fails unless the server answers `SELECT 1`.
    pub async fn ping(&self) -> Result<(), AppError> {
        let one: i32 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("Database ping failed"))?;
        if one != 1 {
            return Err(AppError::database(format!(
                "Database ping returned {one}"
            )));
        }
        Ok(())
    }

    /// Apply the embedded `migrations/` directory.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, format!("Migration failed: {e}"), e)
            })?;
        info!("Schema is up to date");
        Ok(())
    }

    /// Close all connections.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}
