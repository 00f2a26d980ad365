//! sqlx error classification.
//!
//! Serialization failures, deadlocks, and unique violations all mean another
//! writer got there first. They surface as [`ErrorKind::Conflict`] so the
//! caller can decide whether a single retry makes sense.

use wayfare_core::error::{AppError, ErrorKind};

/// SQLSTATE `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";
/// SQLSTATE `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Classify a sqlx error into an [`ErrorKind`].
pub fn classify(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED | UNIQUE_VIOLATION) => {
                ErrorKind::Conflict
            }
            _ => ErrorKind::Database,
        },
        sqlx::Error::RowNotFound => ErrorKind::NotFound,
        _ => ErrorKind::Database,
    }
}

/// Build a `map_err` adapter that keeps the sqlx error as the source.
pub fn db_err(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(classify(&e), message, e)
}
