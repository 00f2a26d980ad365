//! Unified application error types for the booking engine.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator. Business-rule violations carry a
//! dedicated [`ErrorKind`] so the presentation layer can map each one to a
//! stable response without parsing messages.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The booking, payment, dispute, or experience does not exist.
    NotFound,
    /// The actor does not own the resource or lacks the required role.
    Forbidden,
    /// Input validation failed (malformed request).
    Validation,
    /// The requested status change is not permitted from the current state.
    InvalidStateTransition,
    /// The booking is not in a cancellable state.
    NotCancellable,
    /// The experience exists but is not approved for booking.
    ExperienceNotBookable,
    /// The slot does not have enough remaining participant capacity.
    CapacityExceeded,
    /// Fewer participants than the experience minimum were requested.
    BelowMinimumParticipants,
    /// More participants than the experience maximum were requested.
    AboveMaximumParticipants,
    /// The refund exceeds the remaining refundable balance or is not positive.
    InvalidRefundAmount,
    /// The payment was already transferred to the provider.
    AlreadyTransferred,
    /// A concurrent writer won the race (duplicate entry, lost update, etc.).
    Conflict,
    /// A persistence-layer fault.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An unexpected internal error occurred.
    Internal,
}

impl ErrorKind {
    /// Stable, documented code for the presentation layer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Validation => "VALIDATION",
            Self::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            Self::NotCancellable => "NOT_CANCELLABLE",
            Self::ExperienceNotBookable => "EXPERIENCE_NOT_BOOKABLE",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::BelowMinimumParticipants => "BELOW_MINIMUM_PARTICIPANTS",
            Self::AboveMaximumParticipants => "ABOVE_MAXIMUM_PARTICIPANTS",
            Self::InvalidRefundAmount => "INVALID_REFUND_AMOUNT",
            Self::AlreadyTransferred => "ALREADY_TRANSFERRED",
            Self::Conflict => "CONFLICT",
            Self::Database => "DATABASE",
            Self::Configuration => "CONFIGURATION",
            Self::Serialization => "SERIALIZATION",
            Self::Internal => "INTERNAL",
        }
    }

    /// Whether this kind rejects the request because of business state
    /// rather than malformed input or an infrastructure fault.
    pub fn is_business_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidStateTransition
                | Self::NotCancellable
                | Self::ExperienceNotBookable
                | Self::CapacityExceeded
                | Self::BelowMinimumParticipants
                | Self::AboveMaximumParticipants
                | Self::InvalidRefundAmount
                | Self::AlreadyTransferred
        )
    }

    /// Whether this kind marks a transient store conflict.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Conflict)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The unified application error used throughout the engine.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls. This provides a single error type for
/// the component boundary.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a forbidden error.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Forbidden, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create an invalid state transition error.
    pub fn invalid_transition(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidStateTransition,
            format!("Cannot transition from '{from}' to '{to}'"),
        )
    }

    /// Create a not-cancellable error.
    pub fn not_cancellable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotCancellable, message)
    }

    /// Create a capacity-exceeded error.
    pub fn capacity_exceeded(requested: i32, remaining: i32) -> Self {
        Self::new(
            ErrorKind::CapacityExceeded,
            format!("Requested {requested} participants but only {remaining} remain"),
        )
    }

    /// Create an invalid refund amount error.
    pub fn invalid_refund(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRefundAmount, message)
    }

    /// Create an already-transferred error.
    pub fn already_transferred(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyTransferred, message)
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Shorthand for `self.kind.is_transient()`.
    pub fn is_transient(&self) -> bool {
        self.kind.is_transient()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::with_source(ErrorKind::Validation, format!("Invalid request: {err}"), err)
    }
}
