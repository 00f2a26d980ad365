//! Request context carrying the acting user and their role.

use serde::{Deserialize, Serialize};

use wayfare_core::error::AppError;
use wayfare_core::types::id::UserId;

/// Role of whoever is driving an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    /// A traveler booking experiences.
    Traveler,
    /// A provider running experiences.
    Provider,
    /// A platform operator.
    Admin,
    /// The engine itself: payment callbacks and maintenance jobs.
    System,
}

/// Context for the current operation.
///
/// Built by the presentation layer and passed into every service method so
/// each operation knows *who* is acting. Authentication happens upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user; `None` for system-driven operations.
    pub user_id: Option<UserId>,
    /// The actor's role.
    pub role: ActorRole,
}

impl RequestContext {
    /// A traveler acting on their own behalf.
    pub fn traveler(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            role: ActorRole::Traveler,
        }
    }

    /// A provider acting on their own behalf.
    pub fn provider(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            role: ActorRole::Provider,
        }
    }

    /// A platform administrator.
    pub fn admin(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            role: ActorRole::Admin,
        }
    }

    /// The engine itself.
    pub fn system() -> Self {
        Self {
            user_id: None,
            role: ActorRole::System,
        }
    }

    /// Returns whether the actor is an admin.
    pub fn is_admin(&self) -> bool {
        self.role == ActorRole::Admin
    }

    /// Returns whether the actor is the engine itself.
    pub fn is_system(&self) -> bool {
        self.role == ActorRole::System
    }

    /// Admins and the system bypass ownership checks.
    pub fn is_privileged(&self) -> bool {
        self.is_admin() || self.is_system()
    }

    /// Returns whether the actor is `user_id`.
    pub fn is_user(&self, user_id: UserId) -> bool {
        self.user_id == Some(user_id)
    }

    /// The acting user, or `Forbidden` for the system actor.
    pub fn require_user(&self) -> Result<UserId, AppError> {
        self.user_id
            .ok_or_else(|| AppError::forbidden("This operation requires a user"))
    }

    /// `Forbidden` unless the actor is an admin.
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::forbidden("Administrator role required"))
        }
    }

    /// `Forbidden` unless the actor is an admin or the system.
    pub fn require_privileged(&self) -> Result<(), AppError> {
        if self.is_privileged() {
            Ok(())
        } else {
            Err(AppError::forbidden("Administrator or system role required"))
        }
    }
}
