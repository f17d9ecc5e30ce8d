//! Error types for the combat system

use rampart_core::ColliderId;
use rampart_memory::PoolError;
use thiserror::Error;

use crate::entity::EntityHandle;
use crate::health::HealthHandle;
use crate::hitbox::HitboxHandle;

/// Combat system errors
#[derive(Debug, Error)]
pub enum CombatError {
    /// Health record not found
    #[error("Health not found: {0}")]
    UnknownHealth(HealthHandle),

    /// Hitbox not found
    #[error("Hitbox not found: {0}")]
    UnknownHitbox(HitboxHandle),

    /// Collider was never registered
    #[error("Collider not registered: {0}")]
    UnknownCollider(ColliderId),

    /// Hitbox created without an owning health
    #[error("Hitbox on {0} has no owning health")]
    MissingOwner(ColliderId),

    /// Collider already carries a hitbox
    #[error("Collider {0} already has a hitbox")]
    ColliderInUse(ColliderId),

    /// Entity handle no longer resolves
    #[error("Entity not found: {0}")]
    UnknownEntity(EntityHandle),

    /// Entity is not of the requested kind
    #[error("Entity {entity} is not a {expected}")]
    WrongKind {
        entity: EntityHandle,
        expected: &'static str,
    },

    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Invalid configuration
    #[error("Invalid combat configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for combat operations
pub type Result<T> = std::result::Result<T, CombatError>;
