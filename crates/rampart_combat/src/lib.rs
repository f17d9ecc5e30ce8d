//! Rampart Combat - Health, Hitboxes and Pooled Combat Entities
//!
//! This crate resolves everything that happens when something hits
//! something else in a Rampart session.
//!
//! # Features
//!
//! - Health records with a damage / heal / death pipeline that tolerates
//!   listeners re-entering it
//! - Death prevention through the global `on_die` hook
//! - Hitboxes with per-owner deduplication of contact batches
//! - Pooled projectiles and explosions with idempotent expiry
//! - Recycled transaction records (no allocation per hit)
//!
//! # Example
//!
//! ```ignore
//! use rampart_combat::prelude::*;
//!
//! let mut world = CombatWorld::default();
//! let wall = world.add_health(Health::new(100.0));
//! let surface = world.register_collider(CollisionLayer::BUILDINGS);
//! world.attach_hitbox(surface, Some(wall))?;
//!
//! world.events.on_died.subscribe(|_, death| {
//!     log::info!("{:?} fell", death.target);
//! });
//!
//! let dealt = world.apply_damage(wall, 250.0, None);
//! assert_eq!(dealt, 100.0);
//! ```

pub mod bus;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod explosion;
pub mod health;
pub mod hitbox;
pub mod layers;
pub mod projectile;
pub mod spawner;
pub mod world;

pub mod prelude {
    pub use crate::bus::CombatEvents;
    pub use crate::config::CombatConfig;
    pub use crate::entity::{CombatEntity, EntityHandle, Launch};
    pub use crate::error::{CombatError, Result};
    pub use crate::events::{DamageEvent, DeathEvent, HealEvent, ProjectileExpired};
    pub use crate::explosion::Explosion;
    pub use crate::health::{Health, HealthHandle};
    pub use crate::hitbox::{Hitbox, HitboxHandle};
    pub use crate::layers::{CollisionLayer, InteractionMask};
    pub use crate::projectile::{Projectile, ReleaseMode};
    pub use crate::spawner::{ExplosionSpawner, ProjectileSpawner};
    pub use crate::world::CombatWorld;
}

pub use prelude::*;
