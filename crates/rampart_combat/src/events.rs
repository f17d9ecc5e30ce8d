//! Transaction records for damage, death and healing
//!
//! Each record lives for exactly one synchronous transaction. They are
//! checked out of the world's [`EventPool`](rampart_memory::EventPool)s and
//! recycled when the guard drops.

use glam::Vec2;
use rampart_core::NodeId;
use rampart_memory::{Pose, Recycle};

use crate::entity::EntityHandle;
use crate::health::HealthHandle;

/// One damage transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DamageEvent {
    /// Requested damage; pre-damage listeners may rewrite it
    pub damage: f32,
    /// Entity that caused the damage, if any
    pub source: Option<EntityHandle>,
    pub target: Option<HealthHandle>,
    /// Damage actually applied, in `[0, current HP]`
    pub damage_dealt: f32,
}

impl DamageEvent {
    pub fn new(damage: f32, source: Option<EntityHandle>) -> Self {
        Self {
            damage,
            source,
            ..Default::default()
        }
    }
}

impl Recycle for DamageEvent {
    fn recycle(&mut self) {
        *self = Self::default();
    }
}

/// One death transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DeathEvent {
    pub target: Option<HealthHandle>,
    /// The damage that caused the death; `None` for outright kills
    pub cause: Option<DamageEvent>,
    /// Set by a pre-death listener to veto the death
    pub prevented: bool,
}

impl Recycle for DeathEvent {
    fn recycle(&mut self) {
        self.target = None;
        self.cause = None;
        self.prevented = false;
    }
}

/// One healing transaction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealEvent {
    pub target: Option<HealthHandle>,
    pub amount: f32,
    /// Health actually restored, in `[0, max - current]`
    pub restored_health: f32,
}

impl Recycle for HealEvent {
    fn recycle(&mut self) {
        *self = Self::default();
    }
}

/// Raised once when a projectile expires
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileExpired {
    pub entity: EntityHandle,
    /// Where the projectile was when it expired
    pub pose: Pose,
    pub parent: Option<NodeId>,
    pub velocity: Vec2,
    pub damage: f32,
}
