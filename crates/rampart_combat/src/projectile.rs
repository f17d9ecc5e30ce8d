//! Projectiles: bounded-lifetime pooled entities that damage on contact
//!
//! ```text
//!  pooled ──spawn──► active ──age >= lifetime──┐
//!                       └──masked contact──────┴─► expired ──immediate──► pooled
//!                                                     └──delayed(wait)──► pooled
//! ```
//!
//! Expiry happens once per activation no matter how many paths race to it
//! within a tick.

use glam::Vec2;
use rampart_core::{Sequence, Step, WaitPoint};
use rampart_event::Listeners;

use crate::entity::EntityHandle;
use crate::events::ProjectileExpired;
use crate::layers::InteractionMask;
use crate::world::CombatWorld;

/// What happens to a projectile after it expires
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Back to the pool in the same call
    #[default]
    Immediate,
    /// Back to the pool after a wait, for lingering effects
    Delayed(WaitPoint),
}

#[derive(Clone, Debug)]
pub struct Projectile {
    pub velocity: Vec2,
    pub damage: f32,
    /// Seconds before the projectile expires on its own
    pub lifetime: f32,
    pub(crate) age: f32,
    /// Contact radius used by collision stand-ins
    pub radius: f32,
    pub mask: InteractionMask,
    pub release: ReleaseMode,
    pub(crate) enabled: bool,
    /// Bumped on every reuse so work queued for an earlier activation can
    /// tell it is stale
    pub(crate) activation: u32,
    /// Shared by every instance spawned from the same prototype
    pub on_expire: Listeners<CombatWorld, ProjectileExpired>,
}

impl Projectile {
    pub fn new(damage: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            damage,
            lifetime: f32::INFINITY,
            age: 0.0,
            radius: 0.1,
            mask: InteractionMask::ALL,
            release: ReleaseMode::Immediate,
            enabled: true,
            activation: 0,
            on_expire: Listeners::new(),
        }
    }

    pub fn with_lifetime(mut self, lifetime: f32) -> Self {
        self.lifetime = lifetime;
        self
    }

    pub fn with_mask(mut self, mask: InteractionMask) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_delayed_release(mut self, wait: WaitPoint) -> Self {
        self.release = ReleaseMode::Delayed(wait);
        self
    }

    /// Finish initialization after a spawn
    pub fn init(&mut self, velocity: Vec2, lifetime: f32, damage: f32) {
        self.velocity = velocity;
        self.lifetime = lifetime;
        self.damage = damage;
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// False once expired
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Age by `dt`; true when the lifetime has run out
    pub(crate) fn advance(&mut self, dt: f32) -> bool {
        if !self.enabled {
            return false;
        }
        self.age += dt;
        self.age >= self.lifetime
    }

    /// Reset to the template for another activation
    pub(crate) fn restore(&mut self, prototype: &Self) {
        let activation = self.activation.wrapping_add(1);
        self.clone_from(prototype);
        self.velocity = Vec2::ZERO;
        self.age = 0.0;
        self.enabled = true;
        self.activation = activation;
    }

    /// Identifies the current spawn of this pooled instance
    pub fn activation(&self) -> u32 {
        self.activation
    }
}

impl Default for Projectile {
    fn default() -> Self {
        Self::new(10.0)
    }
}

/// Returns an expired projectile to the pool after a wait
///
/// Only the activation that expired is released. If the session recycled
/// the entity meanwhile, the task finishes without touching it.
pub(crate) struct DelayedRelease {
    entity: EntityHandle,
    activation: u32,
    wait: WaitPoint,
    waited: bool,
}

impl DelayedRelease {
    pub(crate) fn new(entity: EntityHandle, activation: u32, wait: WaitPoint) -> Self {
        Self {
            entity,
            activation,
            wait,
            waited: false,
        }
    }
}

impl Sequence<CombatWorld> for DelayedRelease {
    fn resume(&mut self, world: &mut CombatWorld) -> Step {
        if !self.waited {
            self.waited = true;
            return Step::Wait(self.wait);
        }
        let same_activation = world
            .projectile(self.entity)
            .map_or(false, |p| p.activation == self.activation && !p.is_enabled());
        let active = world.entities().is_active(self.entity);
        if same_activation && active {
            world.release_entity(self.entity);
        }
        Step::Done
    }
}
