//! Explosions: short-lived area damage
//!
//! Unlike projectiles there is no interaction mask; any hittable hitbox the
//! explosion touches takes its damage. It never expires on contact, only when
//! its duration has run out.
//!
//! The blast area itself sits on a collision layer, so projectiles whose
//! mask includes that layer are stopped by it.

use crate::layers::CollisionLayer;

/// Shortest and longest allowed durations, in seconds
pub const DURATION_RANGE: (f32, f32) = (0.1, 5.0);

#[derive(Clone, Debug, PartialEq)]
pub struct Explosion {
    pub damage: f32,
    /// Radius at full size
    pub radius: f32,
    /// Layer of the blast area's collider
    pub layer: CollisionLayer,
    duration: f32,
    age: f32,
    enabled: bool,
}

impl Explosion {
    pub fn new(damage: f32, radius: f32) -> Self {
        Self {
            damage,
            radius,
            layer: CollisionLayer::EXPLOSIONS,
            duration: 1.0,
            age: 0.0,
            enabled: true,
        }
    }

    /// Duration is kept within [`DURATION_RANGE`]
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration.max(DURATION_RANGE.0).min(DURATION_RANGE.1);
        self
    }

    pub fn with_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }

    /// Finish initialization after a spawn
    pub fn init(&mut self, damage: f32) {
        self.damage = damage;
        self.enabled = true;
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Fraction of the duration elapsed, in `[0, 1]`
    pub fn progress(&self) -> f32 {
        (self.age / self.duration).min(1.0)
    }

    pub(crate) fn advance(&mut self, dt: f32) -> bool {
        if !self.enabled {
            return false;
        }
        self.age += dt;
        self.age >= self.duration
    }

    /// Disable; true only for the first call of an activation
    pub(crate) fn disable(&mut self) -> bool {
        std::mem::replace(&mut self.enabled, false)
    }

    pub(crate) fn restore(&mut self, prototype: &Self) {
        self.clone_from(prototype);
        self.age = 0.0;
        self.enabled = true;
    }
}

impl Default for Explosion {
    fn default() -> Self {
        Self::new(10.0, 1.0)
    }
}
