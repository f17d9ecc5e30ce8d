//! Spawners: aimed projectile launches and explosion placement

use glam::Vec2;
use rampart_core::{NodeId, PrototypeId};
use rampart_event::SubscriberId;
use rampart_memory::Pose;

use crate::entity::{EntityHandle, Launch};
use crate::error::Result;
use crate::world::CombatWorld;

/// Allowed launch speeds
pub const SPEED_RANGE: (f32, f32) = (0.1, 30.0);

/// Fires projectiles of one prototype at target positions
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectileSpawner {
    pub prototype: PrototypeId,
    /// Spawn point relative to the spawner's origin
    pub spawn_offset: Vec2,
    speed: f32,
    pub damage: f32,
}

impl ProjectileSpawner {
    pub fn new(prototype: PrototypeId, speed: f32, damage: f32) -> Self {
        Self {
            prototype,
            spawn_offset: Vec2::ZERO,
            speed: Self::clamp_speed(speed),
            damage,
        }
    }

    pub fn with_spawn_offset(mut self, offset: Vec2) -> Self {
        self.spawn_offset = offset;
        self
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = Self::clamp_speed(speed);
    }

    fn clamp_speed(speed: f32) -> f32 {
        speed.max(SPEED_RANGE.0).min(SPEED_RANGE.1)
    }

    /// World position of the spawn point for a spawner at `origin`
    pub fn spawn_position(&self, origin: Vec2) -> Vec2 {
        origin + self.spawn_offset
    }

    /// Launch from `start` towards `target`
    ///
    /// The lifetime is the travel time to the target, so an unobstructed
    /// projectile expires where it was aimed.
    pub fn fire(
        &self,
        world: &mut CombatWorld,
        target: Vec2,
        start: Vec2,
        parent: Option<NodeId>,
    ) -> Result<EntityHandle> {
        let direction = target - start;
        let rotation = if direction == Vec2::ZERO {
            0.0
        } else {
            direction.y.atan2(direction.x)
        };
        let launch = Launch {
            speed: self.speed,
            lifetime: direction.length() / self.speed,
            damage: self.damage,
        };
        world.spawn_projectile(self.prototype, Pose::new(start, rotation), parent, launch)
    }
}

/// Places explosions of one prototype
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExplosionSpawner {
    pub prototype: PrototypeId,
}

impl ExplosionSpawner {
    pub fn new(prototype: PrototypeId) -> Self {
        Self { prototype }
    }

    pub fn spawn(
        &self,
        world: &mut CombatWorld,
        position: Vec2,
        damage: f32,
        parent: Option<NodeId>,
    ) -> Result<EntityHandle> {
        world.spawn_explosion(self.prototype, position, parent, damage)
    }

    /// Detonate wherever projectiles of `projectile` expire
    ///
    /// The explosion carries the projectile's damage and parent. Affects
    /// every instance spawned from the prototype from now on.
    pub fn attach(&self, world: &mut CombatWorld, projectile: PrototypeId) -> Result<SubscriberId> {
        let explosion = self.prototype;
        let template = world.projectile_prototype_mut(projectile)?;
        let id = template.on_expire.subscribe(move |world, expired| {
            if let Err(e) =
                world.spawn_explosion(explosion, expired.pose.position, expired.parent, expired.damage)
            {
                log::error!("Failed to spawn explosion for {}: {}", expired.entity, e);
            }
        });
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_is_clamped() {
        let proto = PrototypeId::from_raw(1);
        assert_eq!(ProjectileSpawner::new(proto, 100.0, 1.0).speed(), 30.0);
        assert_eq!(ProjectileSpawner::new(proto, 0.0, 1.0).speed(), 0.1);
    }

    #[test]
    fn test_spawn_position_uses_offset() {
        let spawner = ProjectileSpawner::new(PrototypeId::from_raw(1), 5.0, 1.0)
            .with_spawn_offset(Vec2::new(0.0, 0.5));
        assert_eq!(spawner.spawn_position(Vec2::new(2.0, 1.0)), Vec2::new(2.0, 1.5));
    }
}
