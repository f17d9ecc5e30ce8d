//! Stand-in for the engine's 2D physics
//!
//! Moves enabled entities along their velocity and reports circle overlaps
//! to the combat world on the step they begin. Projectiles get one
//! `on_contact` per collider, explosions get the whole batch through
//! `on_overlap`. Each explosion's blast area is a collider on the
//! explosion's layer, so projectiles whose mask includes that layer are
//! stopped by it like by any other surface.

use std::collections::{HashMap, HashSet};

use glam::Vec2;
use rampart_combat::{CollisionLayer, CombatWorld, EntityHandle};
use rampart_core::ColliderId;

/// A static circular collider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticBody {
    pub collider: ColliderId,
    pub position: Vec2,
    pub radius: f32,
}

/// What one step produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Entity/collider overlaps that began this step
    pub contacts: usize,
    /// Hitboxes struck
    pub hits: usize,
    /// Projectiles stopped by a blast area
    pub intercepted: usize,
}

impl std::ops::AddAssign for StepReport {
    fn add_assign(&mut self, other: Self) {
        self.contacts += other.contacts;
        self.hits += other.hits;
        self.intercepted += other.intercepted;
    }
}

#[derive(Debug, Clone, Copy)]
struct Body {
    handle: EntityHandle,
    position: Vec2,
    radius: f32,
    /// Blast layer for explosions
    area: Option<CollisionLayer>,
}

#[derive(Debug, Default)]
pub struct ArenaPhysics {
    touching: HashSet<(EntityHandle, ColliderId)>,
    /// Blast-area collider per explosion instance; pooled instances keep theirs
    areas: HashMap<EntityHandle, ColliderId>,
}

impl ArenaPhysics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move every enabled entity by `velocity * dt`
    pub fn integrate(world: &mut CombatWorld, dt: f32) {
        for handle in world.entities().active_handles() {
            let Some(slot) = world.entities_mut().get_mut(handle) else {
                continue;
            };
            if slot.is_active() && slot.entity.is_enabled() {
                slot.pose.position += slot.entity.velocity() * dt;
            }
        }
    }

    /// Integrate, then deliver the overlaps that began this step
    pub fn step(&mut self, world: &mut CombatWorld, statics: &[StaticBody], dt: f32) -> StepReport {
        Self::integrate(world, dt);

        let bodies: Vec<Body> = world
            .entities()
            .iter_active()
            .filter(|(_, slot)| slot.entity.is_enabled())
            .map(|(handle, slot)| Body {
                handle,
                position: slot.pose.position,
                radius: slot.entity.radius(),
                area: slot.entity.area_layer(),
            })
            .collect();

        let mut blasts = Vec::new();
        for body in &bodies {
            if let Some(layer) = body.area {
                let collider = *self
                    .areas
                    .entry(body.handle)
                    .or_insert_with(|| world.register_collider(layer));
                blasts.push(StaticBody {
                    collider,
                    position: body.position,
                    radius: body.radius,
                });
            }
        }

        let mut report = StepReport::default();
        let mut touching = HashSet::with_capacity(self.touching.len());
        let mut entered = Vec::new();

        for body in &bodies {
            entered.clear();
            // Blasts do not touch each other
            let blast_surfaces: &[StaticBody] = if body.area.is_none() { &blasts } else { &[] };
            let surfaces = statics
                .iter()
                .map(|s| (s, false))
                .chain(blast_surfaces.iter().map(|s| (s, true)));
            for (other, is_blast) in surfaces {
                if body.position.distance(other.position) > body.radius + other.radius {
                    continue;
                }
                let pair = (body.handle, other.collider);
                if !self.touching.contains(&pair) {
                    entered.push((other.collider, is_blast));
                }
                touching.insert(pair);
            }
            if entered.is_empty() {
                continue;
            }
            report.contacts += entered.len();

            if body.area.is_none() {
                for &(collider, is_blast) in &entered {
                    if world.on_contact(body.handle, collider) {
                        report.hits += 1;
                    }
                    if !world.projectile(body.handle).map_or(false, |p| p.is_enabled()) {
                        if is_blast {
                            report.intercepted += 1;
                        }
                        break;
                    }
                }
            } else {
                let colliders: Vec<ColliderId> = entered.iter().map(|(c, _)| *c).collect();
                report.hits += world.on_overlap(body.handle, &colliders);
            }
        }

        self.touching = touching;
        report
    }

    /// Forget all tracked overlaps
    pub fn reset(&mut self) {
        self.touching.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rampart_combat::{Explosion, Health, InteractionMask, Launch, Projectile};
    use rampart_memory::Pose;

    fn wall(world: &mut CombatWorld, position: Vec2) -> (StaticBody, rampart_combat::HealthHandle) {
        let health = world.add_health(Health::new(100.0));
        let collider = world.register_collider(CollisionLayer::BUILDINGS);
        world.attach_hitbox(collider, Some(health)).unwrap();
        let body = StaticBody {
            collider,
            position,
            radius: 0.5,
        };
        (body, health)
    }

    #[test]
    fn test_projectile_hits_once_on_enter() {
        let mut world = CombatWorld::default();
        let (body, health) = wall(&mut world, Vec2::new(1.0, 0.0));
        let dart = world.register_projectile("dart", Projectile::new(10.0).with_radius(0.1));
        let shot = world
            .spawn_projectile(
                dart,
                Pose::new(Vec2::new(-0.5, 0.0), 0.0),
                None,
                Launch {
                    speed: 10.0,
                    lifetime: 5.0,
                    damage: 10.0,
                },
            )
            .unwrap();

        let mut physics = ArenaPhysics::new();
        let first = physics.step(&mut world, &[body], 0.05);
        assert_eq!(first.contacts, 0);

        let second = physics.step(&mut world, &[body], 0.05);
        assert_eq!(second.contacts, 1);
        assert_eq!(second.hits, 1);
        assert_eq!(world.health(health).unwrap().current(), 90.0);
        assert!(!world.entities().is_active(shot));

        let third = physics.step(&mut world, &[body], 0.05);
        assert_eq!(third, StepReport::default());
    }

    fn incoming(world: &mut CombatWorld, mask: InteractionMask) -> EntityHandle {
        let shell = world.register_projectile("shell", Projectile::new(10.0).with_mask(mask));
        world
            .spawn_projectile(
                shell,
                Pose::new(Vec2::new(0.0, 2.0), -std::f32::consts::FRAC_PI_2),
                None,
                Launch {
                    speed: 1.0,
                    lifetime: 10.0,
                    damage: 10.0,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_blast_stops_projectiles_masked_for_it() {
        let mut world = CombatWorld::default();
        let blast = world.register_explosion("blast", Explosion::new(5.0, 1.0));
        let stopped = incoming(
            &mut world,
            InteractionMask::from_layers(&[CollisionLayer::BUILDINGS, CollisionLayer::EXPLOSIONS]),
        );
        let passing = incoming(&mut world, InteractionMask::from_layers(&[CollisionLayer::BUILDINGS]));
        world
            .spawn_explosion(blast, Vec2::new(0.0, 1.5), None, 5.0)
            .unwrap();

        let mut physics = ArenaPhysics::new();
        let report = physics.step(&mut world, &[], 0.1);
        assert_eq!(report.intercepted, 1);
        assert_eq!(report.hits, 0);
        assert!(!world.entities().is_active(stopped));
        assert!(world.entities().is_active(passing));
        assert!(world.projectile(passing).unwrap().is_enabled());

        // Still overlapping, but only entering counts
        let again = physics.step(&mut world, &[], 0.1);
        assert_eq!(again, StepReport::default());
    }
}
