//! Pooled combat entities and their lifecycle inside a [`CombatWorld`]

use glam::Vec2;
use rampart_core::{ColliderId, NodeId, PrototypeId};
use rampart_memory::{PoolHandle, Poolable, Pose};

use crate::error::{CombatError, Result};
use crate::events::ProjectileExpired;
use crate::explosion::Explosion;
use crate::hitbox::HitboxHandle;
use crate::layers::CollisionLayer;
use crate::projectile::{DelayedRelease, Projectile, ReleaseMode};
use crate::world::CombatWorld;

/// Transient entity recycled by the world's pool
#[derive(Clone, Debug)]
pub enum CombatEntity {
    Projectile(Projectile),
    Explosion(Explosion),
}

impl CombatEntity {
    pub fn kind(&self) -> &'static str {
        match self {
            CombatEntity::Projectile(_) => "projectile",
            CombatEntity::Explosion(_) => "explosion",
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            CombatEntity::Projectile(p) => p.is_enabled(),
            CombatEntity::Explosion(e) => e.is_enabled(),
        }
    }

    pub fn velocity(&self) -> Vec2 {
        match self {
            CombatEntity::Projectile(p) => p.velocity,
            CombatEntity::Explosion(_) => Vec2::ZERO,
        }
    }

    /// Layer an explosion's blast area occupies; projectiles have none
    pub fn area_layer(&self) -> Option<CollisionLayer> {
        match self {
            CombatEntity::Projectile(_) => None,
            CombatEntity::Explosion(e) => Some(e.layer),
        }
    }

    pub fn radius(&self) -> f32 {
        match self {
            CombatEntity::Projectile(p) => p.radius,
            CombatEntity::Explosion(e) => e.radius,
        }
    }
}

impl Poolable for CombatEntity {
    fn restore(&mut self, prototype: &Self) {
        match (self, prototype) {
            (CombatEntity::Projectile(p), CombatEntity::Projectile(template)) => p.restore(template),
            (CombatEntity::Explosion(e), CombatEntity::Explosion(template)) => e.restore(template),
            (this, template) => *this = template.clone(),
        }
    }
}

impl From<Projectile> for CombatEntity {
    fn from(projectile: Projectile) -> Self {
        CombatEntity::Projectile(projectile)
    }
}

impl From<Explosion> for CombatEntity {
    fn from(explosion: Explosion) -> Self {
        CombatEntity::Explosion(explosion)
    }
}

/// Handle to a pooled combat entity
pub type EntityHandle = PoolHandle<CombatEntity>;

/// Launch parameters applied to a freshly spawned projectile
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Launch {
    pub speed: f32,
    pub lifetime: f32,
    pub damage: f32,
}

impl CombatWorld {
    pub fn register_projectile(&mut self, name: &str, template: Projectile) -> PrototypeId {
        self.entities.register_prototype(name, template.into())
    }

    pub fn register_explosion(&mut self, name: &str, template: Explosion) -> PrototypeId {
        self.entities.register_prototype(name, template.into())
    }

    /// The projectile template behind `prototype`
    pub fn projectile_prototype_mut(&mut self, prototype: PrototypeId) -> Result<&mut Projectile> {
        match self.entities.prototype_mut(prototype)? {
            CombatEntity::Projectile(p) => Ok(p),
            CombatEntity::Explosion(_) => Err(CombatError::InvalidConfig(format!(
                "prototype {} is not a projectile",
                prototype
            ))),
        }
    }

    /// Spawn a projectile moving along the pose's facing
    pub fn spawn_projectile(
        &mut self,
        prototype: PrototypeId,
        pose: Pose,
        parent: Option<NodeId>,
        launch: Launch,
    ) -> Result<EntityHandle> {
        let handle = self.entities.spawn(prototype, pose, parent)?;
        match self.entities.entity_mut(handle) {
            Some(CombatEntity::Projectile(p)) => {
                p.init(pose.forward() * launch.speed, launch.lifetime, launch.damage);
                Ok(handle)
            }
            _ => {
                self.entities.release(handle, true);
                Err(CombatError::WrongKind {
                    entity: handle,
                    expected: "projectile",
                })
            }
        }
    }

    pub fn spawn_explosion(
        &mut self,
        prototype: PrototypeId,
        position: Vec2,
        parent: Option<NodeId>,
        damage: f32,
    ) -> Result<EntityHandle> {
        let handle = self.entities.spawn(prototype, Pose::at(position), parent)?;
        match self.entities.entity_mut(handle) {
            Some(CombatEntity::Explosion(e)) => {
                e.init(damage);
                Ok(handle)
            }
            _ => {
                self.entities.release(handle, true);
                Err(CombatError::WrongKind {
                    entity: handle,
                    expected: "explosion",
                })
            }
        }
    }

    pub fn projectile(&self, entity: EntityHandle) -> Option<&Projectile> {
        match self.entities.entity(entity) {
            Some(CombatEntity::Projectile(p)) => Some(p),
            _ => None,
        }
    }

    pub fn explosion(&self, entity: EntityHandle) -> Option<&Explosion> {
        match self.entities.entity(entity) {
            Some(CombatEntity::Explosion(e)) => Some(e),
            _ => None,
        }
    }

    /// Expire an active entity; only the first call per activation acts
    ///
    /// A projectile is disabled before its `on_expire` listeners run, so
    /// they see `is_enabled() == false` and a nested `expire` is a no-op.
    /// It then goes back to the pool, now or after its release delay.
    /// Returns false when the entity had already expired.
    pub fn expire(&mut self, entity: EntityHandle) -> bool {
        let Some(slot) = self.entities.get_mut(entity) else {
            return false;
        };
        if !slot.is_active() {
            return false;
        }
        let pose = slot.pose;
        let parent = slot.parent();

        match &mut slot.entity {
            CombatEntity::Projectile(p) => {
                if !p.enabled {
                    return false;
                }
                p.enabled = false;
                let listeners = p.on_expire.snapshot();
                let release = p.release;
                let activation = p.activation;
                let mut event = ProjectileExpired {
                    entity,
                    pose,
                    parent,
                    velocity: p.velocity,
                    damage: p.damage,
                };

                listeners.dispatch(self, &mut event);
                match release {
                    ReleaseMode::Immediate => {
                        self.release_entity(entity);
                    }
                    ReleaseMode::Delayed(wait) => {
                        self.scheduler.start(DelayedRelease::new(entity, activation, wait));
                    }
                }
            }
            CombatEntity::Explosion(e) => {
                if !e.disable() {
                    return false;
                }
                self.release_entity(entity);
            }
        }
        true
    }

    /// Return an entity to the pool, destroying it if the pool did not
    /// create it
    pub fn release_entity(&mut self, entity: EntityHandle) -> bool {
        self.entities.release(entity, true)
    }

    /// Contact between an entity and a single collider
    ///
    /// Projectiles ignore colliders outside their mask; a masked contact
    /// damages the collider's hitbox if it is hittable and expires the
    /// projectile either way. Explosions damage any hittable hitbox.
    /// Returns true when damage was dealt.
    pub fn on_contact(&mut self, entity: EntityHandle, collider: ColliderId) -> bool {
        let Some((damage, is_projectile)) = self.contact_params(entity, collider) else {
            return false;
        };

        let hit = match self.find_one(collider) {
            Some(hitbox) => self.strike(entity, hitbox, damage),
            None => false,
        };
        if is_projectile {
            self.expire(entity);
        }
        hit
    }

    /// Contact between an entity and a batch of colliders from one query
    ///
    /// Each owning health is damaged at most once. Returns the number of
    /// hitboxes struck.
    pub fn on_overlap(&mut self, entity: EntityHandle, colliders: &[ColliderId]) -> usize {
        let mut matched = Vec::with_capacity(colliders.len());
        let mut damage = 0.0;
        let mut is_projectile = false;
        for collider in colliders {
            if let Some((d, projectile)) = self.contact_params(entity, *collider) {
                matched.push(*collider);
                damage = d;
                is_projectile = projectile;
            }
        }
        if matched.is_empty() {
            return 0;
        }

        let mut targets = std::mem::take(&mut self.overlap_hits);
        self.find_unique(&matched, &mut targets);
        let mut struck = 0;
        for hitbox in targets.iter().copied() {
            if self.strike(entity, hitbox, damage) {
                struck += 1;
            }
        }
        targets.clear();
        self.overlap_hits = targets;

        if is_projectile {
            self.expire(entity);
        }
        struck
    }

    /// Damage and kind of an entity for a contact, `None` if it cannot hit
    fn contact_params(&self, entity: EntityHandle, collider: ColliderId) -> Option<(f32, bool)> {
        let slot = self.entities.get(entity)?;
        if !slot.is_active() {
            return None;
        }
        match &slot.entity {
            CombatEntity::Projectile(p) => {
                let layer = self.collider_layer(collider)?;
                (p.enabled && p.mask.contains(layer)).then_some((p.damage, true))
            }
            CombatEntity::Explosion(e) => e.is_enabled().then_some((e.damage, false)),
        }
    }

    fn strike(&mut self, entity: EntityHandle, hitbox: HitboxHandle, damage: f32) -> bool {
        let mut event = self.damage_events.checkout();
        event.damage = damage;
        event.source = Some(entity);
        self.damage_hitbox(hitbox, &mut event).is_ok()
    }

    /// Age every active entity by one physics step
    pub(crate) fn age_entities(&mut self, dt: f32) {
        for handle in self.entities.active_handles() {
            let Some(slot) = self.entities.get_mut(handle) else {
                continue;
            };
            if !slot.is_active() {
                continue;
            }
            let expired = match &mut slot.entity {
                CombatEntity::Projectile(p) => p.advance(dt),
                CombatEntity::Explosion(e) => e.advance(dt),
            };
            if expired {
                self.expire(handle);
            }
        }
    }
}
