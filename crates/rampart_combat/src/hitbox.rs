//! Hitboxes: collision surfaces that forward damage to an owning health
//!
//! Several hitboxes may share one owner (separate damage zones of one unit).
//! Contact queries resolve colliders to hitboxes here; a batch query keeps
//! only the first hittable hitbox per owner so one attack cannot hit the
//! same health twice in a physics step.

use rampart_core::{ColliderId, Handle};

use crate::error::{CombatError, Result};
use crate::events::DamageEvent;
use crate::health::HealthHandle;
use crate::layers::CollisionLayer;
use crate::world::CombatWorld;

/// Handle to a [`Hitbox`] owned by a [`CombatWorld`]
pub type HitboxHandle = Handle<Hitbox>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hitbox {
    owner: HealthHandle,
    collider: ColliderId,
    enabled: bool,
}

impl Hitbox {
    pub fn owner(&self) -> HealthHandle {
        self.owner
    }

    pub fn collider(&self) -> ColliderId {
        self.collider
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// A registered collision surface
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ColliderEntry {
    pub layer: CollisionLayer,
    pub hitbox: Option<HitboxHandle>,
}

impl CombatWorld {
    /// Register a collision surface on `layer`
    pub fn register_collider(&mut self, layer: CollisionLayer) -> ColliderId {
        let id = self.ids.next_collider();
        self.colliders.insert(id, ColliderEntry { layer, hitbox: None });
        id
    }

    pub fn collider_layer(&self, collider: ColliderId) -> Option<CollisionLayer> {
        self.colliders.get(&collider).map(|entry| entry.layer)
    }

    /// Forget a collision surface and any hitbox on it
    pub fn unregister_collider(&mut self, collider: ColliderId) {
        if let Some(entry) = self.colliders.remove(&collider) {
            if let Some(hitbox) = entry.hitbox {
                self.remove_hitbox(hitbox);
            }
        }
    }

    /// Put a hitbox on `collider` that forwards damage to `owner`
    ///
    /// A hitbox without an owner is never created; the failure is logged and
    /// returned so the caller can leave the surface inert.
    pub fn attach_hitbox(
        &mut self,
        collider: ColliderId,
        owner: Option<HealthHandle>,
    ) -> Result<HitboxHandle> {
        let Some(owner) = owner else {
            log::error!("Hitbox health is missing on {}", collider);
            return Err(CombatError::MissingOwner(collider));
        };
        let entry = self
            .colliders
            .get(&collider)
            .copied()
            .ok_or(CombatError::UnknownCollider(collider))?;
        if entry.hitbox.is_some() {
            return Err(CombatError::ColliderInUse(collider));
        }
        if !self.healths.contains(owner) {
            log::error!("Hitbox on {} points at unknown health {}", collider, owner);
            return Err(CombatError::UnknownHealth(owner));
        }

        let handle = self.hitboxes.insert(Hitbox {
            owner,
            collider,
            enabled: true,
        });
        if let Some(entry) = self.colliders.get_mut(&collider) {
            entry.hitbox = Some(handle);
        }
        if let Some(health) = self.healths.get_mut(owner) {
            health.hitboxes.push(handle);
        }
        Ok(handle)
    }

    /// Remove a hitbox; its collider stays registered
    pub fn remove_hitbox(&mut self, hitbox: HitboxHandle) -> Option<Hitbox> {
        let removed = self.hitboxes.remove(hitbox)?;
        if let Some(entry) = self.colliders.get_mut(&removed.collider) {
            entry.hitbox = None;
        }
        if let Some(health) = self.healths.get_mut(removed.owner) {
            health.hitboxes.retain(|h| *h != hitbox);
        }
        Some(removed)
    }

    pub fn hitbox(&self, hitbox: HitboxHandle) -> Option<&Hitbox> {
        self.hitboxes.get(hitbox)
    }

    pub fn set_hitbox_enabled(&mut self, hitbox: HitboxHandle, enabled: bool) -> Result<()> {
        let entry = self
            .hitboxes
            .get_mut(hitbox)
            .ok_or(CombatError::UnknownHitbox(hitbox))?;
        entry.enabled = enabled;
        Ok(())
    }

    /// Enabled and owned by a health that is not dead
    pub fn is_hittable(&self, hitbox: HitboxHandle) -> bool {
        self.hitboxes.get(hitbox).map_or(false, |hb| {
            hb.enabled && self.healths.get(hb.owner).map_or(false, |h| !h.is_dead())
        })
    }

    /// Resolve one collider to its hitbox, if hittable
    pub fn find_one(&self, collider: ColliderId) -> Option<HitboxHandle> {
        let hitbox = self.colliders.get(&collider)?.hitbox?;
        self.is_hittable(hitbox).then_some(hitbox)
    }

    /// Resolve a contact batch to hittable hitboxes, one per owner
    ///
    /// `out` is cleared first and filled in first-seen order.
    pub fn find_unique(&mut self, colliders: &[ColliderId], out: &mut Vec<HitboxHandle>) {
        out.clear();
        let mut seen = std::mem::take(&mut self.scratch);
        for collider in colliders {
            let Some(hitbox) = self.find_one(*collider) else {
                continue;
            };
            let Some(owner) = self.hitboxes.get(hitbox).map(Hitbox::owner) else {
                continue;
            };
            if seen.insert(owner) {
                out.push(hitbox);
            }
        }
        seen.clear();
        self.scratch = seen;
    }

    /// Forward a damage transaction to the hitbox's owner
    pub fn damage_hitbox(&mut self, hitbox: HitboxHandle, event: &mut DamageEvent) -> Result<()> {
        let owner = self
            .hitboxes
            .get(hitbox)
            .map(Hitbox::owner)
            .ok_or(CombatError::UnknownHitbox(hitbox))?;
        self.take_damage(owner, event);
        Ok(())
    }
}
