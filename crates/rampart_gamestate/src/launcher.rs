//! The player's missile launchers and their upgrades
//!
//! Every launcher stands in a building slot and is lost with its building.

use glam::Vec2;
use rampart_combat::{CombatWorld, EntityHandle, HealthHandle, ProjectileSpawner};
use rampart_core::{NodeId, PrototypeId};

use crate::config::LauncherConfig;
use crate::error::Result;

/// Modifiers that can be attached to and detached from a launcher
///
/// Detaching undoes exactly what attaching did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Upgrade {
    /// Extra missiles per load, 1..=5
    AmmoCapacity { bonus: u32 },
    /// Missile speed multiplier, 1..=2
    MissileSpeed { multiplier: f32 },
    /// Reload time multiplier, 0.5..=1
    Reload { multiplier: f32 },
}

impl Upgrade {
    pub fn ammo_capacity(bonus: u32) -> Self {
        Self::AmmoCapacity {
            bonus: bonus.clamp(1, 5),
        }
    }

    pub fn missile_speed(multiplier: f32) -> Self {
        Self::MissileSpeed {
            multiplier: multiplier.max(1.0).min(2.0),
        }
    }

    pub fn reload(multiplier: f32) -> Self {
        Self::Reload {
            multiplier: multiplier.max(0.5).min(1.0),
        }
    }

    fn on_attach(&self, launcher: &mut MissileLauncher) {
        match *self {
            Upgrade::AmmoCapacity { bonus } => launcher.ammo_capacity += bonus,
            Upgrade::MissileSpeed { multiplier } => {
                launcher.missile_speed *= multiplier;
                launcher.sync_speed();
            }
            Upgrade::Reload { multiplier } => launcher.reload_time *= multiplier,
        }
    }

    fn on_detach(&self, launcher: &mut MissileLauncher) {
        match *self {
            Upgrade::AmmoCapacity { bonus } => {
                launcher.ammo_capacity = launcher.ammo_capacity.saturating_sub(bonus)
            }
            Upgrade::MissileSpeed { multiplier } => {
                launcher.missile_speed /= multiplier;
                launcher.sync_speed();
            }
            Upgrade::Reload { multiplier } => launcher.reload_time /= multiplier,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MissileLauncher {
    spawner: ProjectileSpawner,
    /// Launcher position; missiles leave from its spawn point
    pub origin: Vec2,
    /// Parent node for fired missiles
    pub parent: Option<NodeId>,
    reload_time: f32,
    ammo_capacity: u32,
    /// Unclamped speed, kept so speed upgrades detach exactly
    missile_speed: f32,
    current_reload: f32,
    current_ammo: u32,
    upgrades: Vec<Upgrade>,
}

impl MissileLauncher {
    /// A loaded, reloaded launcher firing `missile` prototypes
    pub fn new(missile: PrototypeId, origin: Vec2, config: &LauncherConfig) -> Self {
        let spawner = ProjectileSpawner::new(missile, config.projectile_speed, config.projectile_damage)
            .with_spawn_offset(Vec2::from(config.spawn_offset));
        Self {
            spawner,
            origin,
            parent: None,
            reload_time: config.reload_time,
            ammo_capacity: config.ammo_capacity,
            missile_speed: config.projectile_speed,
            current_reload: config.reload_time,
            current_ammo: config.ammo_capacity,
            upgrades: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Loaded and holding ammo
    pub fn is_ready_to_fire(&self) -> bool {
        self.current_ammo > 0 && self.current_reload >= self.reload_time
    }

    /// Advance the reload timer
    pub fn update(&mut self, dt: f32) {
        if self.current_reload < self.reload_time {
            self.current_reload += dt;
        }
    }

    /// Fire at `target` if ready; `Ok(None)` when not ready
    pub fn fire(&mut self, world: &mut CombatWorld, target: Vec2) -> Result<Option<EntityHandle>> {
        if !self.is_ready_to_fire() {
            return Ok(None);
        }
        let start = self.spawner.spawn_position(self.origin);
        let missile = self.spawner.fire(world, target, start, self.parent)?;
        self.current_reload = 0.0;
        self.current_ammo -= 1;
        Ok(Some(missile))
    }

    /// Fill the magazine back up
    pub fn refill(&mut self) {
        self.current_ammo = self.ammo_capacity;
    }

    pub fn attach(&mut self, upgrade: Upgrade) {
        upgrade.on_attach(self);
        self.upgrades.push(upgrade);
    }

    /// Detach the most recently attached upgrade equal to `upgrade`
    pub fn detach(&mut self, upgrade: Upgrade) -> bool {
        let Some(index) = self.upgrades.iter().rposition(|u| *u == upgrade) else {
            return false;
        };
        self.upgrades.remove(index);
        upgrade.on_detach(self);
        true
    }

    pub fn upgrades(&self) -> &[Upgrade] {
        &self.upgrades
    }

    pub fn ammo(&self) -> u32 {
        self.current_ammo
    }

    pub fn ammo_capacity(&self) -> u32 {
        self.ammo_capacity
    }

    pub fn reload_time(&self) -> f32 {
        self.reload_time
    }

    /// Reload progress in `[0, 1]`
    pub fn reload_progress(&self) -> f32 {
        (self.current_reload / self.reload_time).min(1.0)
    }

    pub fn missile_speed(&self) -> f32 {
        self.spawner.speed()
    }

    fn sync_speed(&mut self) {
        self.spawner.set_speed(self.missile_speed);
    }
}

/// A launcher and the building carrying it
#[derive(Debug, Clone)]
pub struct LauncherPost {
    pub slot: usize,
    pub health: HealthHandle,
    pub launcher: MissileLauncher,
}
