//! Player buildings and the slots they stand in
//!
//! Each building owns a health and a hitbox on its own collider. Buildings
//! are not removed from inside combat listeners: a global `on_died`
//! subscription forwards the dead health to a channel and the session
//! drains it between transactions.

use glam::Vec2;
use rampart_combat::{CollisionLayer, CombatWorld, Health, HealthHandle};
use rampart_core::ColliderId;
use rampart_event::{EventChannel, SubscriberId};
use serde::{Deserialize, Serialize};

use crate::error::{GameplayError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    /// Pays `income` at the end of every wave
    MoneyStructure { income: u64 },
    /// Holds one of the player's missile launchers
    MissileLauncher,
    /// Soaks damage, nothing else
    Bunker,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub kind: BuildingKind,
    pub slot: usize,
    pub health: HealthHandle,
    pub collider: ColliderId,
    pub position: Vec2,
    pub radius: f32,
}

impl Building {
    pub fn income(&self) -> u64 {
        match self.kind {
            BuildingKind::MoneyStructure { income } => income,
            BuildingKind::MissileLauncher | BuildingKind::Bunker => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingSlot {
    pub position: Vec2,
    occupant: Option<HealthHandle>,
}

impl BuildingSlot {
    /// Occupied while its building stands
    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }
}

/// Died notification forwarded out of the combat pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destroyed(pub HealthHandle);

/// Roster of standing buildings
#[derive(Debug)]
pub struct Buildings {
    slots: Vec<BuildingSlot>,
    standing: Vec<Building>,
    radius: f32,
    destroyed: EventChannel<Destroyed>,
    subscription: Option<SubscriberId>,
}

impl Buildings {
    pub fn new(slot_positions: &[Vec2], radius: f32) -> Self {
        Self {
            slots: slot_positions
                .iter()
                .map(|&position| BuildingSlot {
                    position,
                    occupant: None,
                })
                .collect(),
            standing: Vec::new(),
            radius,
            destroyed: EventChannel::new(),
            subscription: None,
        }
    }

    /// Forward every death in `world` to this roster
    pub fn watch(&mut self, world: &mut CombatWorld) {
        if let Some(id) = self.subscription.take() {
            world.events.on_died.unsubscribe(id);
        }
        let sender = self.destroyed.sender();
        let id = world.events.on_died.subscribe(move |_, death| {
            if let Some(target) = death.target {
                sender.send(Destroyed(target));
            }
        });
        self.subscription = Some(id);
    }

    /// Position of `slot` if something can be built there
    pub fn vacant(&self, slot: usize) -> Result<Vec2> {
        let entry = self.slots.get(slot).ok_or(GameplayError::UnknownSlot(slot))?;
        if entry.is_occupied() {
            return Err(GameplayError::SlotOccupied(slot));
        }
        Ok(entry.position)
    }

    /// Build in an empty slot
    pub fn place(
        &mut self,
        world: &mut CombatWorld,
        slot: usize,
        kind: BuildingKind,
        max_health: f32,
    ) -> Result<HealthHandle> {
        let position = self.vacant(slot)?;

        let health = world.add_health(Health::new(max_health));
        let collider = world.register_collider(CollisionLayer::BUILDINGS);
        if let Err(e) = world.attach_hitbox(collider, Some(health)) {
            world.unregister_collider(collider);
            world.remove_health(health);
            return Err(e.into());
        }

        self.slots[slot].occupant = Some(health);
        self.standing.push(Building {
            kind,
            slot,
            health,
            collider,
            position,
            radius: self.radius,
        });
        log::debug!("Placed {:?} in slot {}", kind, slot);
        Ok(health)
    }

    /// Tear a building down; its slot frees up
    pub fn remove(&mut self, world: &mut CombatWorld, health: HealthHandle) -> Option<Building> {
        let index = self.standing.iter().position(|b| b.health == health)?;
        let building = self.standing.remove(index);
        if let Some(slot) = self.slots.get_mut(building.slot) {
            slot.occupant = None;
        }
        world.unregister_collider(building.collider);
        world.remove_health(building.health);
        log::info!("Building in slot {} destroyed", building.slot);
        Some(building)
    }

    /// Remove buildings whose deaths were forwarded
    pub fn collect_destroyed(&mut self, world: &mut CombatWorld) -> Vec<Building> {
        self.destroyed
            .drain()
            .into_iter()
            .filter_map(|Destroyed(health)| self.remove(world, health))
            .collect()
    }

    /// Remove everything, e.g. before a new game
    pub fn clear(&mut self, world: &mut CombatWorld) {
        for building in std::mem::take(&mut self.standing) {
            world.unregister_collider(building.collider);
            world.remove_health(building.health);
        }
        for slot in &mut self.slots {
            slot.occupant = None;
        }
        self.destroyed.drain();
    }

    pub fn standing(&self) -> &[Building] {
        &self.standing
    }

    pub fn standing_count(&self) -> usize {
        self.standing.len()
    }

    pub fn slots(&self) -> &[BuildingSlot] {
        &self.slots
    }

    pub fn is_occupied(&self, slot: usize) -> bool {
        self.slots.get(slot).map_or(false, BuildingSlot::is_occupied)
    }

    /// Income paid by every standing money structure
    pub fn income(&self) -> u64 {
        self.standing.iter().map(Building::income).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> (CombatWorld, Buildings) {
        let mut world = CombatWorld::default();
        let mut buildings = Buildings::new(&[Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)], 0.5);
        buildings.watch(&mut world);
        (world, buildings)
    }

    #[test]
    fn test_vacant_reports_slot_position() {
        let (mut world, mut buildings) = roster();
        assert_eq!(buildings.vacant(1).unwrap(), Vec2::new(1.0, 0.0));
        buildings
            .place(&mut world, 1, BuildingKind::MissileLauncher, 40.0)
            .unwrap();
        assert!(matches!(buildings.vacant(1), Err(GameplayError::SlotOccupied(1))));
        assert_eq!(buildings.standing()[0].income(), 0);
    }

    #[test]
    fn test_place_occupies_slot() {
        let (mut world, mut buildings) = roster();
        buildings
            .place(&mut world, 1, BuildingKind::Bunker, 40.0)
            .unwrap();
        assert!(buildings.is_occupied(1));
        assert!(!buildings.is_occupied(0));
        assert!(matches!(
            buildings.place(&mut world, 1, BuildingKind::Bunker, 40.0),
            Err(GameplayError::SlotOccupied(1))
        ));
        assert!(matches!(
            buildings.place(&mut world, 7, BuildingKind::Bunker, 40.0),
            Err(GameplayError::UnknownSlot(7))
        ));
    }

    #[test]
    fn test_dead_building_is_removed() {
        let (mut world, mut buildings) = roster();
        let health = buildings
            .place(&mut world, 0, BuildingKind::MoneyStructure { income: 5 }, 10.0)
            .unwrap();
        let collider = buildings.standing()[0].collider;
        assert_eq!(buildings.income(), 5);

        world.apply_damage(health, 100.0, None);
        assert_eq!(buildings.standing_count(), 1);

        let destroyed = buildings.collect_destroyed(&mut world);
        assert_eq!(destroyed.len(), 1);
        assert_eq!(destroyed[0].slot, 0);
        assert_eq!(buildings.standing_count(), 0);
        assert!(!buildings.is_occupied(0));
        assert_eq!(buildings.income(), 0);
        assert!(world.health(health).is_none());
        assert_eq!(world.find_one(collider), None);
    }

    #[test]
    fn test_unrelated_deaths_are_ignored() {
        let (mut world, mut buildings) = roster();
        buildings
            .place(&mut world, 0, BuildingKind::Bunker, 10.0)
            .unwrap();
        let stranger = world.add_health(Health::new(1.0));
        world.kill_outright(stranger);

        assert!(buildings.collect_destroyed(&mut world).is_empty());
        assert_eq!(buildings.standing_count(), 1);
    }
}
