//! The combat world: owner of every health, hitbox and pooled entity
//!
//! One `CombatWorld` exists per game session. Everything that takes part in
//! a combat transaction lives here so listeners can re-enter it through the
//! `&mut CombatWorld` they are handed.

use std::collections::{HashMap, HashSet};

use rampart_core::{
    ColliderId, HandleMap, IdGenerator, NodeId, Scheduled, Scheduler, Tick,
};
use rampart_memory::{EntityPool, EventPool};

use crate::bus::CombatEvents;
use crate::config::CombatConfig;
use crate::entity::CombatEntity;
use crate::error::{CombatError, Result};
use crate::events::{DamageEvent, DeathEvent, HealEvent};
use crate::health::{Health, HealthHandle};
use crate::hitbox::{ColliderEntry, Hitbox, HitboxHandle};

pub struct CombatWorld {
    config: CombatConfig,
    pub(crate) ids: IdGenerator,

    pub(crate) healths: HandleMap<Health>,
    pub(crate) hitboxes: HandleMap<Hitbox>,
    pub(crate) colliders: HashMap<ColliderId, ColliderEntry>,
    /// Owner dedup set for batch hitbox queries, empty between calls
    pub(crate) scratch: HashSet<HealthHandle>,
    pub(crate) overlap_hits: Vec<HitboxHandle>,

    /// Session-wide damage and death hooks
    pub events: CombatEvents,
    pub(crate) damage_events: EventPool<DamageEvent>,
    pub(crate) death_events: EventPool<DeathEvent>,
    pub(crate) heal_events: EventPool<HealEvent>,

    pub(crate) entities: EntityPool<CombatEntity>,
    pub(crate) scheduler: Scheduler<CombatWorld>,
}

impl CombatWorld {
    pub fn new(config: CombatConfig) -> Self {
        let ids = IdGenerator::new();
        let pool_node = ids.next_node();
        let capacity = config.event_pool_capacity;

        Self {
            ids,
            healths: HandleMap::new(),
            hitboxes: HandleMap::new(),
            colliders: HashMap::new(),
            scratch: HashSet::with_capacity(config.scratch_capacity),
            overlap_hits: Vec::new(),
            events: CombatEvents::new(),
            damage_events: EventPool::with_capacity(capacity),
            death_events: EventPool::with_capacity(capacity),
            heal_events: EventPool::with_capacity(capacity),
            entities: EntityPool::with_stack_capacity(pool_node, config.stack_capacity),
            scheduler: Scheduler::new(),
            config,
        }
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Allocate a fresh transform node id
    pub fn create_node(&self) -> NodeId {
        self.ids.next_node()
    }

    pub fn add_health(&mut self, health: Health) -> HealthHandle {
        self.healths.insert(health)
    }

    /// Remove a health together with the hitboxes that forward to it
    pub fn remove_health(&mut self, handle: HealthHandle) -> Option<Health> {
        let health = self.healths.remove(handle)?;
        for hitbox in &health.hitboxes {
            if let Some(removed) = self.hitboxes.remove(*hitbox) {
                if let Some(entry) = self.colliders.get_mut(&removed.collider()) {
                    entry.hitbox = None;
                }
            }
        }
        Some(health)
    }

    pub fn health(&self, handle: HealthHandle) -> Option<&Health> {
        self.healths.get(handle)
    }

    /// Mutable access, e.g. to subscribe local listeners
    pub fn health_mut(&mut self, handle: HealthHandle) -> Result<&mut Health> {
        self.healths
            .get_mut(handle)
            .ok_or(CombatError::UnknownHealth(handle))
    }

    pub fn health_count(&self) -> usize {
        self.healths.len()
    }

    /// The entity pool
    pub fn entities(&self) -> &EntityPool<CombatEntity> {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityPool<CombatEntity> {
        &mut self.entities
    }

    pub fn scheduler(&self) -> &Scheduler<CombatWorld> {
        &self.scheduler
    }

    /// Event records checked out and not yet returned, across all kinds
    pub fn outstanding_events(&self) -> usize {
        self.damage_events.outstanding()
            + self.death_events.outstanding()
            + self.heal_events.outstanding()
    }

    /// One physics step: age entities, then resume physics-tick waits
    pub fn fixed_update(&mut self, dt: f32) {
        self.age_entities(dt);
        Scheduler::poll(self, Tick::FixedUpdate);
    }

    /// One rendered frame: advance timed waits, then end-of-frame waits
    pub fn update(&mut self, dt: f32) {
        Scheduler::poll(self, Tick::Frame(dt));
        Scheduler::poll(self, Tick::EndOfFrame);
    }

    /// Cancel every pending sequence, e.g. delayed releases
    pub fn cancel_sequences(&mut self) -> usize {
        let cancelled = self.scheduler.cancel_all();
        if cancelled > 0 {
            log::debug!("Cancelled {} pending sequences", cancelled);
        }
        cancelled
    }

    /// Release every active entity parented under `node`
    pub fn release_children(&mut self, node: NodeId) -> usize {
        let children: Vec<_> = self
            .entities
            .iter_active()
            .filter(|(_, slot)| slot.parent() == Some(node))
            .map(|(handle, _)| handle)
            .collect();
        for handle in &children {
            self.entities.release(*handle, true);
        }
        children.len()
    }
}

impl Scheduled for CombatWorld {
    fn scheduler_mut(&mut self) -> &mut Scheduler<Self> {
        &mut self.scheduler
    }
}

impl Default for CombatWorld {
    fn default() -> Self {
        Self::new(CombatConfig::default())
    }
}

impl std::fmt::Debug for CombatWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatWorld")
            .field("healths", &self.healths.len())
            .field("hitboxes", &self.hitboxes.len())
            .field("colliders", &self.colliders.len())
            .field("entities", &self.entities.stats())
            .field("scheduler", &self.scheduler)
            .field("events", &self.events)
            .finish()
    }
}
