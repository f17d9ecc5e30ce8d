//! Health records and the damage/heal/death pipeline
//!
//! A damage transaction runs, synchronously and in this order:
//!
//! 1. global `on_damage` (may rewrite the requested damage)
//! 2. clamp to `[0, current]`, write `damage_dealt`, subtract
//! 3. the health's own `on_damaged`, then global `on_damaged`
//! 4. if the health is now dead, a death transaction caused by this damage
//!
//! A death transaction runs global `on_die` first; a listener that sets
//! `prevented` aborts it there. Otherwise HP is zeroed, the health's own
//! `on_death` and then global `on_died` run, and the health is disabled for
//! good.
//!
//! Listeners receive the world mutably and may start nested transactions;
//! those finish before the outer transaction continues. Every step re-resolves
//! the health handle because a listener may have removed it.

use rampart_event::Listeners;

use crate::entity::EntityHandle;
use crate::events::{DamageEvent, DeathEvent, HealEvent};
use crate::hitbox::HitboxHandle;
use crate::world::CombatWorld;

use rampart_core::Handle;

/// Handle to a [`Health`] owned by a [`CombatWorld`]
pub type HealthHandle = Handle<Health>;

/// Hit points of one entity
#[derive(Clone, Debug)]
pub struct Health {
    current: f32,
    max: f32,
    enabled: bool,
    pub(crate) hitboxes: Vec<HitboxHandle>,
    pub on_damaged: Listeners<CombatWorld, DamageEvent>,
    pub on_death: Listeners<CombatWorld, DeathEvent>,
    pub on_healed: Listeners<CombatWorld, HealEvent>,
}

impl Health {
    /// Full health; `max` is raised to at least 1
    pub fn new(max: f32) -> Self {
        let max = if max >= 1.0 { max } else { 1.0 };
        Self {
            current: max,
            max,
            enabled: true,
            hitboxes: Vec::new(),
            on_damaged: Listeners::new(),
            on_death: Listeners::new(),
            on_healed: Listeners::new(),
        }
    }

    /// Start at `current`, clamped to `[0, max]`
    pub fn with_current(mut self, current: f32) -> Self {
        self.current = current.max(0.0).min(self.max);
        self
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    /// False once a death has committed
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `current / max`, for health bars
    pub fn normalized(&self) -> f32 {
        self.current / self.max
    }

    /// Hitboxes registered against this health, in registration order
    pub fn hitboxes(&self) -> &[HitboxHandle] {
        &self.hitboxes
    }
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl CombatWorld {
    /// Run a damage transaction against `target`
    ///
    /// No-op when the target is already dead. Negative, NaN or excessive
    /// damage is clamped, never rejected.
    pub fn take_damage(&mut self, target: HealthHandle, event: &mut DamageEvent) {
        match self.healths.get(target) {
            Some(health) if health.is_dead() => return,
            Some(_) => {}
            None => {
                log::warn!("Damage against unknown health {}", target);
                return;
            }
        }
        event.target = Some(target);

        self.events.on_damage.snapshot().dispatch(self, event);

        let Some(health) = self.healths.get_mut(target) else {
            return;
        };
        // max/min rather than clamp: NaN damage deals nothing
        let dealt = event.damage.max(0.0).min(health.current);
        event.damage_dealt = dealt;
        health.current -= dealt;

        let local = health.on_damaged.snapshot();
        local.dispatch(self, event);
        self.events.on_damaged.snapshot().dispatch(self, event);

        let lethal = self
            .healths
            .get(target)
            .map_or(false, |health| health.is_dead() && health.enabled);
        if lethal {
            let mut death = self.death_events.checkout();
            death.cause = Some(event.clone());
            self.kill(target, &mut death);
        }
    }

    /// Run a death transaction against `target`
    ///
    /// No-op when the target's death already committed.
    pub fn kill(&mut self, target: HealthHandle, event: &mut DeathEvent) {
        match self.healths.get(target) {
            Some(health) if !health.enabled => return,
            Some(_) => {}
            None => {
                log::warn!("Kill of unknown health {}", target);
                return;
            }
        }
        event.target = Some(target);

        self.events.on_die.snapshot().dispatch(self, event);
        if event.prevented {
            log::debug!("Death of {} prevented", target);
            return;
        }

        let Some(health) = self.healths.get_mut(target) else {
            return;
        };
        health.current = 0.0;

        let local = health.on_death.snapshot();
        local.dispatch(self, event);
        self.events.on_died.snapshot().dispatch(self, event);

        if let Some(health) = self.healths.get_mut(target) {
            health.enabled = false;
        }
        log::debug!("Health {} died", target);
    }

    /// Run a heal transaction against `target`
    ///
    /// Restores at most the missing health. Only the health's own listeners
    /// hear about it. A health whose death committed cannot be healed.
    pub fn heal(&mut self, target: HealthHandle, event: &mut HealEvent) {
        event.target = Some(target);
        let Some(health) = self.healths.get_mut(target) else {
            log::warn!("Heal of unknown health {}", target);
            return;
        };
        if !health.enabled {
            event.restored_health = 0.0;
            return;
        }

        let restored = event.amount.max(0.0).min(health.max - health.current);
        event.restored_health = restored;
        health.current += restored;

        let local = health.on_healed.snapshot();
        local.dispatch(self, event);
    }

    /// Deal `amount` with a pooled event; returns the damage dealt
    pub fn apply_damage(
        &mut self,
        target: HealthHandle,
        amount: f32,
        source: Option<EntityHandle>,
    ) -> f32 {
        let mut event = self.damage_events.checkout();
        event.damage = amount;
        event.source = source;
        self.take_damage(target, &mut event);
        event.damage_dealt
    }

    /// Heal by `amount` with a pooled event; returns the health restored
    pub fn restore_health(&mut self, target: HealthHandle, amount: f32) -> f32 {
        let mut event = self.heal_events.checkout();
        event.amount = amount;
        self.heal(target, &mut event);
        event.restored_health
    }

    /// Kill without a damage cause; returns true if the death committed
    pub fn kill_outright(&mut self, target: HealthHandle) -> bool {
        if !self.healths.get(target).map_or(false, Health::is_enabled) {
            return false;
        }
        let mut event = self.death_events.checkout();
        self.kill(target, &mut event);
        !event.prevented
    }

    /// `current / max` of `target`
    pub fn normalized_health(&self, target: HealthHandle) -> Option<f32> {
        self.healths.get(target).map(Health::normalized)
    }

    pub fn is_dead(&self, target: HealthHandle) -> bool {
        self.healths.get(target).map_or(true, Health::is_dead)
    }
}
