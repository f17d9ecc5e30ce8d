//! Session-wide combat broadcast
//!
//! Every health in a [`CombatWorld`] reports to the same [`CombatEvents`],
//! so listeners such as game-over checks or UI feeds can observe all damage
//! and deaths without subscribing to each health. The bus belongs to the
//! world it was created with and is dropped with it.

use rampart_event::Listeners;

use crate::events::{DamageEvent, DeathEvent};
use crate::world::CombatWorld;

/// Global damage and death hooks
#[derive(Default, Clone)]
pub struct CombatEvents {
    /// Before HP changes; may rewrite `damage`
    pub on_damage: Listeners<CombatWorld, DamageEvent>,
    /// After HP changed and local listeners ran
    pub on_damaged: Listeners<CombatWorld, DamageEvent>,
    /// Before a death commits; may set `prevented`
    pub on_die: Listeners<CombatWorld, DeathEvent>,
    /// After a death committed and local listeners ran
    pub on_died: Listeners<CombatWorld, DeathEvent>,
}

impl CombatEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every subscriber
    pub fn clear(&mut self) {
        self.on_damage.clear();
        self.on_damaged.clear();
        self.on_die.clear();
        self.on_died.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.on_damage.len() + self.on_damaged.len() + self.on_die.len() + self.on_died.len()
    }
}

impl std::fmt::Debug for CombatEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatEvents")
            .field("on_damage", &self.on_damage.len())
            .field("on_damaged", &self.on_damaged.len())
            .field("on_die", &self.on_die.len())
            .field("on_died", &self.on_died.len())
            .finish()
    }
}
