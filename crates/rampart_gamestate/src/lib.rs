//! Rampart GameState - Session Flow
//!
//! The collaborators around the combat core.
//!
//! # Features
//!
//! - Enemy waves as resumable sequences (fire, drain, cool down)
//! - Economy with per-wave income from money structures
//! - Buildings bought into slots, torn down when their health dies
//! - Missile launchers as buildings, with reload, ammo and detachable upgrades
//! - `Gameplay` session: new game, next wave, game over
//!
//! # Example
//!
//! ```ignore
//! use rampart_gamestate::prelude::*;
//!
//! let mut game = Gameplay::new(GameplayConfig::load("rampart.toml")?)?;
//! game.begin_new_game()?;
//! loop {
//!     game.fixed_update(1.0 / 60.0);
//!     game.update(1.0 / 60.0);
//!     if game.is_game_over() {
//!         break;
//!     }
//! }
//! ```

pub mod building;
pub mod config;
pub mod economy;
pub mod error;
pub mod launcher;
pub mod state;
pub mod wave;

pub mod prelude {
    pub use crate::building::{Building, BuildingKind, BuildingSlot, Buildings};
    pub use crate::config::{
        BuildingSetup, GameplayConfig, LauncherConfig, Offer, ShopConfig, Viewport, WaveConfig,
    };
    pub use crate::economy::Economy;
    pub use crate::error::{GameplayError, Result};
    pub use crate::launcher::{LauncherPost, MissileLauncher, Upgrade};
    pub use crate::state::{Gameplay, SessionState, StateTransition};
    pub use crate::wave::{WaveController, WaveEnded, WaveSequence};
}

pub use prelude::*;
