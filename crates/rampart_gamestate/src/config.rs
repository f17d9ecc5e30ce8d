//! Gameplay configuration

use std::path::Path;

use glam::Vec2;
use rampart_combat::CombatConfig;
use rampart_core::WaitPoint;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::building::BuildingKind;
use crate::error::{GameplayError, Result};

/// Playing field bounds; enemies fire from the top edge at the bottom edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Viewport {
    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.x_min + self.x_max) * 0.5,
            (self.y_min + self.y_max) * 0.5,
        )
    }

    /// Uniform x in `[x_min, x_max)`
    pub fn random_x(&self, rng: &mut impl Rng) -> f32 {
        rng.gen_range(self.x_min..self.x_max)
    }

    pub fn contains(&self, point: Vec2) -> bool {
        (self.x_min..=self.x_max).contains(&point.x) && (self.y_min..=self.y_max).contains(&point.y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_min: -8.0,
            x_max: 8.0,
            y_min: -4.5,
            y_max: 4.5,
        }
    }
}

/// Enemy wave settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub shots_per_wave: u32,
    /// Wait before each shot
    pub shot_interval: WaitPoint,
    /// Wait after the last enemy projectile is gone
    pub wave_cooldown: WaitPoint,
    pub projectile_speed: f32,
    pub projectile_damage: f32,
    pub projectile_radius: f32,
    /// Radius of the blast where an enemy projectile lands
    pub explosion_radius: f32,
    pub explosion_duration: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            shots_per_wave: 10,
            shot_interval: WaitPoint::HalfSecond,
            wave_cooldown: WaitPoint::OneSecond,
            projectile_speed: 3.0,
            projectile_damage: 25.0,
            projectile_radius: 0.15,
            explosion_radius: 0.75,
            explosion_duration: 0.5,
        }
    }
}

/// Missile launcher settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Seconds between shots, 0.02..=3
    pub reload_time: f32,
    /// Missiles per load, 1..=50
    pub ammo_capacity: u32,
    pub projectile_speed: f32,
    pub projectile_damage: f32,
    /// Spawn point relative to the launcher
    pub spawn_offset: [f32; 2],
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            reload_time: 1.0,
            ammo_capacity: 10,
            projectile_speed: 10.0,
            projectile_damage: 10.0,
            spawn_offset: [0.0, 0.5],
        }
    }
}

/// Price and toughness of one kind of building
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub cost: u64,
    pub max_health: f32,
}

/// What the player can build in an empty slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShopConfig {
    pub money_structure: Offer,
    pub missile_launcher: Offer,
    pub bunker: Offer,
}

impl ShopConfig {
    pub fn offer(&self, kind: &BuildingKind) -> Offer {
        match kind {
            BuildingKind::MoneyStructure { .. } => self.money_structure,
            BuildingKind::MissileLauncher => self.missile_launcher,
            BuildingKind::Bunker => self.bunker,
        }
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            money_structure: Offer {
                cost: 30,
                max_health: 50.0,
            },
            missile_launcher: Offer {
                cost: 50,
                max_health: 75.0,
            },
            bunker: Offer {
                cost: 20,
                max_health: 100.0,
            },
        }
    }
}

/// A building placed when a new game begins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSetup {
    pub slot: usize,
    pub kind: BuildingKind,
    pub max_health: f32,
}

/// Complete session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplayConfig {
    pub viewport: Viewport,
    pub waves: WaveConfig,
    pub launcher: LauncherConfig,
    pub shop: ShopConfig,
    pub starting_funds: u64,
    /// Building slot positions
    pub slots: Vec<[f32; 2]>,
    /// Slot footprint radius
    pub building_radius: f32,
    pub initial_buildings: Vec<BuildingSetup>,
    /// Seed for wave randomness
    pub seed: u64,
    pub combat: CombatConfig,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        let slots: Vec<[f32; 2]> = (0..5).map(|i| [-6.0 + 3.0 * i as f32, -4.0]).collect();
        let initial_buildings = vec![
            BuildingSetup {
                slot: 0,
                kind: BuildingKind::MoneyStructure { income: 10 },
                max_health: 50.0,
            },
            BuildingSetup {
                slot: 2,
                kind: BuildingKind::MissileLauncher,
                max_health: 75.0,
            },
            BuildingSetup {
                slot: 4,
                kind: BuildingKind::MoneyStructure { income: 10 },
                max_health: 50.0,
            },
        ];

        Self {
            viewport: Viewport::default(),
            waves: WaveConfig::default(),
            launcher: LauncherConfig::default(),
            shop: ShopConfig::default(),
            starting_funds: 0,
            slots,
            building_radius: 0.5,
            initial_buildings,
            seed: 42,
            combat: CombatConfig::default(),
        }
    }
}

impl GameplayConfig {
    /// Parse from TOML; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| GameplayError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        log::info!("Loading gameplay config from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(GameplayError::InvalidConfig(msg));

        let v = &self.viewport;
        if !(v.x_min < v.x_max && v.y_min < v.y_max) {
            return invalid(format!("empty viewport {:?}", v));
        }
        if self.waves.projectile_speed <= 0.0 {
            return invalid("waves.projectile_speed must be positive".into());
        }
        if !(0.02..=3.0).contains(&self.launcher.reload_time) {
            return invalid(format!(
                "launcher.reload_time {} outside 0.02..=3",
                self.launcher.reload_time
            ));
        }
        if !(1..=50).contains(&self.launcher.ammo_capacity) {
            return invalid(format!(
                "launcher.ammo_capacity {} outside 1..=50",
                self.launcher.ammo_capacity
            ));
        }
        for setup in &self.initial_buildings {
            if setup.slot >= self.slots.len() {
                return invalid(format!("initial building in missing slot {}", setup.slot));
            }
        }
        let shop = &self.shop;
        for offer in [shop.money_structure, shop.missile_launcher, shop.bunker] {
            if !(offer.max_health > 0.0) {
                return invalid(format!("shop offer with max_health {}", offer.max_health));
            }
        }
        self.combat
            .validate()
            .map_err(|e| GameplayError::InvalidConfig(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(GameplayConfig::default().validate().is_ok());
    }

    #[test]
    fn test_wait_points_parse_by_name() {
        let config = GameplayConfig::from_toml_str(
            r#"
            [waves]
            shots_per_wave = 3
            shot_interval = "quarter_second"
            wave_cooldown = "two_seconds"
            "#,
        )
        .unwrap();
        assert_eq!(config.waves.shots_per_wave, 3);
        assert_eq!(config.waves.shot_interval, WaitPoint::QuarterSecond);
        assert_eq!(config.waves.wave_cooldown, WaitPoint::TwoSeconds);
        assert_eq!(config.launcher, LauncherConfig::default());
    }

    #[test]
    fn test_rejects_bad_launcher() {
        let result = GameplayConfig::from_toml_str("[launcher]\nammo_capacity = 0\n");
        assert!(matches!(result, Err(GameplayError::InvalidConfig(_))));
    }

    #[test]
    fn test_shop_prices_by_kind() {
        let config = GameplayConfig::from_toml_str(
            r#"
            [shop.bunker]
            cost = 5
            max_health = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.shop.offer(&BuildingKind::Bunker).cost, 5);
        assert_eq!(
            config.shop.offer(&BuildingKind::MoneyStructure { income: 99 }),
            ShopConfig::default().money_structure
        );
    }

    #[test]
    fn test_rejects_building_outside_slots() {
        let mut config = GameplayConfig::default();
        config.initial_buildings[0].slot = 99;
        assert!(config.validate().is_err());
    }
}
