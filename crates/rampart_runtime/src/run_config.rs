//! Run configuration
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. TOML file named by `RAMPART_CONFIG` (gameplay keys plus a `[run]` table)
//! 3. `RAMPART_WAVES` environment variable
//! 4. First command line argument (wave count)

use std::path::Path;

use rampart_gamestate::GameplayConfig;
use serde::{Deserialize, Serialize};

pub const CONFIG_ENV: &str = "RAMPART_CONFIG";
pub const WAVES_ENV: &str = "RAMPART_WAVES";

/// How the headless run is driven
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Waves to play before stopping
    pub waves: u32,
    /// Physics ticks per second
    pub tick_rate: f32,
    /// Give up on a wave after this many simulated seconds
    pub max_wave_seconds: f32,
    /// Let the launcher shoot at incoming projectiles
    pub autopilot: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            waves: 5,
            tick_rate: 60.0,
            max_wave_seconds: 120.0,
            autopilot: true,
        }
    }
}

impl RunSettings {
    pub fn tick(&self) -> f32 {
        1.0 / self.tick_rate
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RunTable {
    run: RunSettings,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunConfig {
    pub run: RunSettings,
    pub gameplay: GameplayConfig,
    /// File the config came from, if any
    pub source: Option<String>,
}

impl RunConfig {
    /// Load from all sources
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => {
                let config = Self::load_from_file(&path)?;
                log::info!("Loaded run config from {}", path);
                config
            }
            Err(_) => Self::default(),
        };

        if let Ok(waves) = std::env::var(WAVES_ENV) {
            config.override_waves(&waves, "env");
        }
        if let Some(waves) = std::env::args().nth(1) {
            config.override_waves(&waves, "args");
        }

        Ok(config)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&source)?;
        config.source = Some(path.display().to_string());
        Ok(config)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let gameplay = GameplayConfig::from_toml_str(source)?;
        let table: RunTable = toml::from_str(source)?;
        if !(table.run.tick_rate > 0.0) {
            return Err(format!("run.tick_rate must be positive, got {}", table.run.tick_rate).into());
        }
        Ok(Self {
            run: table.run,
            gameplay,
            source: None,
        })
    }

    fn override_waves(&mut self, value: &str, origin: &str) {
        match value.parse() {
            Ok(waves) => {
                self.run.waves = waves;
                log::info!("Wave count from {}: {}", origin, waves);
            }
            Err(_) => log::warn!("Ignoring wave count {:?} from {}", value, origin),
        }
    }

    pub fn print_summary(&self) {
        log::info!("Run Configuration:");
        log::info!(
            "  Waves: {}, tick rate: {} Hz, autopilot: {}",
            self.run.waves,
            self.run.tick_rate,
            self.run.autopilot
        );
        log::info!(
            "  Shots per wave: {}, seed: {}",
            self.gameplay.waves.shots_per_wave,
            self.gameplay.seed
        );
        if let Some(path) = &self.source {
            log::info!("  Config: {}", path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_run_table_and_gameplay_share_a_file() {
        let config = RunConfig::from_toml_str(
            r#"
            seed = 7

            [run]
            waves = 2
            autopilot = false

            [waves]
            shots_per_wave = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.run.waves, 2);
        assert!(!config.run.autopilot);
        assert_eq!(config.run.tick_rate, 60.0);
        assert_eq!(config.gameplay.seed, 7);
        assert_eq!(config.gameplay.waves.shots_per_wave, 4);
    }

    #[test]
    fn test_rejects_zero_tick_rate() {
        assert!(RunConfig::from_toml_str("[run]\ntick_rate = 0.0\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[run]\nwaves = 9").unwrap();

        let config = RunConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.run.waves, 9);
        assert_eq!(config.gameplay, GameplayConfig::default());
        assert!(config.source.is_some());
    }

    #[test]
    fn test_bad_wave_override_is_ignored() {
        let mut config = RunConfig::default();
        config.override_waves("lots", "test");
        assert_eq!(config.run.waves, 5);
        config.override_waves("3", "test");
        assert_eq!(config.run.waves, 3);
    }
}
