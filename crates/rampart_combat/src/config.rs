//! Combat configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, Result};

/// Sizing of the combat world's pools and caches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Records preallocated on each event free list
    pub event_pool_capacity: usize,

    /// Minimum capacity reserved for each prototype's inactive stack
    pub stack_capacity: usize,

    /// Initial capacity of the owner-dedup scratch set
    pub scratch_capacity: usize,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            event_pool_capacity: 4,
            stack_capacity: 16,
            scratch_capacity: 32,
        }
    }
}

impl CombatConfig {
    /// Parse from TOML; missing keys take their defaults
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| CombatError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        log::debug!("Loading combat config from {}", path.display());
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.stack_capacity == 0 {
            return Err(CombatError::InvalidConfig(
                "stack_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CombatConfig::from_toml_str("stack_capacity = 64").unwrap();
        assert_eq!(config.stack_capacity, 64);
        assert_eq!(config.event_pool_capacity, 4);
        assert_eq!(config.scratch_capacity, 32);
    }

    #[test]
    fn test_rejects_zero_stack() {
        assert!(matches!(
            CombatConfig::from_toml_str("stack_capacity = 0"),
            Err(CombatError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(CombatConfig::from_toml_str("stack_capacity = \"many\"").is_err());
    }
}
