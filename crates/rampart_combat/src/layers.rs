//! Collision layers and interaction masks

use serde::{Deserialize, Serialize};

/// A collision layer identifier (0..32)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollisionLayer(pub u32);

impl CollisionLayer {
    /// Default layer
    pub const DEFAULT: Self = Self(0);
    /// Player buildings
    pub const BUILDINGS: Self = Self(8);
    /// Incoming enemy projectiles
    pub const ENEMY_PROJECTILES: Self = Self(9);
    /// Player missiles
    pub const PLAYER_PROJECTILES: Self = Self(10);
    /// Explosion areas
    pub const EXPLOSIONS: Self = Self(11);

    /// Create a custom layer
    pub const fn custom(id: u32) -> Self {
        Self(id)
    }

    /// Get the layer as a bitmask; layers past 31 have no bit
    pub fn as_mask(&self) -> u32 {
        1u32.checked_shl(self.0).unwrap_or(0)
    }
}

impl Default for CollisionLayer {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Allow-list of layers a projectile may hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionMask(pub u32);

impl InteractionMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    pub fn from_layers(layers: &[CollisionLayer]) -> Self {
        Self(layers.iter().fold(0, |acc, layer| acc | layer.as_mask()))
    }

    /// True when the layer's bit is set
    pub fn contains(&self, layer: CollisionLayer) -> bool {
        self.0 == self.0 | layer.as_mask() && layer.as_mask() != 0
    }

    pub fn with(self, layer: CollisionLayer) -> Self {
        Self(self.0 | layer.as_mask())
    }

    pub fn without(self, layer: CollisionLayer) -> Self {
        Self(self.0 & !layer.as_mask())
    }
}

impl Default for InteractionMask {
    fn default() -> Self {
        Self::ALL
    }
}
