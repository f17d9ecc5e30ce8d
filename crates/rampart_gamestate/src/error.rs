//! Error types for session flow

use rampart_combat::CombatError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GameplayError {
    #[error("Combat error: {0}")]
    Combat(#[from] CombatError),

    #[error("Invalid gameplay configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Building slot {0} does not exist")]
    UnknownSlot(usize),

    #[error("Building slot {0} is occupied")]
    SlotOccupied(usize),

    #[error("No game in progress")]
    NotPlaying,

    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },
}

pub type Result<T> = std::result::Result<T, GameplayError>;
