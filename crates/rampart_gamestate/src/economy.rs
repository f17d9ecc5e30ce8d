//! Player funds

use crate::error::{GameplayError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Economy {
    funds: u64,
    starting_funds: u64,
}

impl Economy {
    pub fn new(starting_funds: u64) -> Self {
        Self {
            funds: starting_funds,
            starting_funds,
        }
    }

    pub fn funds(&self) -> u64 {
        self.funds
    }

    /// Back to the starting amount
    pub fn reset(&mut self) {
        self.funds = self.starting_funds;
    }

    pub fn add(&mut self, amount: u64) {
        self.funds = self.funds.saturating_add(amount);
    }

    pub fn can_afford(&self, cost: u64) -> bool {
        self.funds >= cost
    }

    /// Deduct `cost`, or leave funds untouched and fail
    pub fn spend(&mut self, cost: u64) -> Result<u64> {
        if !self.can_afford(cost) {
            return Err(GameplayError::InsufficientFunds {
                needed: cost,
                available: self.funds,
            });
        }
        self.funds -= cost;
        Ok(self.funds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spend_and_reset() {
        let mut economy = Economy::new(20);
        economy.add(15);
        assert_eq!(economy.spend(30).unwrap(), 5);
        assert!(matches!(
            economy.spend(6),
            Err(GameplayError::InsufficientFunds {
                needed: 6,
                available: 5
            })
        ));
        assert_eq!(economy.funds(), 5);

        economy.reset();
        assert_eq!(economy.funds(), 20);
    }
}
