//! Staking and distribution records fetched from the chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::coin::{amount_string, Coin};
use crate::dec::{Dec, DecCoin};

/// An active delegation. `balance` is absent on chains that only report shares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    pub delegator_address: String,
    pub validator_address: String,
    pub shares: Dec,
    pub balance: Option<Coin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingEntry {
    pub creation_height: u64,
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(with = "amount_string")]
    pub initial_balance: u128,
    #[serde(with = "amount_string")]
    pub balance: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingDelegation {
    pub delegator_address: String,
    pub validator_address: String,
    pub entries: Vec<UnbondingEntry>,
}

impl UnbondingDelegation {
    pub fn total_balance(&self) -> u128 {
        self.entries
            .iter()
            .fold(0u128, |acc, entry| acc.saturating_add(entry.balance))
    }
}

/// Pending rewards from one validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorReward {
    pub validator_address: String,
    pub reward: Vec<DecCoin>,
}

/// All pending distribution rewards of a delegator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegatorRewards {
    pub rewards: Vec<ValidatorReward>,
    pub total: Vec<DecCoin>,
}

impl DelegatorRewards {
    pub fn for_validator(&self, validator_address: &str) -> Option<&[DecCoin]> {
        self.rewards
            .iter()
            .find(|entry| entry.validator_address == validator_address)
            .map(|entry| entry.reward.as_slice())
    }
}

/// Token pool of a validator, used to convert delegator shares into tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorTokens {
    pub operator_address: String,
    #[serde(with = "amount_string")]
    pub tokens: u128,
    pub delegator_shares: Dec,
}
