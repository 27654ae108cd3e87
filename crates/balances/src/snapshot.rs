use cosmex_types::{
    amount_of, sum_and_truncate, AccountInfo, Coin, DecCoin, Delegation, DelegatorRewards,
    UnbondingDelegation, ValidatorTokens,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::delegations::delegation_amount;

/// Raw inputs of a snapshot, as fetched from the chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceSources {
    pub bank: Vec<Coin>,
    pub delegations: Vec<Delegation>,
    pub unbonding: Vec<UnbondingDelegation>,
    pub rewards: DelegatorRewards,
    pub commission: Vec<DecCoin>,
    /// Validator pools by operator address, for delegations the chain did not price.
    pub pools: HashMap<String, ValidatorTokens>,
}

/// One account's balance in the staking denom.
///
/// `total` is the exact sum of every field except `vested`: vested coins are
/// already part of `available` (or `delegated`) and are only informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSnapshot {
    pub available: Coin,
    pub delegated: Coin,
    pub undelegated: Coin,
    pub rewards: Coin,
    pub commission: Coin,
    pub vesting: Coin,
    pub vested: Coin,
    pub total: Coin,
}

impl BalanceSnapshot {
    pub fn components(&self) -> [&Coin; 6] {
        [
            &self.available,
            &self.delegated,
            &self.undelegated,
            &self.rewards,
            &self.commission,
            &self.vesting,
        ]
    }
}

/// Derive the snapshot of `account` at `as_of` (unix seconds).
///
/// The same `as_of` drives the vesting evaluation for every field, so the
/// components stay consistent with each other.
pub fn compute_snapshot(
    sources: &BalanceSources,
    account: &AccountInfo,
    as_of: i64,
    denom: &str,
) -> BalanceSnapshot {
    let bank = amount_of(&sources.bank, denom);

    let delegated = sources
        .delegations
        .iter()
        .map(|delegation| {
            let pool = sources.pools.get(&delegation.validator_address);
            delegated_amount(delegation, pool, denom)
        })
        .fold(0u128, u128::saturating_add);

    let undelegated = sources
        .unbonding
        .iter()
        .map(UnbondingDelegation::total_balance)
        .fold(0u128, u128::saturating_add);

    // Sum first, truncate once.
    let rewards = amount_of(&sum_and_truncate(&sources.rewards.total), denom);
    let commission = amount_of(&sum_and_truncate(&sources.commission), denom);

    let (vesting, vested) = match account.kind.vesting_schedule() {
        Some(schedule) => {
            let position = schedule.position_at(as_of);
            let locked = amount_of(&position.vesting, denom);
            let delegated_vesting = amount_of(&schedule.base().delegated_vesting, denom);
            // Locked coins that are delegated are already counted in `delegated`.
            (
                locked.saturating_sub(delegated_vesting),
                amount_of(&position.vested, denom),
            )
        }
        None => (0, 0),
    };

    let available = bank.saturating_sub(vesting);
    let total = [available, delegated, undelegated, rewards, commission, vesting]
        .into_iter()
        .fold(0u128, u128::saturating_add);

    let coin = |amount| Coin::new(denom, amount);
    BalanceSnapshot {
        available: coin(available),
        delegated: coin(delegated),
        undelegated: coin(undelegated),
        rewards: coin(rewards),
        commission: coin(commission),
        vesting: coin(vesting),
        vested: coin(vested),
        total: coin(total),
    }
}

/// A delegation's token amount in `denom`: the reported balance, else the
/// shares priced through the validator pool, else the raw shares.
pub(crate) fn delegated_amount(
    delegation: &Delegation,
    pool: Option<&ValidatorTokens>,
    denom: &str,
) -> u128 {
    match (&delegation.balance, pool) {
        (Some(balance), _) if balance.denom == denom => balance.amount,
        (Some(_), _) => 0,
        (None, Some(pool)) => delegation_amount(&delegation.shares, pool),
        (None, None) => delegation.shares.truncate(),
    }
}
