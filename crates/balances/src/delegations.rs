use cosmex_types::{sum_and_truncate, Coin, Dec, DecCoin, Delegation, ValidatorTokens};
use serde::{Deserialize, Serialize};

/// A delegation as listed for an account, with display enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegationView {
    pub validator_address: String,
    /// Empty when the validator is not indexed or the lookup failed.
    pub moniker: String,
    pub shares: Dec,
    pub amount: Coin,
    /// Never empty: a validator paying nothing is reported as one zero coin.
    pub rewards: Vec<Coin>,
}

/// Tokens represented by `shares` in a validator pool:
/// `shares * tokens / delegator_shares`.
///
/// A pool with zero delegator shares reports the shares themselves.
pub fn delegation_amount(shares: &Dec, validator: &ValidatorTokens) -> u128 {
    shares
        .mul(&Dec::from_int(validator.tokens))
        .checked_div(&validator.delegator_shares)
        .unwrap_or_else(|| shares.clone())
        .truncate()
}

/// Build the listed view of one delegation.
///
/// `validator` is only consulted when the chain did not report the
/// delegation's balance; without either, raw shares are reported.
pub fn enrich_delegation(
    delegation: &Delegation,
    moniker: String,
    validator: Option<&ValidatorTokens>,
    rewards: Option<&[DecCoin]>,
    denom: &str,
) -> DelegationView {
    let amount = match (&delegation.balance, validator) {
        (Some(balance), _) => balance.clone(),
        (None, Some(validator)) => Coin::new(denom, delegation_amount(&delegation.shares, validator)),
        (None, None) => Coin::new(denom, delegation.shares.truncate()),
    };

    let mut rewards = rewards.map(sum_and_truncate).unwrap_or_default();
    if rewards.is_empty() {
        rewards.push(Coin::zero(denom));
    }

    DelegationView {
        validator_address: delegation.validator_address.clone(),
        moniker,
        shares: delegation.shares.clone(),
        amount,
        rewards,
    }
}
