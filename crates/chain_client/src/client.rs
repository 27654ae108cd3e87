use async_trait::async_trait;
use cosmex_types::{
    AccountInfo, BlockInfo, Coin, DecCoin, Delegation, DelegatorRewards, UnbondingDelegation,
    ValidatorTokens,
};

use crate::errors::Result;

/// Read-only view of chain state used by the query components.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Bank balance, all denominations.
    async fn get_balance(&self, address: &str) -> Result<Vec<Coin>>;

    async fn get_delegations(&self, delegator: &str) -> Result<Vec<Delegation>>;

    async fn get_unbonding_delegations(&self, delegator: &str) -> Result<Vec<UnbondingDelegation>>;

    /// Pending rewards per validator plus their untruncated total.
    async fn get_total_rewards(&self, delegator: &str) -> Result<DelegatorRewards>;

    /// Accumulated commission of a validator operator.
    async fn get_validator_commission(&self, operator: &str) -> Result<Vec<DecCoin>>;

    /// `NotFound` when the account does not exist on chain.
    async fn get_account(&self, address: &str) -> Result<AccountInfo>;

    async fn get_block(&self, height: u64) -> Result<BlockInfo>;

    async fn get_validator(&self, operator: &str) -> Result<ValidatorTokens>;
}
