use async_trait::async_trait;
use cosmex_types::{
    AccountInfo, BlockInfo, Coin, DecCoin, Delegation, DelegatorRewards, UnbondingDelegation,
    ValidatorTokens,
};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::client::ChainClient;
use crate::errors::{ChainClientError, Result};

/// One [`ChainClient`] method, used to inject failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainMethod {
    Balance,
    Delegations,
    Unbonding,
    Rewards,
    Commission,
    Account,
    Block,
    Validator,
}

#[derive(Default)]
struct State {
    balances: HashMap<String, Vec<Coin>>,
    delegations: HashMap<String, Vec<Delegation>>,
    unbonding: HashMap<String, Vec<UnbondingDelegation>>,
    rewards: HashMap<String, DelegatorRewards>,
    commission: HashMap<String, Vec<DecCoin>>,
    accounts: HashMap<String, AccountInfo>,
    blocks: HashMap<u64, BlockInfo>,
    validators: HashMap<String, ValidatorTokens>,
    failing: HashSet<ChainMethod>,
}

/// In-memory chain backed by hashmaps, for tests and demos.
///
/// Unknown addresses have empty balances, delegations and rewards; unknown
/// accounts, blocks and validators are `NotFound`.
#[derive(Clone, Default)]
pub struct StaticChainClient {
    state: Arc<RwLock<State>>,
}

impl StaticChainClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_balance(&self, address: &str, coins: Vec<Coin>) {
        self.state.write().balances.insert(address.to_string(), coins);
    }

    pub fn add_delegation(&self, delegation: Delegation) {
        self.state
            .write()
            .delegations
            .entry(delegation.delegator_address.clone())
            .or_default()
            .push(delegation);
    }

    pub fn add_unbonding(&self, unbonding: UnbondingDelegation) {
        self.state
            .write()
            .unbonding
            .entry(unbonding.delegator_address.clone())
            .or_default()
            .push(unbonding);
    }

    pub fn set_rewards(&self, delegator: &str, rewards: DelegatorRewards) {
        self.state
            .write()
            .rewards
            .insert(delegator.to_string(), rewards);
    }

    pub fn set_commission(&self, operator: &str, commission: Vec<DecCoin>) {
        self.state
            .write()
            .commission
            .insert(operator.to_string(), commission);
    }

    pub fn add_account(&self, account: AccountInfo) {
        self.state
            .write()
            .accounts
            .insert(account.address.clone(), account);
    }

    pub fn add_block(&self, block: BlockInfo) {
        self.state.write().blocks.insert(block.height, block);
    }

    pub fn add_validator(&self, validator: ValidatorTokens) {
        self.state
            .write()
            .validators
            .insert(validator.operator_address.clone(), validator);
    }

    /// Make every call to `method` fail with a 503.
    pub fn fail(&self, method: ChainMethod) {
        self.state.write().failing.insert(method);
    }

    pub fn recover(&self, method: ChainMethod) {
        self.state.write().failing.remove(&method);
    }

    fn check(&self, method: ChainMethod) -> Result<()> {
        if self.state.read().failing.contains(&method) {
            return Err(ChainClientError::Status {
                path: format!("{method:?}"),
                status: 503,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for StaticChainClient {
    async fn get_balance(&self, address: &str) -> Result<Vec<Coin>> {
        self.check(ChainMethod::Balance)?;
        Ok(self
            .state
            .read()
            .balances
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_delegations(&self, delegator: &str) -> Result<Vec<Delegation>> {
        self.check(ChainMethod::Delegations)?;
        Ok(self
            .state
            .read()
            .delegations
            .get(delegator)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_unbonding_delegations(&self, delegator: &str) -> Result<Vec<UnbondingDelegation>> {
        self.check(ChainMethod::Unbonding)?;
        Ok(self
            .state
            .read()
            .unbonding
            .get(delegator)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_total_rewards(&self, delegator: &str) -> Result<DelegatorRewards> {
        self.check(ChainMethod::Rewards)?;
        Ok(self
            .state
            .read()
            .rewards
            .get(delegator)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_validator_commission(&self, operator: &str) -> Result<Vec<DecCoin>> {
        self.check(ChainMethod::Commission)?;
        Ok(self
            .state
            .read()
            .commission
            .get(operator)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_account(&self, address: &str) -> Result<AccountInfo> {
        self.check(ChainMethod::Account)?;
        self.state
            .read()
            .accounts
            .get(address)
            .cloned()
            .ok_or_else(|| ChainClientError::NotFound(format!("account {address}")))
    }

    async fn get_block(&self, height: u64) -> Result<BlockInfo> {
        self.check(ChainMethod::Block)?;
        self.state
            .read()
            .blocks
            .get(&height)
            .cloned()
            .ok_or_else(|| ChainClientError::NotFound(format!("block {height}")))
    }

    async fn get_validator(&self, operator: &str) -> Result<ValidatorTokens> {
        self.check(ChainMethod::Validator)?;
        self.state
            .read()
            .validators
            .get(operator)
            .cloned()
            .ok_or_else(|| ChainClientError::NotFound(format!("validator {operator}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmex_types::AccountKind;

    #[tokio::test]
    async fn serves_canned_data_and_injected_failures() {
        let chain = StaticChainClient::new();
        chain.set_balance("cosmos1a", vec![Coin::new("uatom", 5)]);
        chain.add_account(AccountInfo {
            address: "cosmos1a".to_string(),
            kind: AccountKind::Base,
        });

        assert_eq!(
            chain.get_balance("cosmos1a").await.unwrap(),
            vec![Coin::new("uatom", 5)]
        );
        assert!(chain.get_balance("cosmos1b").await.unwrap().is_empty());
        assert!(chain.get_account("cosmos1b").await.unwrap_err().is_not_found());

        chain.fail(ChainMethod::Balance);
        assert!(chain.get_balance("cosmos1a").await.unwrap_err().is_retryable());
        chain.recover(ChainMethod::Balance);
        assert!(chain.get_balance("cosmos1a").await.is_ok());
    }
}
