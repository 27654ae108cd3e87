use chrono::{DateTime, Utc};
use cosmex_chain_client::{ChainClient, ChainClientError};
use cosmex_storage::ValidatorRepository;
use cosmex_types::{ChainConfig, Delegation, DelegatorRewards, ExplorerError, Result, ValidatorTokens};
use cosmex_validator_resolution::{account_to_operator, decode_bech32};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::delegations::{enrich_delegation, DelegationView};
use crate::snapshot::{compute_snapshot, BalanceSnapshot, BalanceSources};

/// Fetches balance sources for an account and folds them into snapshots.
#[derive(Clone)]
pub struct BalanceAggregator {
    chain: Arc<dyn ChainClient>,
    validators: Arc<dyn ValidatorRepository>,
    config: Arc<ChainConfig>,
}

impl BalanceAggregator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        validators: Arc<dyn ValidatorRepository>,
        config: Arc<ChainConfig>,
    ) -> Self {
        Self {
            chain,
            validators,
            config,
        }
    }

    /// Snapshot of `address` with vesting evaluated at `as_of`.
    ///
    /// The account lookup is the only fatal fetch: a missing account is
    /// `NotFound`, an unreachable chain `UpstreamUnavailable`. Every other
    /// source degrades to zero on failure.
    pub async fn snapshot(&self, address: &str, as_of: DateTime<Utc>) -> Result<BalanceSnapshot> {
        let address = self.validate_account_address(address)?;
        let operator = self.operator_address(&address);
        let chain = self.chain.as_ref();

        let commission = async {
            match &operator {
                Some(operator) => chain.get_validator_commission(operator).await,
                None => Ok(Vec::new()),
            }
        };

        let (account, bank, delegations, unbonding, rewards, commission) = tokio::join!(
            chain.get_account(&address),
            chain.get_balance(&address),
            chain.get_delegations(&address),
            chain.get_unbonding_delegations(&address),
            chain.get_total_rewards(&address),
            commission,
        );

        let account = account.map_err(ExplorerError::from)?;
        let delegations = degrade("delegations", &address, delegations);
        let pools = delegations
            .iter()
            .zip(self.pools_for(&delegations).await)
            .filter_map(|(delegation, pool)| Some((delegation.validator_address.clone(), pool?)))
            .collect();
        let sources = BalanceSources {
            bank: degrade("bank", &address, bank),
            delegations,
            unbonding: degrade("unbonding", &address, unbonding),
            rewards: degrade("rewards", &address, rewards),
            commission: degrade("commission", &address, commission),
            pools,
        };

        let snapshot = compute_snapshot(
            &sources,
            &account,
            as_of.timestamp(),
            &self.config.staking_denom,
        );
        debug!(
            address = %address,
            account_type = account.kind.type_name(),
            as_of = %as_of,
            total = %snapshot.total,
            "computed balance snapshot"
        );
        Ok(snapshot)
    }

    /// List the account's delegations with moniker, token amount and pending rewards.
    ///
    /// Failing to fetch the delegations themselves is fatal; rewards, monikers
    /// and validator pools only enrich the listing and degrade silently.
    pub async fn delegations(&self, address: &str) -> Result<Vec<DelegationView>> {
        let address = self.validate_account_address(address)?;
        let chain = self.chain.as_ref();

        let (delegations, rewards) = tokio::join!(
            chain.get_delegations(&address),
            chain.get_total_rewards(&address),
        );
        let delegations = delegations.map_err(ExplorerError::from)?;
        let rewards: DelegatorRewards = degrade("rewards", &address, rewards);

        let pools = self.pools_for(&delegations).await;

        let denom = &self.config.staking_denom;
        Ok(delegations
            .iter()
            .zip(pools.iter())
            .map(|(delegation, pool)| {
                enrich_delegation(
                    delegation,
                    self.moniker(&delegation.validator_address),
                    pool.as_ref(),
                    rewards.for_validator(&delegation.validator_address),
                    denom,
                )
            })
            .collect())
    }

    /// Validator pools for the delegations the chain did not price, index-aligned
    /// with `delegations`. A failed lookup leaves `None` so the raw shares are used.
    async fn pools_for(&self, delegations: &[Delegation]) -> Vec<Option<ValidatorTokens>> {
        let chain = self.chain.as_ref();
        join_all(delegations.iter().map(|delegation| async move {
            if delegation.balance.is_some() {
                return None;
            }
            match chain.get_validator(&delegation.validator_address).await {
                Ok(pool) => Some(pool),
                Err(err) => {
                    warn!(
                        validator = %delegation.validator_address,
                        error = %err,
                        "validator pool unavailable, reporting raw shares"
                    );
                    None
                }
            }
        }))
        .await
    }

    fn validate_account_address(&self, address: &str) -> Result<String> {
        let address = address.trim().to_lowercase();
        let (prefix, _) = decode_bech32(&address)?;
        if prefix != self.config.prefixes.account {
            return Err(ExplorerError::invalid_input(format!(
                "{address} is not a {} account address",
                self.config.prefixes.account
            )));
        }
        Ok(address)
    }

    /// The operator address when the account also runs an indexed validator.
    fn operator_address(&self, account: &str) -> Option<String> {
        let operator = account_to_operator(account, &self.config.prefixes).ok()?;
        match self.validators.find_by_operator(&operator) {
            Ok(found) => found.map(|identity| identity.operator_address),
            Err(err) => {
                warn!(account, error = %err, "validator lookup failed, skipping commission");
                None
            }
        }
    }

    fn moniker(&self, operator: &str) -> String {
        match self.validators.find_by_operator(operator) {
            Ok(found) => found.map(|identity| identity.moniker).unwrap_or_default(),
            Err(err) => {
                warn!(operator, error = %err, "moniker lookup failed");
                String::new()
            }
        }
    }
}

fn degrade<T: Default>(source: &str, address: &str, result: std::result::Result<T, ChainClientError>) -> T {
    result.unwrap_or_else(|err| {
        warn!(source, address, error = %err, "balance source unavailable, using zero");
        T::default()
    })
}
