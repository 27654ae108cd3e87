//! Entry point for every query the HTTP layer serves.

use chrono::{DateTime, Utc};
use cosmex_balances::{BalanceAggregator, BalanceSnapshot, DelegationView};
use cosmex_chain_client::ChainClient;
use cosmex_pagination::{paginate, Page, PageLimits, PageQuery};
use cosmex_storage::{BlockPages, BlockRepository, MissedBlockPages, ValidatorRepository};
use cosmex_types::{
    BlockSummary, ChainConfig, ExplorerError, MissedBlockRecord, Result, ValidatorIdentity,
    ValidatorStatus,
};
use cosmex_uptime::UptimeWindowResult;
use cosmex_validator_resolution::{hex_to_consensus_address, AddressResolver, ResolutionMethod};
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::status::{ChainStatus, StatusCache};

/// A resolved validator under all of its address forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorView {
    pub operator_address: String,
    pub account_address: String,
    pub consensus_pubkey: String,
    pub consensus_address: Option<String>,
    pub proposer_hex_address: String,
    pub moniker: String,
    pub status: ValidatorStatus,
    pub resolved_by: ResolutionMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeView {
    pub operator_address: String,
    pub moniker: String,
    #[serde(flatten)]
    pub window: UptimeWindowResult,
    pub uptime_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub address: String,
    /// Module name when the address is a known module account.
    pub module_account: Option<String>,
    /// Indexed height whose block time the vesting schedule was evaluated at.
    pub height: u64,
    pub as_of: DateTime<Utc>,
    #[serde(flatten)]
    pub balance: BalanceSnapshot,
}

/// Page size bounds per listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListingLimits {
    pub blocks: PageLimits,
    pub missed_blocks: PageLimits,
}

#[derive(Clone)]
pub struct QueryFacade {
    resolver: AddressResolver,
    blocks: Arc<dyn BlockRepository>,
    chain: Arc<dyn ChainClient>,
    balances: BalanceAggregator,
    status: Arc<StatusCache>,
    config: Arc<ChainConfig>,
    limits: ListingLimits,
}

impl QueryFacade {
    pub fn new<S>(
        storage: Arc<S>,
        chain: Arc<dyn ChainClient>,
        config: Arc<ChainConfig>,
        status: Arc<StatusCache>,
        limits: ListingLimits,
    ) -> Self
    where
        S: ValidatorRepository + BlockRepository + 'static,
    {
        let validators: Arc<dyn ValidatorRepository> = storage.clone();
        let blocks: Arc<dyn BlockRepository> = storage;
        Self {
            resolver: AddressResolver::new(validators.clone(), config.clone()),
            balances: BalanceAggregator::new(chain.clone(), validators, config.clone()),
            blocks,
            chain,
            status,
            config,
            limits,
        }
    }

    pub fn chain_status(&self) -> Arc<ChainStatus> {
        self.status.current()
    }

    pub fn validator(&self, id: &str) -> Result<ValidatorView> {
        let resolved = self.resolver.resolve(id)?;
        let identity = resolved.identity;
        let consensus_address =
            hex_to_consensus_address(&identity.proposer_hex_address, &self.config.prefixes).ok();
        Ok(ValidatorView {
            operator_address: identity.operator_address,
            account_address: identity.account_address,
            consensus_pubkey: identity.consensus_pubkey,
            consensus_address,
            proposer_hex_address: identity.proposer_hex_address,
            moniker: identity.moniker,
            status: identity.status,
            resolved_by: resolved.resolution_method,
        })
    }

    pub fn uptime(&self, id: &str) -> Result<UptimeView> {
        let identity = self.resolver.resolve_identity(id)?;
        let window = cosmex_uptime::compute(&identity, self.blocks.as_ref())?;
        Ok(UptimeView {
            uptime_percent: window.uptime_percent(),
            operator_address: identity.operator_address,
            moniker: identity.moniker,
            window,
        })
    }

    pub fn missed_blocks(&self, id: &str, query: PageQuery) -> Result<Page<MissedBlockRecord>> {
        let request = query.into_request(&self.limits.missed_blocks)?;
        let identity: ValidatorIdentity = self.resolver.resolve_identity(id)?;
        let source = MissedBlockPages::new(self.blocks.as_ref(), &identity.proposer_hex_address);
        paginate(&source, &request)
    }

    pub fn blocks(&self, query: PageQuery) -> Result<Page<BlockSummary>> {
        let request = query.into_request(&self.limits.blocks)?;
        paginate(&BlockPages::new(self.blocks.as_ref()), &request)
    }

    /// Balance snapshot with vesting evaluated at the latest indexed block.
    pub async fn balance(&self, address: &str) -> Result<BalanceView> {
        let (height, as_of) = self.reference_point().await?;
        let balance = self.balances.snapshot(address, as_of).await?;
        let address = address.trim().to_lowercase();
        Ok(BalanceView {
            module_account: self.config.module_account_name(&address).map(str::to_string),
            address,
            height,
            as_of,
            balance,
        })
    }

    pub async fn delegations(&self, address: &str) -> Result<Vec<DelegationView>> {
        self.balances.delegations(address).await
    }

    /// Height and block time every time-dependent field is evaluated at.
    ///
    /// Prefers the cached head; before the first refresh the head is read
    /// from the index and its time fetched from the chain when the block
    /// itself has not been indexed.
    async fn reference_point(&self) -> Result<(u64, DateTime<Utc>)> {
        if let Some(head) = self.status.current().head() {
            return Ok(head);
        }

        let height = self.blocks.latest_height().map_err(ExplorerError::upstream)?;
        if height == 0 {
            return Err(ExplorerError::upstream(
                "no indexed blocks yet to evaluate balances against",
            ));
        }
        if let Some(block) = self.blocks.get_block(height).map_err(ExplorerError::upstream)? {
            return Ok((height, block.time));
        }

        debug!(height, "latest block not indexed, reading its time from the chain");
        let block = self.chain.get_block(height).await?;
        Ok((height, block.time))
    }
}
