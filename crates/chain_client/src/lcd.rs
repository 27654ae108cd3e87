use async_trait::async_trait;
use cosmex_types::{
    AccountInfo, BlockInfo, Coin, DecCoin, Delegation, DelegatorRewards, UnbondingDelegation,
    ValidatorTokens,
};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::warn;
use url::Url;

use crate::client::ChainClient;
use crate::dto::{
    parse_account, AccountResponse, BalancesResponse, BlockResponse, CommissionResponse,
    DelegationsResponse, Paged, RewardsResponse, UnbondingResponse, ValidatorResponse,
};
use crate::errors::{ChainClientError, Result};
use crate::retry::RetryPolicy;

/// Upper bound on `next_key` pages followed for one list request.
const MAX_PAGES: usize = 50;
const PAGE_LIMIT: &str = "200";

/// HTTP client for a Cosmos SDK LCD gateway.
#[derive(Clone, Debug)]
pub struct LcdClient {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

impl LcdClient {
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let base_url = base_url.into();
        let parsed =
            Url::parse(&base_url).map_err(|_| ChainClientError::InvalidUrl(base_url.clone()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ChainClientError::InvalidUrl(base_url));
        }

        let client = reqwest::Client::builder()
            .timeout(retry.timeout)
            .build()?;
        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.retry
            .run(path, || self.fetch_once(path, query))
            .await
    }

    async fn fetch_once<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = self.endpoint(path);
        let response = self.client.get(url).query(query).send().await?;

        match response.status() {
            StatusCode::OK => {
                let bytes = response.bytes().await?;
                serde_json::from_slice(&bytes).map_err(|err| ChainClientError::Decode {
                    path: path.to_string(),
                    reason: err.to_string(),
                })
            }
            StatusCode::NOT_FOUND => Err(ChainClientError::NotFound(path.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(ChainClientError::Status {
                    path: path.to_string(),
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }

    /// Follow `pagination.next_key` until the list is exhausted.
    async fn get_all<P>(&self, path: &str) -> Result<Vec<P::Item>>
    where
        P: Paged + DeserializeOwned,
    {
        let mut items = Vec::new();
        let mut key: Option<String> = None;
        for _ in 0..MAX_PAGES {
            let mut query = vec![("pagination.limit", PAGE_LIMIT)];
            if let Some(key) = key.as_deref() {
                query.push(("pagination.key", key));
            }
            let page: P = self.get_json(path, &query).await?;
            let (mut batch, next) = page.into_parts();
            items.append(&mut batch);
            match next {
                Some(next) => key = Some(next),
                None => return Ok(items),
            }
        }
        // A partial list would silently understate balances.
        warn!(
            path,
            pages = MAX_PAGES,
            fetched = items.len(),
            "pagination did not finish, discarding partial list"
        );
        Err(ChainClientError::TooManyPages {
            path: path.to_string(),
            pages: MAX_PAGES,
        })
    }
}

#[async_trait]
impl ChainClient for LcdClient {
    async fn get_balance(&self, address: &str) -> Result<Vec<Coin>> {
        self.get_all::<BalancesResponse>(&format!("/cosmos/bank/v1beta1/balances/{address}"))
            .await
    }

    async fn get_delegations(&self, delegator: &str) -> Result<Vec<Delegation>> {
        self.get_all::<DelegationsResponse>(&format!(
            "/cosmos/staking/v1beta1/delegations/{delegator}"
        ))
        .await
    }

    async fn get_unbonding_delegations(&self, delegator: &str) -> Result<Vec<UnbondingDelegation>> {
        self.get_all::<UnbondingResponse>(&format!(
            "/cosmos/staking/v1beta1/delegators/{delegator}/unbonding_delegations"
        ))
        .await
    }

    async fn get_total_rewards(&self, delegator: &str) -> Result<DelegatorRewards> {
        let response: RewardsResponse = self
            .get_json(
                &format!("/cosmos/distribution/v1beta1/delegators/{delegator}/rewards"),
                &[],
            )
            .await?;
        Ok(response.into())
    }

    async fn get_validator_commission(&self, operator: &str) -> Result<Vec<DecCoin>> {
        let response: CommissionResponse = self
            .get_json(
                &format!("/cosmos/distribution/v1beta1/validators/{operator}/commission"),
                &[],
            )
            .await?;
        Ok(response.commission.commission)
    }

    async fn get_account(&self, address: &str) -> Result<AccountInfo> {
        let path = format!("/cosmos/auth/v1beta1/accounts/{address}");
        let response: AccountResponse = self.get_json(&path, &[]).await?;
        parse_account(address, response.account)
            .map_err(|reason| ChainClientError::Decode { path, reason })
    }

    async fn get_block(&self, height: u64) -> Result<BlockInfo> {
        let path = format!("/cosmos/base/tendermint/v1beta1/blocks/{height}");
        let response: BlockResponse = self.get_json(&path, &[]).await?;
        response
            .into_block_info()
            .ok_or_else(|| ChainClientError::Decode {
                path,
                reason: "block response without header".to_string(),
            })
    }

    async fn get_validator(&self, operator: &str) -> Result<ValidatorTokens> {
        let response: ValidatorResponse = self
            .get_json(&format!("/cosmos/staking/v1beta1/validators/{operator}"), &[])
            .await?;
        Ok(response.into())
    }
}
