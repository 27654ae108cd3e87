//! Wire shapes of the Cosmos SDK LCD endpoints and their conversion into
//! the shared data model.

use chrono::{DateTime, Utc};
use cosmex_types::{
    AccountInfo, AccountKind, BaseVesting, BlockInfo, Coin, ContinuousVestingAccount, Dec,
    DecCoin, DelayedVestingAccount, Delegation, DelegatorRewards, PeriodicVestingAccount,
    UnbondingDelegation, UnbondingEntry, ValidatorReward, ValidatorTokens, VestingPeriod,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PageResponse {
    #[serde(default)]
    pub next_key: Option<String>,
}

/// A list endpoint answered in `pagination.next_key` pages.
pub(crate) trait Paged {
    type Item;

    fn into_parts(self) -> (Vec<Self::Item>, Option<String>);
}

fn next_key(page: Option<PageResponse>) -> Option<String> {
    page.and_then(|p| p.next_key).filter(|key| !key.is_empty())
}

#[derive(Debug, Deserialize)]
pub(crate) struct BalancesResponse {
    #[serde(default)]
    pub balances: Vec<Coin>,
    #[serde(default)]
    pub pagination: Option<PageResponse>,
}

impl Paged for BalancesResponse {
    type Item = Coin;

    fn into_parts(self) -> (Vec<Coin>, Option<String>) {
        (self.balances, next_key(self.pagination))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DelegationsResponse {
    #[serde(default)]
    pub delegation_responses: Vec<DelegationResponse>,
    #[serde(default)]
    pub pagination: Option<PageResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DelegationResponse {
    pub delegation: DelegationBody,
    #[serde(default)]
    pub balance: Option<Coin>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DelegationBody {
    pub delegator_address: String,
    pub validator_address: String,
    pub shares: Dec,
}

impl Paged for DelegationsResponse {
    type Item = Delegation;

    fn into_parts(self) -> (Vec<Delegation>, Option<String>) {
        let items = self
            .delegation_responses
            .into_iter()
            .map(|entry| Delegation {
                delegator_address: entry.delegation.delegator_address,
                validator_address: entry.delegation.validator_address,
                shares: entry.delegation.shares,
                balance: entry.balance,
            })
            .collect();
        (items, next_key(self.pagination))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnbondingResponse {
    #[serde(default)]
    pub unbonding_responses: Vec<UnbondingBody>,
    #[serde(default)]
    pub pagination: Option<PageResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnbondingBody {
    pub delegator_address: String,
    pub validator_address: String,
    #[serde(default)]
    pub entries: Vec<UnbondingEntryBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UnbondingEntryBody {
    #[serde(with = "cosmex_types::amount_string")]
    pub creation_height: u128,
    #[serde(default)]
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(with = "cosmex_types::amount_string")]
    pub initial_balance: u128,
    #[serde(with = "cosmex_types::amount_string")]
    pub balance: u128,
}

impl Paged for UnbondingResponse {
    type Item = UnbondingDelegation;

    fn into_parts(self) -> (Vec<UnbondingDelegation>, Option<String>) {
        let items = self
            .unbonding_responses
            .into_iter()
            .map(|body| UnbondingDelegation {
                delegator_address: body.delegator_address,
                validator_address: body.validator_address,
                entries: body
                    .entries
                    .into_iter()
                    .map(|entry| UnbondingEntry {
                        creation_height: u64::try_from(entry.creation_height).unwrap_or(u64::MAX),
                        completion_time: entry.completion_time,
                        initial_balance: entry.initial_balance,
                        balance: entry.balance,
                    })
                    .collect(),
            })
            .collect();
        (items, next_key(self.pagination))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RewardsResponse {
    #[serde(default)]
    pub rewards: Vec<ValidatorRewardBody>,
    #[serde(default)]
    pub total: Vec<DecCoin>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidatorRewardBody {
    pub validator_address: String,
    #[serde(default)]
    pub reward: Vec<DecCoin>,
}

impl From<RewardsResponse> for DelegatorRewards {
    fn from(value: RewardsResponse) -> Self {
        DelegatorRewards {
            rewards: value
                .rewards
                .into_iter()
                .map(|r| ValidatorReward {
                    validator_address: r.validator_address,
                    reward: r.reward,
                })
                .collect(),
            total: value.total,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CommissionResponse {
    pub commission: CommissionBody,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CommissionBody {
    #[serde(default)]
    pub commission: Vec<DecCoin>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockResponse {
    #[serde(default)]
    pub block: Option<BlockBody>,
    /// Newer SDKs return the header under `sdk_block`.
    #[serde(default)]
    pub sdk_block: Option<BlockBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BlockBody {
    pub header: HeaderBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HeaderBody {
    #[serde(with = "cosmex_types::amount_string")]
    pub height: u128,
    pub time: DateTime<Utc>,
}

impl BlockResponse {
    pub fn into_block_info(self) -> Option<BlockInfo> {
        let header = self.sdk_block.or(self.block)?.header;
        Some(BlockInfo {
            height: u64::try_from(header.height).ok()?,
            time: header.time,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidatorResponse {
    pub validator: ValidatorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValidatorBody {
    pub operator_address: String,
    #[serde(with = "cosmex_types::amount_string")]
    pub tokens: u128,
    pub delegator_shares: Dec,
}

impl From<ValidatorResponse> for ValidatorTokens {
    fn from(value: ValidatorResponse) -> Self {
        ValidatorTokens {
            operator_address: value.validator.operator_address,
            tokens: value.validator.tokens,
            delegator_shares: value.validator.delegator_shares,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountResponse {
    pub account: Value,
}

#[derive(Debug, Deserialize)]
struct BaseVestingBody {
    #[serde(default)]
    original_vesting: Vec<Coin>,
    #[serde(default)]
    delegated_free: Vec<Coin>,
    #[serde(default)]
    delegated_vesting: Vec<Coin>,
    #[serde(with = "unix_seconds")]
    end_time: i64,
}

impl From<BaseVestingBody> for BaseVesting {
    fn from(value: BaseVestingBody) -> Self {
        BaseVesting {
            original_vesting: value.original_vesting,
            delegated_free: value.delegated_free,
            delegated_vesting: value.delegated_vesting,
            end_time: value.end_time,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VestingPeriodBody {
    #[serde(with = "unix_seconds")]
    length: i64,
    #[serde(default)]
    amount: Vec<Coin>,
}

/// Turn an `auth` module account into an [`AccountInfo`], dispatching on its
/// `@type` URL. Account types this service does not model are treated as base
/// accounts.
pub(crate) fn parse_account(queried: &str, account: Value) -> Result<AccountInfo, String> {
    let type_url = account
        .get("@type")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let type_name = type_url.rsplit('.').next().unwrap_or_default();

    let kind = match type_name {
        "ContinuousVestingAccount" => AccountKind::ContinuousVesting(ContinuousVestingAccount {
            base: base_vesting(&account)?,
            start_time: unix_field(&account, "start_time")?,
        }),
        "DelayedVestingAccount" => AccountKind::DelayedVesting(DelayedVestingAccount {
            base: base_vesting(&account)?,
        }),
        "PeriodicVestingAccount" => {
            let periods: Vec<VestingPeriodBody> = match account.get("vesting_periods") {
                Some(raw) => serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?,
                None => Vec::new(),
            };
            AccountKind::PeriodicVesting(PeriodicVestingAccount {
                base: base_vesting(&account)?,
                start_time: unix_field(&account, "start_time")?,
                periods: periods
                    .into_iter()
                    .map(|p| VestingPeriod {
                        length: p.length,
                        amount: p.amount,
                    })
                    .collect(),
            })
        }
        "ModuleAccount" => AccountKind::Module {
            name: account
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        _ => AccountKind::Base,
    };

    Ok(AccountInfo {
        address: account_address(&account).unwrap_or_else(|| queried.to_string()),
        kind,
    })
}

fn base_vesting(account: &Value) -> Result<BaseVesting, String> {
    let raw = account
        .get("base_vesting_account")
        .ok_or_else(|| "vesting account without base_vesting_account".to_string())?;
    let body: BaseVestingBody = serde_json::from_value(raw.clone()).map_err(|e| e.to_string())?;
    Ok(body.into())
}

fn unix_field(account: &Value, field: &str) -> Result<i64, String> {
    match account.get(field) {
        Some(Value::String(s)) => s.parse().map_err(|_| format!("{field} is not an integer")),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| format!("{field} out of range")),
        _ => Err(format!("missing {field}")),
    }
}

fn account_address(account: &Value) -> Option<String> {
    [
        account.pointer("/address"),
        account.pointer("/base_account/address"),
        account.pointer("/base_vesting_account/base_account/address"),
    ]
    .into_iter()
    .flatten()
    .filter_map(Value::as_str)
    .find(|address| !address.is_empty())
    .map(str::to_string)
}

/// Seconds carried as decimal strings, as protobuf JSON encodes `int64`.
mod unix_seconds {
    use serde::{de, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.trim().parse().map_err(de::Error::custom),
            Raw::Number(n) => Ok(n),
        }
    }
}
