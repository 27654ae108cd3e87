//! Chain-level lookup data, built once at startup and shared read-only.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Bech32 human-readable parts for the four address roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bech32Prefixes {
    pub account: String,
    pub validator_operator: String,
    pub consensus: String,
    pub consensus_pubkey: String,
}

impl Bech32Prefixes {
    /// Derive the standard Cosmos SDK prefix family from the account prefix
    /// (`cosmos` -> `cosmosvaloper`, `cosmosvalcons`, `cosmosvalconspub`).
    pub fn from_account_prefix(prefix: &str) -> Self {
        let prefix = prefix.trim().to_ascii_lowercase();
        Self {
            validator_operator: format!("{prefix}valoper"),
            consensus: format!("{prefix}valcons"),
            consensus_pubkey: format!("{prefix}valconspub"),
            account: prefix,
        }
    }
}

impl Default for Bech32Prefixes {
    fn default() -> Self {
        Self::from_account_prefix("cosmos")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: String,
    pub prefixes: Bech32Prefixes,
    /// Denomination every balance snapshot is reported in.
    pub staking_denom: String,
    /// Module account address -> module name.
    #[serde(default)]
    pub module_accounts: HashMap<String, String>,
}

impl ChainConfig {
    pub fn new<S: Into<String>>(chain_id: S, account_prefix: &str, staking_denom: S) -> Self {
        Self {
            chain_id: chain_id.into(),
            prefixes: Bech32Prefixes::from_account_prefix(account_prefix),
            staking_denom: staking_denom.into(),
            module_accounts: HashMap::new(),
        }
    }

    pub fn with_module_account<S: Into<String>>(mut self, address: S, name: S) -> Self {
        self.module_accounts.insert(address.into(), name.into());
        self
    }

    pub fn module_account_name(&self, address: &str) -> Option<&str> {
        self.module_accounts.get(address).map(String::as_str)
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self::new("cosmoshub-4", "cosmos", "uatom")
    }
}
