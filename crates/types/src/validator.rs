//! Canonical validator identity.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bonding status as reported by the staking module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorStatus {
    Bonded,
    Unbonding,
    Unbonded,
    Unspecified,
}

impl ValidatorStatus {
    pub fn is_bonded(self) -> bool {
        matches!(self, ValidatorStatus::Bonded)
    }

    /// Parse the staking module's enum names (`BOND_STATUS_BONDED`) as well as
    /// the short lowercase form stored by the indexer.
    pub fn from_chain(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "BOND_STATUS_BONDED" | "BONDED" => ValidatorStatus::Bonded,
            "BOND_STATUS_UNBONDING" | "UNBONDING" => ValidatorStatus::Unbonding,
            "BOND_STATUS_UNBONDED" | "UNBONDED" => ValidatorStatus::Unbonded,
            _ => ValidatorStatus::Unspecified,
        }
    }
}

impl fmt::Display for ValidatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            ValidatorStatus::Bonded => "bonded",
            ValidatorStatus::Unbonding => "unbonding",
            ValidatorStatus::Unbonded => "unbonded",
            ValidatorStatus::Unspecified => "unspecified",
        };
        f.write_str(value)
    }
}

/// One validator under all of its address forms.
///
/// At most one identity matches any lookup key; monikers are not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorIdentity {
    /// Bech32 operator address (`<prefix>valoper1...`), the canonical key.
    pub operator_address: String,
    /// Bech32 consensus public key (`<prefix>valconspub1...`).
    pub consensus_pubkey: String,
    /// Bech32 self-delegation account address.
    pub account_address: String,
    /// Uppercase 40-character hex address found in block headers.
    pub proposer_hex_address: String,
    pub moniker: String,
    pub status: ValidatorStatus,
}

impl ValidatorIdentity {
    pub fn is_bonded(&self) -> bool {
        self.status.is_bonded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain_status_names() {
        assert_eq!(
            ValidatorStatus::from_chain("BOND_STATUS_BONDED"),
            ValidatorStatus::Bonded
        );
        assert_eq!(ValidatorStatus::from_chain("unbonding"), ValidatorStatus::Unbonding);
        assert_eq!(
            ValidatorStatus::from_chain("BOND_STATUS_UNSPECIFIED"),
            ValidatorStatus::Unspecified
        );
        assert!(!ValidatorStatus::Unbonded.is_bonded());
    }
}
