//! Types for validator resolution

use cosmex_types::ValidatorIdentity;
use serde::{Deserialize, Serialize};

/// How an input string was classified, in resolution priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressClass {
    /// `<prefix>valconspub1...`
    ConsensusPubkey(String),
    /// `<prefix>valcons1...`, carried as its uppercase hex proposer address
    ConsensusAddress { bech32: String, proposer_hex: String },
    /// `<prefix>valoper1...`
    Operator(String),
    /// `<prefix>1...`
    Account(String),
    /// 40 hex digits, uppercased
    ProposerHex(String),
    /// Carries one of the chain's prefixes but fails to decode
    MalformedBech32(String),
    /// Anything else
    Moniker(String),
}

impl AddressClass {
    pub fn method(&self) -> Option<ResolutionMethod> {
        match self {
            AddressClass::ConsensusPubkey(_) => Some(ResolutionMethod::ConsensusPubkey),
            AddressClass::ConsensusAddress { .. } => Some(ResolutionMethod::ConsensusAddress),
            AddressClass::Operator(_) => Some(ResolutionMethod::Operator),
            AddressClass::Account(_) => Some(ResolutionMethod::Account),
            AddressClass::ProposerHex(_) => Some(ResolutionMethod::ProposerHex),
            AddressClass::Moniker(_) => Some(ResolutionMethod::Moniker),
            AddressClass::MalformedBech32(_) => None,
        }
    }
}

/// Repository lookup used for a successful resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    ConsensusPubkey,
    ConsensusAddress,
    Operator,
    Account,
    ProposerHex,
    Moniker,
}

/// Resolved validator information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedValidator {
    pub identity: ValidatorIdentity,
    pub resolution_method: ResolutionMethod,
}

impl ResolvedValidator {
    pub fn new(identity: ValidatorIdentity, resolution_method: ResolutionMethod) -> Self {
        Self {
            identity,
            resolution_method,
        }
    }

    pub fn operator_address(&self) -> &str {
        &self.identity.operator_address
    }

    /// Check if this was resolved from a human-readable moniker
    pub fn is_moniker_resolved(&self) -> bool {
        matches!(self.resolution_method, ResolutionMethod::Moniker)
    }
}
