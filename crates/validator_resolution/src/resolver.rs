//! Validator address resolver implementation

use cosmex_storage::ValidatorRepository;
use cosmex_types::{ChainConfig, ExplorerError, Result, ValidatorIdentity};
use std::sync::Arc;
use tracing::debug;

use crate::address::{decode_bech32, is_hex_address};
use crate::types::*;

/// Validator address resolver
///
/// Classifies an input string and dispatches to exactly one repository lookup:
/// 1. consensus pubkey or consensus address (bech32)
/// 2. validator operator address (bech32)
/// 3. account address (bech32)
/// 4. 40-character hex proposer address
/// 5. exact moniker
///
/// Resolution performs no I/O of its own beyond the repository call.
#[derive(Clone)]
pub struct AddressResolver {
    repo: Arc<dyn ValidatorRepository>,
    chain: Arc<ChainConfig>,
}

impl AddressResolver {
    pub fn new(repo: Arc<dyn ValidatorRepository>, chain: Arc<ChainConfig>) -> Self {
        Self { repo, chain }
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Determine which lookup an input belongs to. Never fails: anything that
    /// is not a recognizable address is a moniker.
    pub fn classify(&self, input: &str) -> AddressClass {
        let input = input.trim();
        let prefixes = &self.chain.prefixes;

        match decode_bech32(input) {
            Ok((prefix, data)) => {
                let normalized = input.to_lowercase();
                if prefix == prefixes.consensus_pubkey {
                    return AddressClass::ConsensusPubkey(normalized);
                }
                if prefix == prefixes.consensus {
                    return AddressClass::ConsensusAddress {
                        bech32: normalized,
                        proposer_hex: hex::encode_upper(data),
                    };
                }
                if prefix == prefixes.validator_operator {
                    return AddressClass::Operator(normalized);
                }
                if prefix == prefixes.account {
                    return AddressClass::Account(normalized);
                }
            }
            Err(_) if self.has_known_prefix(input) => {
                return AddressClass::MalformedBech32(input.to_string());
            }
            Err(_) => {}
        }

        if is_hex_address(input) {
            AddressClass::ProposerHex(input.to_ascii_uppercase())
        } else {
            AddressClass::Moniker(input.to_string())
        }
    }

    /// Resolve any address-like string to its validator identity.
    ///
    /// Unknown inputs and malformed bech32 checksums are `NotFound`; only a
    /// failing repository yields `UpstreamUnavailable`.
    pub fn resolve(&self, input: &str) -> Result<ResolvedValidator> {
        let class = self.classify(input);
        let Some(method) = class.method() else {
            debug!(input, "bech32 checksum failed, treating as unknown address");
            return Err(ExplorerError::not_found(format!("validator {}", input.trim())));
        };

        let repo = self.repo.as_ref();
        let found = match &class {
            AddressClass::ConsensusPubkey(pubkey) => repo.find_by_consensus_pubkey(pubkey),
            AddressClass::ConsensusAddress { proposer_hex, .. } => {
                repo.find_by_proposer_hex(proposer_hex)
            }
            AddressClass::Operator(operator) => repo.find_by_operator(operator),
            AddressClass::Account(account) => repo.find_by_account(account),
            AddressClass::ProposerHex(hex) => repo.find_by_proposer_hex(hex),
            AddressClass::Moniker(moniker) => repo.find_by_moniker(moniker),
            AddressClass::MalformedBech32(_) => Ok(None),
        }
        .map_err(ExplorerError::upstream)?;

        debug!(input, ?method, found = found.is_some(), "resolved validator address");

        found
            .map(|identity| ResolvedValidator::new(identity, method))
            .ok_or_else(|| ExplorerError::not_found(format!("validator {}", input.trim())))
    }

    /// Shorthand for [`resolve`](Self::resolve) when only the identity matters.
    pub fn resolve_identity(&self, input: &str) -> Result<ValidatorIdentity> {
        self.resolve(input).map(|resolved| resolved.identity)
    }

    /// Look an account up as a validator operator without failing when it is not one.
    pub fn operator_for_account(&self, account: &str) -> Result<Option<ValidatorIdentity>> {
        self.repo
            .find_by_account(&account.trim().to_lowercase())
            .map_err(ExplorerError::upstream)
    }

    fn has_known_prefix(&self, input: &str) -> bool {
        let lowered = input.to_lowercase();
        let prefixes = &self.chain.prefixes;
        [
            &prefixes.consensus_pubkey,
            &prefixes.consensus,
            &prefixes.validator_operator,
            &prefixes.account,
        ]
        .iter()
        .any(|prefix| {
            lowered
                .strip_prefix(prefix.as_str())
                .is_some_and(|rest| rest.starts_with('1'))
        })
    }
}
