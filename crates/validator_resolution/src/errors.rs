//! Error types for address conversion

use cosmex_types::ExplorerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid bech32 address {address}: {reason}")]
    InvalidBech32 { address: String, reason: String },

    #[error("address {address} has prefix {found}, expected {expected}")]
    UnexpectedPrefix {
        address: String,
        expected: String,
        found: String,
    },

    #[error("invalid hex address {address}")]
    InvalidHex { address: String },

    #[error("cannot encode address with prefix {prefix}: {reason}")]
    Encode { prefix: String, reason: String },
}

impl From<AddressError> for ExplorerError {
    fn from(err: AddressError) -> Self {
        ExplorerError::invalid_input(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AddressError>;
