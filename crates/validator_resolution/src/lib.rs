//! Validator address resolution
//!
//! Classifies one opaque string and resolves it to a canonical validator
//! identity:
//! - bech32 consensus pubkeys and consensus addresses
//! - bech32 validator-operator and account addresses
//! - 40-character hex proposer addresses (any case)
//! - exact moniker matches

pub mod address;
pub mod errors;
pub mod resolver;
pub mod types;

pub use address::*;
pub use errors::*;
pub use resolver::*;
pub use types::*;
