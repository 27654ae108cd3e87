//! Shared data model for the explorer query backend.
//!
//! Everything here is plain data: coins and decimal coins, validator
//! identities, account kinds with their vesting schedules, indexed blocks and
//! miss records, the chain-level configuration and the error taxonomy used by
//! every component.

pub mod account;
pub mod block;
pub mod chain;
pub mod coin;
pub mod dec;
pub mod error;
pub mod staking;
pub mod validator;

pub use account::*;
pub use block::*;
pub use chain::*;
pub use coin::*;
pub use dec::*;
pub use error::*;
pub use staking::*;
pub use validator::*;
