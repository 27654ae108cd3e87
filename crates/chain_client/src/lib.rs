//! Access to a Cosmos SDK chain through its LCD (REST) gateway.
//!
//! [`ChainClient`] is the seam the balance aggregator and the status
//! refresher depend on. [`LcdClient`] talks to a real node; every request it
//! makes runs under a [`RetryPolicy`]. [`StaticChainClient`] serves canned
//! data for tests and demos.

mod client;
mod dto;
mod errors;
mod lcd;
mod retry;
mod stub;

pub use client::*;
pub use errors::*;
pub use lcd::LcdClient;
pub use retry::RetryPolicy;
pub use stub::{ChainMethod, StaticChainClient};
