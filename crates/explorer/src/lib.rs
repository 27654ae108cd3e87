//! HTTP query backend of the explorer.
//!
//! Resolves validator identifiers, derives uptime and balance metrics from the
//! index and the chain's LCD endpoint, and serves them as JSON.

pub mod api;
pub mod config;
pub mod facade;
pub mod status;

pub use api::{build_router, ApiError};
pub use config::{Cli, ExplorerConfig};
pub use facade::{BalanceView, ListingLimits, QueryFacade, UptimeView, ValidatorView};
pub use status::{spawn_refresher, ChainStatus, StatusCache};
