//! Balance aggregation for one account.
//!
//! A [`BalanceSnapshot`] combines five independently fetched sources (bank
//! balance, delegations, unbonding delegations, pending rewards and, for
//! validator operators, commission) with the account's vesting schedule
//! evaluated at a single as-of time. [`compute_snapshot`] is the pure
//! arithmetic; [`BalanceAggregator`] fetches the sources concurrently and
//! degrades individual failures to zero.

mod aggregator;
mod delegations;
mod snapshot;

pub use aggregator::BalanceAggregator;
pub use delegations::{delegation_amount, enrich_delegation, DelegationView};
pub use snapshot::{compute_snapshot, BalanceSnapshot, BalanceSources};
