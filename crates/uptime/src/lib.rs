//! Validator liveness over the trailing uptime window.
//!
//! Only misses are stored, so a validator's uptime is derived by counting its
//! miss records inside the window. The window trails the latest indexed
//! height by one block: the ingestion pipeline may not have recorded the
//! newest block's signatures yet.

use cosmex_storage::BlockRepository;
use cosmex_types::{ExplorerError, Result, ValidatorIdentity};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of blocks in the uptime window.
pub const UPTIME_WINDOW: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UptimeWindowResult {
    pub missed_count: u64,
    pub over_blocks: u64,
}

impl UptimeWindowResult {
    pub fn new(missed_count: u64) -> Self {
        Self {
            missed_count: missed_count.min(UPTIME_WINDOW),
            over_blocks: UPTIME_WINDOW,
        }
    }

    /// Reported for validators that are not signing blocks.
    pub fn fully_missed() -> Self {
        Self::new(UPTIME_WINDOW)
    }

    pub fn signed_count(&self) -> u64 {
        self.over_blocks - self.missed_count
    }

    /// `(over_blocks - missed_count) / over_blocks` as a percentage.
    pub fn uptime_percent(&self) -> f64 {
        if self.over_blocks == 0 {
            return 0.0;
        }
        self.signed_count() as f64 * 100.0 / self.over_blocks as f64
    }
}

/// Inclusive height range `[H-1-100, H-2]` for latest indexed height `H`.
///
/// The lower bound saturates at zero near genesis. Below height 2 the range
/// is empty and returned with `from > to`.
pub fn window_bounds(latest_height: u64) -> (u64, u64) {
    if latest_height < 2 {
        return (1, 0);
    }
    let reference = latest_height - 1;
    let from = reference.saturating_sub(UPTIME_WINDOW);
    let to = reference.saturating_sub(1);
    (from, to)
}

/// Count the validator's misses over the trailing window.
///
/// A validator that is not bonded emits no miss records, so it is reported as
/// having missed the whole window without consulting the repository.
pub fn compute(identity: &ValidatorIdentity, blocks: &dyn BlockRepository) -> Result<UptimeWindowResult> {
    if !identity.is_bonded() {
        debug!(
            operator = %identity.operator_address,
            status = %identity.status,
            "validator not bonded, reporting full window as missed"
        );
        return Ok(UptimeWindowResult::fully_missed());
    }

    let latest = blocks.latest_height().map_err(ExplorerError::upstream)?;
    let (from, to) = window_bounds(latest);
    let missed = blocks
        .count_missed_blocks(&identity.proposer_hex_address, from, to)
        .map_err(ExplorerError::upstream)?;

    debug!(
        operator = %identity.operator_address,
        latest,
        from,
        to,
        missed,
        "computed uptime window"
    );
    Ok(UptimeWindowResult::new(missed))
}
