//! Indexed blocks and validator miss records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A block as recorded by the indexer. `height` is the surrogate ordering key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    pub height: u64,
    pub hash: String,
    pub time: DateTime<Utc>,
    pub proposer_hex_address: String,
    pub tx_count: u32,
}

/// Block header data returned by the chain itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub height: u64,
    pub time: DateTime<Utc>,
}

/// A validator did not sign the block at `height`.
///
/// Only misses are stored; a missing record means the block was signed.
/// Records are written once and never updated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MissedBlockRecord {
    pub proposer_hex_address: String,
    pub height: u64,
}

impl MissedBlockRecord {
    pub fn new<S: AsRef<str>>(proposer_hex_address: S, height: u64) -> Self {
        Self {
            proposer_hex_address: proposer_hex_address.as_ref().to_ascii_uppercase(),
            height,
        }
    }
}
