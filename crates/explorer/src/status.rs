//! Periodically refreshed view of the indexed chain head.
//!
//! Readers clone an `Arc` under a read lock and never block the refresher for
//! longer than a pointer swap.

use anyhow::Result;
use chrono::{DateTime, Utc};
use cosmex_storage::BlockRepository;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub chain_id: String,
    pub latest_height: u64,
    /// Time of the latest indexed block; `None` until the first refresh finds one.
    pub latest_block_time: Option<DateTime<Utc>>,
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl ChainStatus {
    pub fn empty<S: Into<String>>(chain_id: S) -> Self {
        Self {
            chain_id: chain_id.into(),
            latest_height: 0,
            latest_block_time: None,
            refreshed_at: None,
        }
    }

    /// Height and time of the indexed head, once known.
    pub fn head(&self) -> Option<(u64, DateTime<Utc>)> {
        self.latest_block_time
            .map(|time| (self.latest_height, time))
    }
}

pub struct StatusCache {
    current: RwLock<Arc<ChainStatus>>,
}

impl StatusCache {
    pub fn new<S: Into<String>>(chain_id: S) -> Self {
        Self {
            current: RwLock::new(Arc::new(ChainStatus::empty(chain_id))),
        }
    }

    pub fn current(&self) -> Arc<ChainStatus> {
        self.current.read().clone()
    }

    pub fn replace(&self, status: ChainStatus) {
        *self.current.write() = Arc::new(status);
    }

    /// Read the indexed head from `blocks` and publish it.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn refresh_from(&self, blocks: &dyn BlockRepository) -> Result<Arc<ChainStatus>> {
        let latest_height = blocks.latest_height()?;
        let latest_block_time = match latest_height {
            0 => None,
            height => blocks.get_block(height)?.map(|block| block.time),
        };

        let status = ChainStatus {
            chain_id: self.current().chain_id.clone(),
            latest_height,
            latest_block_time,
            refreshed_at: Some(Utc::now()),
        };
        debug!(latest_height, "refreshed chain status");
        self.replace(status);
        Ok(self.current())
    }
}

/// Refresh `cache` from `blocks` every `period` until the runtime shuts down.
pub fn spawn_refresher(
    cache: Arc<StatusCache>,
    blocks: Arc<dyn BlockRepository>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if let Err(err) = cache.refresh_from(blocks.as_ref()) {
                warn!(error = %err, "chain status refresh failed, keeping previous snapshot");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmex_storage::MemoryStorage;
    use cosmex_types::BlockSummary;

    fn block(height: u64, seconds: i64) -> BlockSummary {
        BlockSummary {
            height,
            hash: format!("{height:064X}"),
            time: DateTime::from_timestamp(seconds, 0).unwrap(),
            proposer_hex_address: "AA".repeat(20),
            tx_count: 0,
        }
    }

    #[test]
    fn starts_empty() {
        let cache = StatusCache::new("cosmoshub-4");
        let status = cache.current();
        assert_eq!(status.latest_height, 0);
        assert!(status.head().is_none());
        assert!(status.refreshed_at.is_none());
    }

    #[test]
    fn refresh_publishes_the_indexed_head() {
        let storage = MemoryStorage::new();
        storage.store_block(block(41, 1_700_000_000)).unwrap();
        storage.store_block(block(42, 1_700_000_006)).unwrap();

        let cache = StatusCache::new("cosmoshub-4");
        let before = cache.current();
        cache.refresh_from(&storage).unwrap();

        let status = cache.current();
        assert_eq!(status.chain_id, "cosmoshub-4");
        assert_eq!(
            status.head(),
            Some((42, DateTime::from_timestamp(1_700_000_006, 0).unwrap()))
        );
        // Earlier readers keep the snapshot they cloned.
        assert_eq!(before.latest_height, 0);
    }

    #[tokio::test]
    async fn refresher_runs_in_the_background() {
        let storage = Arc::new(MemoryStorage::new());
        storage.store_block(block(7, 1_700_000_000)).unwrap();

        let cache = Arc::new(StatusCache::new("cosmoshub-4"));
        let handle = spawn_refresher(cache.clone(), storage.clone(), Duration::from_millis(10));

        for _ in 0..100 {
            if cache.current().latest_height == 7 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();
        assert_eq!(cache.current().latest_height, 7);
    }
}
