//! Repositories over the indexed chain data.
//!
//! The indexer (a separate process) populates validators, blocks and miss
//! records; the query components only read them through the traits below.
//! Two backends are provided: [`SledStorage`] for persistent deployments and
//! [`MemoryStorage`] for tests and demos.

use anyhow::Result;
use cosmex_pagination::CursorSource;
use cosmex_types::{BlockSummary, MissedBlockRecord, ValidatorIdentity};

mod memory;
mod sled_storage;

pub use memory::MemoryStorage;
pub use sled_storage::SledStorage;

/// Storage errors
#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sled::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Corrupt index entry in tree {tree}")]
    CorruptEntry { tree: &'static str },
}

/// Lookups of a validator by each of its address forms. Each returns zero or one identity.
pub trait ValidatorRepository: Send + Sync {
    fn find_by_operator(&self, operator_address: &str) -> Result<Option<ValidatorIdentity>>;
    fn find_by_account(&self, account_address: &str) -> Result<Option<ValidatorIdentity>>;
    fn find_by_consensus_pubkey(&self, consensus_pubkey: &str)
        -> Result<Option<ValidatorIdentity>>;
    /// `proposer_hex` is matched case-insensitively.
    fn find_by_proposer_hex(&self, proposer_hex: &str) -> Result<Option<ValidatorIdentity>>;
    /// Exact match. With colliding monikers an arbitrary match is returned.
    fn find_by_moniker(&self, moniker: &str) -> Result<Option<ValidatorIdentity>>;

    fn upsert_validator(&self, identity: ValidatorIdentity) -> Result<()>;
    fn list_validators(&self) -> Result<Vec<ValidatorIdentity>>;
}

/// Indexed blocks and validator miss records.
pub trait BlockRepository: Send + Sync {
    /// Highest indexed height, `0` when nothing has been indexed.
    fn latest_height(&self) -> Result<u64>;

    /// Number of miss records of `proposer_hex` with `from_height <= height <= to_height`.
    fn count_missed_blocks(&self, proposer_hex: &str, from_height: u64, to_height: u64)
        -> Result<u64>;

    fn store_block(&self, block: BlockSummary) -> Result<()>;
    fn get_block(&self, height: u64) -> Result<Option<BlockSummary>>;
    fn record_missed_block(&self, record: MissedBlockRecord) -> Result<()>;

    fn blocks_before(&self, before: u64, limit: usize) -> Result<Vec<BlockSummary>>;
    fn blocks_after(&self, after: u64, limit: usize) -> Result<Vec<BlockSummary>>;
    fn blocks_offset(&self, offset: u64, limit: usize) -> Result<Vec<BlockSummary>>;

    fn missed_before(&self, proposer_hex: &str, before: u64, limit: usize)
        -> Result<Vec<MissedBlockRecord>>;
    fn missed_after(&self, proposer_hex: &str, after: u64, limit: usize)
        -> Result<Vec<MissedBlockRecord>>;
    fn missed_offset(&self, proposer_hex: &str, offset: u64, limit: usize)
        -> Result<Vec<MissedBlockRecord>>;
}

/// Indexed blocks windowed by height.
pub struct BlockPages<'a, R: ?Sized> {
    repo: &'a R,
}

impl<'a, R: BlockRepository + ?Sized> BlockPages<'a, R> {
    pub fn new(repo: &'a R) -> Self {
        Self { repo }
    }
}

impl<R: BlockRepository + ?Sized> CursorSource for BlockPages<'_, R> {
    type Item = BlockSummary;

    fn row_id(item: &BlockSummary) -> u64 {
        item.height
    }

    fn fetch_before(&self, before: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        self.repo.blocks_before(before, limit)
    }

    fn fetch_after(&self, after: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        self.repo.blocks_after(after, limit)
    }

    fn fetch_offset(&self, offset: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        self.repo.blocks_offset(offset, limit)
    }
}

/// One validator's miss records windowed by height.
pub struct MissedBlockPages<'a, R: ?Sized> {
    repo: &'a R,
    proposer_hex: String,
}

impl<'a, R: BlockRepository + ?Sized> MissedBlockPages<'a, R> {
    pub fn new(repo: &'a R, proposer_hex: &str) -> Self {
        Self {
            repo,
            proposer_hex: normalize_hex(proposer_hex),
        }
    }
}

impl<R: BlockRepository + ?Sized> CursorSource for MissedBlockPages<'_, R> {
    type Item = MissedBlockRecord;

    fn row_id(item: &MissedBlockRecord) -> u64 {
        item.height
    }

    fn fetch_before(&self, before: u64, limit: usize) -> Result<Vec<MissedBlockRecord>> {
        self.repo.missed_before(&self.proposer_hex, before, limit)
    }

    fn fetch_after(&self, after: u64, limit: usize) -> Result<Vec<MissedBlockRecord>> {
        self.repo.missed_after(&self.proposer_hex, after, limit)
    }

    fn fetch_offset(&self, offset: u64, limit: usize) -> Result<Vec<MissedBlockRecord>> {
        self.repo.missed_offset(&self.proposer_hex, offset, limit)
    }
}

pub(crate) fn normalize_hex(value: &str) -> String {
    value.trim().to_ascii_uppercase()
}
