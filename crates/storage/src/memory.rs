use anyhow::Result;
use cosmex_types::{BlockSummary, MissedBlockRecord, ValidatorIdentity};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::{normalize_hex, BlockRepository, ValidatorRepository};

/// In-memory testing backend
#[derive(Clone, Default)]
pub struct MemoryStorage {
    validators: Arc<RwLock<HashMap<String, ValidatorIdentity>>>,
    blocks: Arc<RwLock<BTreeMap<u64, BlockSummary>>>,
    missed: Arc<RwLock<BTreeSet<(String, u64)>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn find_validator<F>(&self, predicate: F) -> Result<Option<ValidatorIdentity>>
    where
        F: Fn(&ValidatorIdentity) -> bool,
    {
        Ok(self.validators.read().values().find(|v| predicate(v)).cloned())
    }

    fn missed_for(&self, proposer_hex: &str) -> Vec<u64> {
        let proposer = normalize_hex(proposer_hex);
        self.missed
            .read()
            .iter()
            .filter(|(p, _)| *p == proposer)
            .map(|(_, height)| *height)
            .collect()
    }
}

fn to_records(proposer_hex: &str, heights: impl Iterator<Item = u64>) -> Vec<MissedBlockRecord> {
    heights
        .map(|height| MissedBlockRecord::new(proposer_hex, height))
        .collect()
}

impl ValidatorRepository for MemoryStorage {
    fn find_by_operator(&self, operator_address: &str) -> Result<Option<ValidatorIdentity>> {
        Ok(self.validators.read().get(operator_address).cloned())
    }

    fn find_by_account(&self, account_address: &str) -> Result<Option<ValidatorIdentity>> {
        self.find_validator(|v| v.account_address == account_address)
    }

    fn find_by_consensus_pubkey(
        &self,
        consensus_pubkey: &str,
    ) -> Result<Option<ValidatorIdentity>> {
        self.find_validator(|v| v.consensus_pubkey == consensus_pubkey)
    }

    fn find_by_proposer_hex(&self, proposer_hex: &str) -> Result<Option<ValidatorIdentity>> {
        let wanted = normalize_hex(proposer_hex);
        self.find_validator(|v| v.proposer_hex_address == wanted)
    }

    fn find_by_moniker(&self, moniker: &str) -> Result<Option<ValidatorIdentity>> {
        self.find_validator(|v| v.moniker == moniker)
    }

    fn upsert_validator(&self, mut identity: ValidatorIdentity) -> Result<()> {
        identity.proposer_hex_address = normalize_hex(&identity.proposer_hex_address);
        self.validators
            .write()
            .insert(identity.operator_address.clone(), identity);
        Ok(())
    }

    fn list_validators(&self) -> Result<Vec<ValidatorIdentity>> {
        let mut all: Vec<_> = self.validators.read().values().cloned().collect();
        all.sort_by(|a, b| a.operator_address.cmp(&b.operator_address));
        Ok(all)
    }
}

impl BlockRepository for MemoryStorage {
    fn latest_height(&self) -> Result<u64> {
        Ok(self.blocks.read().keys().next_back().copied().unwrap_or(0))
    }

    fn count_missed_blocks(
        &self,
        proposer_hex: &str,
        from_height: u64,
        to_height: u64,
    ) -> Result<u64> {
        if from_height > to_height {
            return Ok(0);
        }
        let proposer = normalize_hex(proposer_hex);
        let count = self
            .missed
            .read()
            .range((proposer.clone(), from_height)..=(proposer, to_height))
            .count();
        Ok(count as u64)
    }

    fn store_block(&self, mut block: BlockSummary) -> Result<()> {
        block.proposer_hex_address = normalize_hex(&block.proposer_hex_address);
        self.blocks.write().insert(block.height, block);
        Ok(())
    }

    fn get_block(&self, height: u64) -> Result<Option<BlockSummary>> {
        Ok(self.blocks.read().get(&height).cloned())
    }

    fn record_missed_block(&self, record: MissedBlockRecord) -> Result<()> {
        self.missed
            .write()
            .insert((normalize_hex(&record.proposer_hex_address), record.height));
        Ok(())
    }

    fn blocks_before(&self, before: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        Ok(self
            .blocks
            .read()
            .range(..before)
            .rev()
            .take(limit)
            .map(|(_, b)| b.clone())
            .collect())
    }

    fn blocks_after(&self, after: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        let Some(start) = after.checked_add(1) else {
            return Ok(Vec::new());
        };
        Ok(self
            .blocks
            .read()
            .range(start..)
            .take(limit)
            .map(|(_, b)| b.clone())
            .collect())
    }

    fn blocks_offset(&self, offset: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        Ok(self
            .blocks
            .read()
            .values()
            .rev()
            .skip(offset as usize)
            .take(limit)
            .cloned()
            .collect())
    }

    fn missed_before(
        &self,
        proposer_hex: &str,
        before: u64,
        limit: usize,
    ) -> Result<Vec<MissedBlockRecord>> {
        let heights = self.missed_for(proposer_hex);
        Ok(to_records(
            proposer_hex,
            heights.into_iter().rev().filter(|h| *h < before).take(limit),
        ))
    }

    fn missed_after(
        &self,
        proposer_hex: &str,
        after: u64,
        limit: usize,
    ) -> Result<Vec<MissedBlockRecord>> {
        let heights = self.missed_for(proposer_hex);
        Ok(to_records(
            proposer_hex,
            heights.into_iter().filter(|h| *h > after).take(limit),
        ))
    }

    fn missed_offset(
        &self,
        proposer_hex: &str,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<MissedBlockRecord>> {
        let heights = self.missed_for(proposer_hex);
        Ok(to_records(
            proposer_hex,
            heights.into_iter().rev().skip(offset as usize).take(limit),
        ))
    }
}
