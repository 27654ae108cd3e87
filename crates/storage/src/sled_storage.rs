use anyhow::Result;
use cosmex_types::{BlockSummary, MissedBlockRecord, ValidatorIdentity};
use sled::{Db, Tree};
use std::ops::Bound;
use std::path::Path;
use tracing::debug;

use crate::{normalize_hex, BlockRepository, StorageError, ValidatorRepository};

const LATEST_HEIGHT_KEY: &[u8] = b"latest_height";
const SEPARATOR: u8 = 0;

/// Sled-backed implementation
///
/// Validators are keyed by operator address with one secondary index tree per
/// lookup key. Blocks are keyed by big-endian height and miss records by
/// `PROPOSER_HEX 0x00 height`, so height windows are plain range scans.
pub struct SledStorage {
    db: Db,
    validators: Tree,
    by_account: Tree,
    by_consensus_pubkey: Tree,
    by_proposer: Tree,
    by_moniker: Tree,
    blocks: Tree,
    missed: Tree,
    metadata: Tree,
}

impl SledStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path)?;
        debug!(path = %path.display(), recovered = db.was_recovered(), "opened sled database");
        Ok(Self {
            validators: db.open_tree("validators")?,
            by_account: db.open_tree("validators_by_account")?,
            by_consensus_pubkey: db.open_tree("validators_by_consensus_pubkey")?,
            by_proposer: db.open_tree("validators_by_proposer")?,
            by_moniker: db.open_tree("validators_by_moniker")?,
            blocks: db.open_tree("blocks")?,
            missed: db.open_tree("missed_blocks")?,
            metadata: db.open_tree("metadata")?,
            db,
        })
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn load_validator(&self, operator_address: &[u8]) -> Result<Option<ValidatorIdentity>> {
        self.validators
            .get(operator_address)?
            .map(|v| serde_json::from_slice(&v))
            .transpose()
            .map_err(Into::into)
    }

    fn lookup_index(&self, index: &Tree, key: &str) -> Result<Option<ValidatorIdentity>> {
        match index.get(key.as_bytes())? {
            Some(operator) => self.load_validator(&operator),
            None => Ok(None),
        }
    }

    fn remove_index_entries(&self, identity: &ValidatorIdentity) -> Result<()> {
        self.by_account.remove(identity.account_address.as_bytes())?;
        self.by_consensus_pubkey
            .remove(identity.consensus_pubkey.as_bytes())?;
        self.by_proposer
            .remove(identity.proposer_hex_address.as_bytes())?;
        self.by_moniker
            .remove(moniker_key(&identity.moniker, &identity.operator_address))?;
        Ok(())
    }

    fn decode_blocks<I>(&self, iter: I) -> Result<Vec<BlockSummary>>
    where
        I: Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
    {
        iter.map(|entry| -> Result<BlockSummary> {
            let (_, value) = entry?;
            Ok(serde_json::from_slice::<BlockSummary>(&value)?)
        })
        .collect()
    }

    fn decode_missed<I>(&self, proposer: &str, iter: I) -> Result<Vec<MissedBlockRecord>>
    where
        I: Iterator<Item = sled::Result<(sled::IVec, sled::IVec)>>,
    {
        iter.map(|entry| -> Result<MissedBlockRecord> {
            let (key, _) = entry?;
            let height = height_suffix(&key).ok_or(StorageError::CorruptEntry {
                tree: "missed_blocks",
            })?;
            Ok(MissedBlockRecord::new(proposer, height))
        })
        .collect()
    }
}

fn moniker_key(moniker: &str, operator_address: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(moniker.len() + 1 + operator_address.len());
    key.extend_from_slice(moniker.as_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(operator_address.as_bytes());
    key
}

fn missed_prefix(proposer: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(proposer.len() + 1 + 8);
    key.extend_from_slice(proposer.as_bytes());
    key.push(SEPARATOR);
    key
}

fn missed_key(proposer: &str, height: u64) -> Vec<u8> {
    let mut key = missed_prefix(proposer);
    key.extend_from_slice(&height.to_be_bytes());
    key
}

fn height_suffix(key: &[u8]) -> Option<u64> {
    let start = key.len().checked_sub(8)?;
    let bytes: [u8; 8] = key[start..].try_into().ok()?;
    Some(u64::from_be_bytes(bytes))
}

impl ValidatorRepository for SledStorage {
    fn find_by_operator(&self, operator_address: &str) -> Result<Option<ValidatorIdentity>> {
        self.load_validator(operator_address.as_bytes())
    }

    fn find_by_account(&self, account_address: &str) -> Result<Option<ValidatorIdentity>> {
        self.lookup_index(&self.by_account, account_address)
    }

    fn find_by_consensus_pubkey(
        &self,
        consensus_pubkey: &str,
    ) -> Result<Option<ValidatorIdentity>> {
        self.lookup_index(&self.by_consensus_pubkey, consensus_pubkey)
    }

    fn find_by_proposer_hex(&self, proposer_hex: &str) -> Result<Option<ValidatorIdentity>> {
        self.lookup_index(&self.by_proposer, &normalize_hex(proposer_hex))
    }

    fn find_by_moniker(&self, moniker: &str) -> Result<Option<ValidatorIdentity>> {
        let mut prefix = moniker.as_bytes().to_vec();
        prefix.push(SEPARATOR);
        match self.by_moniker.scan_prefix(&prefix).next() {
            Some(entry) => {
                let (key, _) = entry?;
                self.load_validator(&key[prefix.len()..])
            }
            None => Ok(None),
        }
    }

    fn upsert_validator(&self, mut identity: ValidatorIdentity) -> Result<()> {
        identity.proposer_hex_address = normalize_hex(&identity.proposer_hex_address);
        if let Some(previous) = self.find_by_operator(&identity.operator_address)? {
            self.remove_index_entries(&previous)?;
        }

        let operator = identity.operator_address.as_bytes();
        self.validators
            .insert(operator, serde_json::to_vec(&identity)?)?;
        self.by_account
            .insert(identity.account_address.as_bytes(), operator)?;
        self.by_consensus_pubkey
            .insert(identity.consensus_pubkey.as_bytes(), operator)?;
        self.by_proposer
            .insert(identity.proposer_hex_address.as_bytes(), operator)?;
        self.by_moniker.insert(
            moniker_key(&identity.moniker, &identity.operator_address),
            &[] as &[u8],
        )?;
        Ok(())
    }

    fn list_validators(&self) -> Result<Vec<ValidatorIdentity>> {
        self.validators
            .iter()
            .map(|entry| -> Result<ValidatorIdentity> {
                let (_, v) = entry?;
                Ok(serde_json::from_slice::<ValidatorIdentity>(&v)?)
            })
            .collect()
    }
}

impl BlockRepository for SledStorage {
    fn latest_height(&self) -> Result<u64> {
        match self.metadata.get(LATEST_HEIGHT_KEY)? {
            Some(v) => height_suffix(&v)
                .ok_or_else(|| StorageError::CorruptEntry { tree: "metadata" }.into()),
            None => Ok(0),
        }
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
        let mut count = 0u64;
        for entry in self
            .missed
            .range(missed_key(&proposer, from_height)..=missed_key(&proposer, to_height))
        {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    fn store_block(&self, mut block: BlockSummary) -> Result<()> {
        block.proposer_hex_address = normalize_hex(&block.proposer_hex_address);
        let height = block.height;
        self.blocks
            .insert(height.to_be_bytes(), serde_json::to_vec(&block)?)?;
        if height > self.latest_height()? {
            self.metadata
                .insert(LATEST_HEIGHT_KEY, height.to_be_bytes().to_vec())?;
        }
        Ok(())
    }

    fn get_block(&self, height: u64) -> Result<Option<BlockSummary>> {
        self.blocks
            .get(height.to_be_bytes())?
            .map(|v| serde_json::from_slice(&v))
            .transpose()
            .map_err(Into::into)
    }

    fn record_missed_block(&self, record: MissedBlockRecord) -> Result<()> {
        let proposer = normalize_hex(&record.proposer_hex_address);
        self.missed
            .insert(missed_key(&proposer, record.height), &[] as &[u8])?;
        Ok(())
    }

    fn blocks_before(&self, before: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        self.decode_blocks(self.blocks.range(..before.to_be_bytes()).rev().take(limit))
    }

    fn blocks_after(&self, after: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        let range = (Bound::Excluded(after.to_be_bytes()), Bound::Unbounded);
        self.decode_blocks(self.blocks.range(range).take(limit))
    }

    fn blocks_offset(&self, offset: u64, limit: usize) -> Result<Vec<BlockSummary>> {
        self.decode_blocks(self.blocks.iter().rev().skip(offset as usize).take(limit))
    }

    fn missed_before(
        &self,
        proposer_hex: &str,
        before: u64,
        limit: usize,
    ) -> Result<Vec<MissedBlockRecord>> {
        if before == 0 {
            return Ok(Vec::new());
        }
        let proposer = normalize_hex(proposer_hex);
        let iter = self
            .missed
            .range(missed_key(&proposer, 0)..missed_key(&proposer, before))
            .rev()
            .take(limit);
        self.decode_missed(&proposer, iter)
    }

    fn missed_after(
        &self,
        proposer_hex: &str,
        after: u64,
        limit: usize,
    ) -> Result<Vec<MissedBlockRecord>> {
        if after == u64::MAX {
            return Ok(Vec::new());
        }
        let proposer = normalize_hex(proposer_hex);
        let range = (
            Bound::Excluded(missed_key(&proposer, after)),
            Bound::Included(missed_key(&proposer, u64::MAX)),
        );
        let iter = self.missed.range(range).take(limit);
        self.decode_missed(&proposer, iter)
    }

    fn missed_offset(
        &self,
        proposer_hex: &str,
        offset: u64,
        limit: usize,
    ) -> Result<Vec<MissedBlockRecord>> {
        let proposer = normalize_hex(proposer_hex);
        let iter = self
            .missed
            .scan_prefix(missed_prefix(&proposer))
            .rev()
            .skip(offset as usize)
            .take(limit);
        self.decode_missed(&proposer, iter)
    }
}
