//! The view of the chain a governance call executes against.

use std::collections::BTreeMap;

use ethereum_types::H256;
use supa_common::within_blockhash_window;

/// Block context available to a call, as a contract sees it.
pub trait ChainContext {
    /// Number of the block being executed.
    fn block_number(&self) -> u64;

    /// Timestamp of the block being executed, in seconds.
    fn timestamp(&self) -> u64;

    /// Hash of block `number`, with `BLOCKHASH` semantics: `None` for the
    /// current block, future blocks and blocks more than 256 blocks back.
    fn block_hash(&self, number: u64) -> Option<H256>;
}

/// A chain kept in memory: a current block, its timestamp and the hashes of
/// earlier blocks.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InMemoryChain {
    number: u64,
    timestamp: u64,
    hashes: BTreeMap<u64, H256>,
}

impl InMemoryChain {
    /// Starts at block `number` with timestamp `timestamp`.
    pub fn new(number: u64, timestamp: u64) -> Self {
        Self {
            number,
            timestamp,
            hashes: BTreeMap::new(),
        }
    }

    /// Records the hash of an earlier block.
    pub fn set_block_hash(&mut self, number: u64, hash: H256) {
        self.hashes.insert(number, hash);
    }

    /// Moves the head forward by `blocks` blocks and `secs` seconds.
    pub fn advance(&mut self, blocks: u64, secs: u64) {
        self.number = self.number.saturating_add(blocks);
        self.timestamp = self.timestamp.saturating_add(secs);
    }
}

impl ChainContext for InMemoryChain {
    fn block_number(&self) -> u64 {
        self.number
    }

    fn timestamp(&self) -> u64 {
        self.timestamp
    }

    fn block_hash(&self, number: u64) -> Option<H256> {
        match within_blockhash_window(self.number, number) {
            true => self.hashes.get(&number).copied(),
            false => None,
        }
    }
}
