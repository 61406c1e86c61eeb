//! Read interface to the block store
//!
//! The parameter checks only ever read ancestors. Absence of a block is
//! `Ok(None)`; backend failures are `Err(StoreError)`. Callers above this
//! module turn both into [`crate::ConsensusError::AncestorLookupFailed`]
//! whenever the block was required.

use crate::error::{ConsensusError, Result as ConsensusResult};
use crate::types::{BlockHash, StoredBlock};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Block store backend error: {0}")]
    Backend(String),
}

/// Lookup of stored headers by hash.
pub trait BlockStore {
    fn get(&self, hash: &BlockHash) -> Result<Option<StoredBlock>, StoreError>;

    /// Predecessor of `block`, if stored.
    fn get_previous(&self, block: &StoredBlock) -> Result<Option<StoredBlock>, StoreError> {
        self.get(&block.header.prev_block_hash)
    }
}

impl<S: BlockStore + ?Sized> BlockStore for &S {
    fn get(&self, hash: &BlockHash) -> Result<Option<StoredBlock>, StoreError> {
        (**self).get(hash)
    }
}

/// Predecessor of `block`, which must exist.
pub(crate) fn require_previous<S: BlockStore + ?Sized>(
    block: &StoredBlock,
    store: &S,
) -> ConsensusResult<StoredBlock> {
    store.get_previous(block)?.ok_or_else(|| {
        ConsensusError::AncestorLookupFailed(format!(
            "predecessor {} of block {} at height {} is not stored",
            block.header.prev_block_hash,
            block.hash(),
            block.height
        ))
    })
}

/// Block `hash`, which must exist.
pub(crate) fn require_block<S: BlockStore + ?Sized>(
    hash: &BlockHash,
    store: &S,
) -> ConsensusResult<StoredBlock> {
    store.get(hash)?.ok_or_else(|| {
        ConsensusError::AncestorLookupFailed(format!("block {hash} is not stored"))
    })
}

/// In-memory block store keyed by block hash.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlockStore {
    blocks: HashMap<BlockHash, StoredBlock>,
    chain_head: Option<BlockHash>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a block. The most recently stored block becomes the chain head.
    pub fn put(&mut self, block: StoredBlock) {
        let hash = block.hash();
        self.blocks.insert(hash, block);
        self.chain_head = Some(hash);
    }

    pub fn chain_head(&self) -> Option<&StoredBlock> {
        self.chain_head.as_ref().and_then(|hash| self.blocks.get(hash))
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

impl BlockStore for MemoryBlockStore {
    fn get(&self, hash: &BlockHash) -> Result<Option<StoredBlock>, StoreError> {
        Ok(self.blocks.get(hash).cloned())
    }
}
