//! Synthetic chains for integration tests.

#![allow(dead_code)]

use bitcoin_hashes::Hash as _;
use consensus_params::*;

/// A linear chain in a memory store, built on a genesis block.
pub struct TestChain {
    pub store: MemoryBlockStore,
    pub tip: StoredBlock,
}

impl TestChain {
    /// Chain holding only the network's genesis block.
    ///
    /// The genesis is rehashed with double-SHA256 like every other block
    /// here, so the chain links without the network hasher.
    pub fn from_params(params: &ChainParameters) -> Self {
        let genesis = StoredBlock::new(params.genesis.header(&Sha256dHasher), 0);
        let mut store = MemoryBlockStore::new();
        store.put(genesis.clone());
        TestChain { store, tip: genesis }
    }

    /// Append a block `spacing` seconds after the tip.
    pub fn push(&mut self, version: i32, bits: u32, spacing: i64) -> StoredBlock {
        let height = self.tip.height + 1;
        let mut nonce = [0u8; 32];
        nonce[..4].copy_from_slice(&height.to_le_bytes());

        let header = BlockHeader {
            version,
            prev_block_hash: self.tip.hash(),
            merkle_root: BlockHash::from_inner([0x11; 32]),
            timestamp: self.tip.header.timestamp + spacing,
            bits: CompactBits(bits),
            nonce,
            hash: BlockHash::from_inner([0; 32]),
        }
        .with_computed_hash();

        let block = StoredBlock::new(header, height);
        self.store.put(block.clone());
        self.tip = block.clone();
        block
    }

    /// Append `count` version 1 blocks with the same bits and spacing.
    pub fn extend(&mut self, count: usize, bits: u32, spacing: i64) {
        for _ in 0..count {
            self.push(1, bits, spacing);
        }
    }

    /// Unstored header building on the tip and declaring `bits`.
    pub fn candidate(&self, bits: u32) -> BlockHeader {
        BlockHeader {
            version: 1,
            prev_block_hash: self.tip.hash(),
            merkle_root: BlockHash::from_inner([0x22; 32]),
            timestamp: self.tip.header.timestamp + 150,
            bits: CompactBits(bits),
            nonce: [0xff; 32],
            hash: BlockHash::from_inner([0; 32]),
        }
        .with_computed_hash()
    }
}
