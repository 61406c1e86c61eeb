//! Core chain types consumed by the parameter checks

use crate::compact::{CompactBits, Target};
use crate::error::Result;
use crate::hasher::{HeaderHasher, Sha256dHasher};
use crate::store::{BlockStore, StoreError};
use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use serde::{Deserialize, Serialize};

/// Raw 256-bit value in internal (little-endian) byte order
pub type Hash = [u8; 32];

/// Block identifier. Displays and parses in reversed (big-endian) hex.
pub type BlockHash = sha256d::Hash;

/// Byte string type
pub type ByteString = Vec<u8>;

/// Block height
pub type Height = u32;

/// Block header as seen by the consensus parameter checks.
///
/// `hash` is the proof-of-work hash of the header fields. Headers from the
/// network carry it; headers built here derive it with a
/// [`HeaderHasher`] through [`BlockHeader::with_hash_from`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: i32,
    pub prev_block_hash: BlockHash,
    pub merkle_root: BlockHash,
    pub timestamp: i64,
    pub bits: CompactBits,
    pub nonce: Hash,
    pub hash: BlockHash,
}

impl BlockHeader {
    /// Serialised size of the header fields, excluding the hash.
    pub const SERIALIZED_SIZE: usize = 4 + 32 + 32 + 4 + 4 + 32;

    /// Serialize the header fields (little-endian integers, internal byte order hashes)
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::SERIALIZED_SIZE);

        bytes.extend_from_slice(&self.version.to_le_bytes());
        bytes.extend_from_slice(&self.prev_block_hash.into_inner());
        bytes.extend_from_slice(&self.merkle_root.into_inner());
        // Timestamps are 32-bit on the wire.
        bytes.extend_from_slice(&(self.timestamp as u32).to_le_bytes());
        bytes.extend_from_slice(&self.bits.to_u32().to_le_bytes());
        bytes.extend_from_slice(&self.nonce);

        bytes
    }

    /// Replace `hash` with the hash `hasher` derives from the fields.
    pub fn with_hash_from<H: HeaderHasher + ?Sized>(mut self, hasher: &H) -> Self {
        self.hash = hasher.hash_header(&self);
        self
    }

    /// Double-SHA256 of the serialised header, see [`Sha256dHasher`].
    pub fn compute_hash(&self) -> BlockHash {
        Sha256dHasher.hash_header(self)
    }

    /// [`BlockHeader::with_hash_from`] with [`Sha256dHasher`].
    pub fn with_computed_hash(self) -> Self {
        self.with_hash_from(&Sha256dHasher)
    }

    /// Declared target
    pub fn target(&self) -> Result<Target> {
        self.bits.to_target()
    }

    /// CheckProofOfWork: the header hash, read as a 256-bit integer, must not exceed the declared target.
    pub fn check_proof_of_work(&self) -> Result<bool> {
        let target = self.target()?;
        let hash_value = Target::from_hash_bytes(&self.hash.into_inner());
        Ok(hash_value <= target)
    }

    /// Whether the version signals BIP34 (height in coinbase).
    pub fn is_bip34(&self) -> bool {
        self.version >= crate::constants::BLOCK_VERSION_BIP34
    }

    /// Whether the version signals BIP65 (CHECKLOCKTIMEVERIFY).
    pub fn is_bip65(&self) -> bool {
        self.version >= crate::constants::BLOCK_VERSION_BIP65
    }
}

/// A header as returned by the block store, together with its chain height.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlock {
    pub header: BlockHeader,
    pub height: Height,
}

impl StoredBlock {
    pub fn new(header: BlockHeader, height: Height) -> Self {
        Self { header, height }
    }

    pub fn hash(&self) -> BlockHash {
        self.header.hash
    }

    pub fn is_genesis(&self) -> bool {
        self.height == 0
    }

    /// Fetch the direct predecessor. `Ok(None)` means the store has no such block.
    pub fn prev<S: BlockStore + ?Sized>(&self, store: &S) -> std::result::Result<Option<StoredBlock>, StoreError> {
        store.get(&self.header.prev_block_hash)
    }
}

/// OutPoint: 𝒪 = ℍ × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

/// Transaction Input: ℐ = 𝒪 × 𝕊 × ℕ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
}

/// Transaction Output: 𝒯 = ℤ × 𝕊
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: i64,
    pub script_pubkey: ByteString,
}

/// Transaction: 𝒯𝒳 = ℕ × ℐ* × 𝒯* × ℕ
///
/// Script flags are derived per transaction, but no current rule inspects
/// the transaction itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}
