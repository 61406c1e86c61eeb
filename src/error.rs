//! Error types for consensus parameter checks

use crate::compact::CompactBits;
use crate::params::Network;
use crate::store::StoreError;
use crate::types::BlockHash;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsensusError {
    #[error("Network provided difficulty bits do not match what was calculated: {expected} vs {actual}")]
    DifficultyMismatch {
        expected: CompactBits,
        actual: CompactBits,
    },

    #[error("Ancestor lookup failed: {0}")]
    AncestorLookupFailed(String),

    #[error("Malformed compact bits: {0:#010x}")]
    MalformedCompactBits(u32),

    #[error("Genesis block of {network} hashes to {actual}, checkpoint is {expected}")]
    GenesisMismatch {
        network: Network,
        expected: BlockHash,
        actual: BlockHash,
    },

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<StoreError> for ConsensusError {
    fn from(err: StoreError) -> Self {
        ConsensusError::AncestorLookupFailed(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
