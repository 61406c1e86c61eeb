//! # Consensus-Params
//!
//! Consensus parameters and proof-of-work retargeting for a Bitcoin-derived chain.
//!
//! Given a candidate block header and read access to its ancestors, this crate
//! decides whether the header declares the difficulty the consensus rules
//! require, and which soft-fork rules apply given recent miner version
//! signalling.
//!
//! ## Architecture
//!
//! - `compact`: the 32-bit `nBits` encoding of 256-bit targets
//! - `store` and `hasher`: ancestor reads and header hashing, supplied by the caller
//! - `median_time`: median timestamp of the last eleven blocks
//! - `retarget`: averaging-window difficulty validation
//! - `tally` and `flags`: version majorities and the rules they activate
//! - `params` and `registry`: one immutable parameter set per network
//!
//! Every check is a pure function of the parameters, the header and the
//! block store. Nothing here mutates shared state; the process-wide
//! [`registry()`] is built once and is read-only.
//!
//! ## Usage
//!
//! ```rust
//! use consensus_params::{registry, MemoryBlockStore, Network, Sha256dHasher, VersionTally};
//!
//! // The unit test network's genesis hash is double-SHA256; other networks
//! // need their own `HeaderHasher`.
//! let params = registry().get(Network::UnitTest);
//!
//! let mut store = MemoryBlockStore::new();
//! let genesis = params.genesis_stored_block(&Sha256dHasher)?;
//! store.put(genesis.clone());
//!
//! let mut candidate = params.genesis_block(&Sha256dHasher)?;
//! candidate.prev_block_hash = genesis.hash();
//! candidate.timestamp += 150;
//! let candidate = candidate.with_hash_from(&Sha256dHasher);
//!
//! // Height 1 is not a retarget height, so any bits pass.
//! params.check_difficulty_transitions(&genesis, &candidate, &store)?;
//!
//! let tally = VersionTally::new(params.majority_window);
//! assert!(params.block_verification_flags(&candidate, &tally, Some(1)).is_empty());
//! # Ok::<(), consensus_params::ConsensusError>(())
//! ```

pub mod u256;
pub mod compact;
pub mod types;
pub mod constants;
pub mod error;
pub mod store;
pub mod hasher;
pub mod median_time;
pub mod retarget;
pub mod tally;
pub mod flags;
pub mod params;
pub mod registry;
pub mod config;

// Re-export commonly used types
pub use compact::{decode_compact_bits, encode_compact_bits, CompactBits, Target};
pub use config::ConsensusConfig;
pub use error::{ConsensusError, Result};
pub use flags::{BlockVerifyFlag, ScriptVerifyFlag};
pub use hasher::{HeaderHasher, Sha256dHasher};
pub use median_time::median_time_past;
pub use params::{ChainParameters, GenesisDescriptor, Network, ProtocolVersion};
pub use registry::{registry, ChainRegistry};
pub use retarget::RetargetRule;
pub use store::{BlockStore, MemoryBlockStore, StoreError};
pub use tally::VersionTally;
pub use types::{BlockHash, BlockHeader, Height, StoredBlock, Transaction};
