//! Consensus parameters for each network
//!
//! Every network is a closed [`Network`] variant mapped to one immutable
//! [`ChainParameters`] record. The retarget algorithm is data
//! ([`RetargetRule`]), so the behaviours below are the same code for all
//! networks.

use crate::compact::{CompactBits, Target};
use crate::constants::*;
use crate::error::{ConsensusError, Result};
use crate::flags::{self, BlockVerifyFlag, ScriptVerifyFlag};
use crate::hasher::{HeaderHasher, Sha256dHasher};
use crate::registry::registry;
use crate::retarget::{self, RetargetRule};
use crate::store::BlockStore;
use crate::tally::VersionTally;
use crate::types::{BlockHash, BlockHeader, Hash, Height, StoredBlock, Transaction};
use bitcoin_hashes::Hash as _;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::{fmt, str::FromStr};
use tracing::warn;

/// The networks a node can run on.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Network {
    /// The production network.
    Main,
    /// The public test network.
    Test,
    /// Local regression testing, where blocks can be mined instantly.
    Regtest,
    /// In-process unit tests, with tiny majority windows.
    UnitTest,
}

impl Network {
    pub const ALL: [Network; 4] = [Network::Main, Network::Test, Network::Regtest, Network::UnitTest];

    /// Stable string identifier
    pub fn id(self) -> &'static str {
        match self {
            Network::Main => ID_MAINNET,
            Network::Test => ID_TESTNET,
            Network::Regtest => ID_REGTEST,
            Network::UnitTest => ID_UNITTESTNET,
        }
    }

    /// Identifier used in payment requests
    pub fn payment_protocol_id(self) -> &'static str {
        match self {
            Network::Main => PAYMENT_PROTOCOL_ID_MAINNET,
            Network::Test => PAYMENT_PROTOCOL_ID_TESTNET,
            Network::Regtest => PAYMENT_PROTOCOL_ID_REGTEST,
            Network::UnitTest => PAYMENT_PROTOCOL_ID_UNIT_TESTS,
        }
    }

    pub fn from_id(id: &str) -> Option<Network> {
        Network::ALL.into_iter().find(|network| network.id() == id)
    }

    pub fn from_payment_protocol_id(id: &str) -> Option<Network> {
        Network::ALL
            .into_iter()
            .find(|network| network.payment_protocol_id() == id)
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Network {
    type Err = ConsensusError;

    /// Accepts either the string id or the payment protocol id.
    fn from_str(s: &str) -> Result<Network> {
        Network::from_id(s)
            .or_else(|| Network::from_payment_protocol_id(s))
            .ok_or_else(|| ConsensusError::UnknownNetwork(s.to_string()))
    }
}

/// Peer protocol versions that gate features.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ProtocolVersion {
    Minimum,
    Pong,
    BloomFilter,
    WitnessVersion,
    Current,
}

impl ProtocolVersion {
    pub fn num(self) -> u32 {
        match self {
            ProtocolVersion::Minimum => 70103,
            ProtocolVersion::Pong => 60001,
            ProtocolVersion::BloomFilter => 70201,
            ProtocolVersion::WitnessVersion => 70103,
            ProtocolVersion::Current => 70206,
        }
    }
}

/// Header fields of a network's genesis block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisDescriptor {
    pub version: i32,
    pub timestamp: i64,
    pub bits: CompactBits,
    pub nonce: Hash,
    pub merkle_root: BlockHash,
    /// Published hash, pinned as the height 0 checkpoint
    pub hash: BlockHash,
}

impl GenesisDescriptor {
    /// Build the genesis header and derive its hash with `hasher`. The
    /// previous block hash is all zeroes.
    ///
    /// The result is not compared with the published hash; see
    /// [`ChainParameters::genesis_block`].
    pub fn header<H: HeaderHasher + ?Sized>(&self, hasher: &H) -> BlockHeader {
        BlockHeader {
            version: self.version,
            prev_block_hash: BlockHash::from_inner([0; 32]),
            merkle_root: self.merkle_root,
            timestamp: self.timestamp,
            bits: self.bits,
            nonce: self.nonce,
            hash: BlockHash::from_inner([0; 32]),
        }
        .with_hash_from(hasher)
    }
}

/// Coinbase commitment shared by the main and regression test genesis blocks.
const MAIN_GENESIS_MERKLE_ROOT: &str = "69de4474f3172f2366a11b9d5a2b9138fb5bbb0b77713d42fdfe69fc64a34162";

/// Coinbase commitment of the test network genesis block.
const TEST_GENESIS_MERKLE_ROOT: &str = "a12949fc4a1735c8cbd6444bf9b4aea61300bc7aee9fec741af5a8c2fe386216";

fn hash(display_hex: &str) -> BlockHash {
    display_hex.parse().expect("hard-coded hash parses")
}

/// A 256-bit value given in display (reversed) hex, in internal byte order.
fn reversed_bytes(display_hex: &str) -> Hash {
    let mut bytes: Hash = hex::decode(display_hex)
        .expect("hard-coded hex parses")
        .try_into()
        .expect("hard-coded value is 32 bytes");
    bytes.reverse();
    bytes
}

fn pow_limit(hex: &str) -> Target {
    Target::from_hex(hex).expect("hard-coded proof of work limit parses")
}

/// Timespan bounds around `N × spacing` for the given adjustment percentages.
fn timespan_bounds(max_adjust_up: i64, max_adjust_down: i64) -> (i64, i64) {
    (
        AVERAGING_WINDOW_TIMESPAN * (100 - max_adjust_up) / 100,
        AVERAGING_WINDOW_TIMESPAN * (100 + max_adjust_down) / 100,
    )
}

/// Immutable consensus parameters of one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainParameters {
    pub network: Network,

    /// Averaging window N
    pub averaging_window: u32,
    /// Seconds per block
    pub target_spacing: i64,
    pub target_timespan: i64,
    /// Blocks per difficulty cycle
    pub interval: u32,
    /// Percent
    pub pow_max_adjust_up: i64,
    /// Percent
    pub pow_max_adjust_down: i64,
    pub min_actual_timespan: i64,
    pub max_actual_timespan: i64,
    /// Easiest target a block may declare
    pub pow_limit: Target,
    pub retarget_rule: RetargetRule,

    pub genesis: GenesisDescriptor,

    pub majority_window: usize,
    pub majority_enforce_block_upgrade: usize,
    pub majority_reject_block_outdated: usize,
    pub bip16_enforce_time: i64,

    pub spendable_coinbase_depth: u32,
    pub subsidy_decrease_block_count: u32,

    /// Known block hashes by height
    pub checkpoints: BTreeMap<Height, BlockHash>,
}

impl ChainParameters {
    fn with_genesis(network: Network, genesis: GenesisDescriptor) -> Self {
        let checkpoints = BTreeMap::from([(0, genesis.hash)]);
        let (min_actual_timespan, max_actual_timespan) = timespan_bounds(0, 0);

        ChainParameters {
            network,
            averaging_window: POW_AVERAGING_WINDOW,
            target_spacing: TARGET_SPACING,
            target_timespan: TARGET_TIMESPAN,
            interval: INTERVAL,
            pow_max_adjust_up: 0,
            pow_max_adjust_down: 0,
            min_actual_timespan,
            max_actual_timespan,
            pow_limit: Target::zero(),
            retarget_rule: RetargetRule::AveragingWindowMedianTime,
            genesis,
            majority_window: 100,
            majority_enforce_block_upgrade: 51,
            majority_reject_block_outdated: 75,
            bip16_enforce_time: BIP16_ENFORCE_TIME,
            spendable_coinbase_depth: 100,
            subsidy_decrease_block_count: 840_960,
            checkpoints,
        }
    }

    fn with_adjustment(mut self, max_adjust_up: i64, max_adjust_down: i64) -> Self {
        let (min, max) = timespan_bounds(max_adjust_up, max_adjust_down);
        self.pow_max_adjust_up = max_adjust_up;
        self.pow_max_adjust_down = max_adjust_down;
        self.min_actual_timespan = min;
        self.max_actual_timespan = max;
        self
    }

    /// Production network parameters.
    pub fn main() -> Self {
        // TODO: pin the published main genesis nonce once it is recovered from a node.
        let genesis = GenesisDescriptor {
            version: BLOCK_VERSION_GENESIS,
            timestamp: 1_524_045_652,
            bits: CompactBits(0x1e09b173),
            nonce: [0; 32],
            merkle_root: hash(MAIN_GENESIS_MERKLE_ROOT),
            hash: hash("0000079b37c3c290dc81e95bca28aa7df5636145ae35ebee86e10cc3cce96fb2"),
        };

        ChainParameters {
            pow_limit: pow_limit("000009b173000000000000000000000000000000000000000000000000000000"),
            majority_window: 1000,
            majority_enforce_block_upgrade: 750,
            majority_reject_block_outdated: 950,
            ..Self::with_genesis(Network::Main, genesis)
        }
        .with_adjustment(16, 32)
    }

    /// Public test network parameters.
    pub fn testnet() -> Self {
        let genesis = GenesisDescriptor {
            version: BLOCK_VERSION_GENESIS,
            timestamp: 1_524_057_440,
            bits: CompactBits(0x1f0fffff),
            nonce: reversed_bytes("000020f00dd1af082323e02e1f5b1d866d777abbcf63ba720d35dcf585840073"),
            merkle_root: hash(TEST_GENESIS_MERKLE_ROOT),
            hash: hash("000f378be841f44e75346eebd931b13041f0dee561af6a80cfea6669c1bfec03"),
        };

        ChainParameters {
            pow_limit: pow_limit("000fffffff000000000000000000000000000000000000000000000000000000"),
            retarget_rule: RetargetRule::EveryBlockRawTimespan,
            ..Self::with_genesis(Network::Test, genesis)
        }
    }

    /// Regression test parameters. Retargeting is neutral: min and max
    /// timespan both equal `N × spacing`.
    pub fn regtest() -> Self {
        let genesis = GenesisDescriptor {
            version: BLOCK_VERSION_GENESIS,
            timestamp: 1_526_946_000,
            bits: CompactBits(0x200f0f0f),
            nonce: reversed_bytes("0000ec7bfb02cb74cc021bbc03773834a65f8a16655212b5abc8841efbea0000"),
            merkle_root: hash(MAIN_GENESIS_MERKLE_ROOT),
            hash: hash("0c1417be9488c5bc9c2974a8c2edf89089fdf9fa3e0e4a0d4c668ab973fcf8b4"),
        };

        ChainParameters {
            pow_limit: pow_limit("0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f0f"),
            interval: u32::MAX,
            subsidy_decrease_block_count: 150,
            ..Self::with_genesis(Network::Regtest, genesis)
        }
    }

    /// Parameters for in-process tests: small windows, easy target.
    pub fn unit_tests() -> Self {
        let mut genesis = GenesisDescriptor {
            version: BLOCK_VERSION_GENESIS,
            timestamp: 1_524_057_440,
            bits: CompactBits(0x2000ffff),
            nonce: [0; 32],
            merkle_root: hash(TEST_GENESIS_MERKLE_ROOT),
            hash: BlockHash::from_inner([0; 32]),
        };
        genesis.hash = genesis.header(&Sha256dHasher).hash;

        ChainParameters {
            pow_limit: pow_limit("00ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff"),
            interval: 10,
            majority_window: 7,
            majority_enforce_block_upgrade: 3,
            majority_reject_block_outdated: 4,
            spendable_coinbase_depth: 5,
            subsidy_decrease_block_count: 100,
            ..Self::with_genesis(Network::UnitTest, genesis)
        }
        .with_adjustment(16, 32)
    }

    /// Freshly built parameters for `network`.
    ///
    /// Most callers want the shared instance from [`crate::registry()`].
    pub fn for_network(network: Network) -> Self {
        match network {
            Network::Main => Self::main(),
            Network::Test => Self::testnet(),
            Network::Regtest => Self::regtest(),
            Network::UnitTest => Self::unit_tests(),
        }
    }

    /// The shared parameters registered under `id`.
    pub fn from_id(id: &str) -> Option<&'static ChainParameters> {
        Network::from_id(id).map(|network| registry().get(network))
    }

    /// The shared parameters registered under payment protocol `id`.
    pub fn from_payment_protocol_id(id: &str) -> Option<&'static ChainParameters> {
        Network::from_payment_protocol_id(id).map(|network| registry().get(network))
    }

    pub fn id(&self) -> &'static str {
        self.network.id()
    }

    pub fn payment_protocol_id(&self) -> &'static str {
        self.network.payment_protocol_id()
    }

    /// `N × spacing`, the nominal duration of an averaging window
    pub fn averaging_window_timespan(&self) -> i64 {
        i64::from(self.averaging_window) * self.target_spacing
    }

    /// See [`retarget::check_difficulty_transitions`].
    pub fn check_difficulty_transitions<S: BlockStore + ?Sized>(
        &self,
        previous: &StoredBlock,
        candidate: &BlockHeader,
        store: &S,
    ) -> Result<()> {
        retarget::check_difficulty_transitions(self, previous, candidate, store)
    }

    /// See [`retarget::expected_next_bits`].
    pub fn expected_next_bits<S: BlockStore + ?Sized>(
        &self,
        previous: &StoredBlock,
        candidate: &BlockHeader,
        store: &S,
    ) -> Result<Option<CompactBits>> {
        retarget::expected_next_bits(self, previous, candidate, store)
    }

    pub fn block_verification_flags(
        &self,
        block: &BlockHeader,
        tally: &VersionTally,
        height: Option<Height>,
    ) -> BTreeSet<BlockVerifyFlag> {
        flags::block_verification_flags(self, block, tally, height)
    }

    pub fn transaction_verification_flags(
        &self,
        block: &BlockHeader,
        transaction: &Transaction,
        tally: &VersionTally,
        height: Option<Height>,
    ) -> BTreeSet<ScriptVerifyFlag> {
        flags::transaction_verification_flags(self, block, transaction, tally, height)
    }

    pub fn protocol_version_num(&self, version: ProtocolVersion) -> u32 {
        version.num()
    }

    /// Whether the block after `height` ends a difficulty cycle.
    pub fn is_difficulty_transition_point(&self, height: Height) -> bool {
        (u64::from(height) + 1) % u64::from(self.interval) == 0
    }

    /// False only when a checkpoint exists at `height` with a different hash.
    pub fn passes_checkpoint(&self, height: Height, hash: &BlockHash) -> bool {
        self.checkpoints
            .get(&height)
            .map_or(true, |checkpoint| checkpoint == hash)
    }

    pub fn is_checkpoint(&self, height: Height) -> bool {
        self.checkpoints.contains_key(&height)
    }

    /// Genesis header hashed by `hasher`.
    ///
    /// Fails with [`ConsensusError::GenesisMismatch`] unless the derived hash
    /// is the published genesis hash. Only the unit test network's genesis
    /// verifies with [`Sha256dHasher`]; the others need the network hasher.
    pub fn genesis_block<H: HeaderHasher + ?Sized>(&self, hasher: &H) -> Result<BlockHeader> {
        let header = self.genesis.header(hasher);
        if header.hash != self.genesis.hash {
            warn!(
                network = %self.network,
                computed = %header.hash,
                "genesis block does not hash to its checkpoint"
            );
            return Err(ConsensusError::GenesisMismatch {
                network: self.network,
                expected: self.genesis.hash,
                actual: header.hash,
            });
        }
        Ok(header)
    }

    pub fn genesis_hash(&self) -> BlockHash {
        self.genesis.hash
    }

    /// Verified genesis block at height zero, ready to seed a block store.
    pub fn genesis_stored_block<H: HeaderHasher + ?Sized>(&self, hasher: &H) -> Result<StoredBlock> {
        Ok(StoredBlock::new(self.genesis_block(hasher)?, 0))
    }

    /// Maximum money supply in base units.
    pub fn max_money(&self) -> i64 {
        MAX_MONEY
    }

    pub fn has_max_money(&self) -> bool {
        true
    }

    /// Add checkpoints, rejecting any that contradict an existing one.
    pub fn with_checkpoints(
        mut self,
        extra: impl IntoIterator<Item = (Height, BlockHash)>,
    ) -> Result<Self> {
        for (height, hash) in extra {
            if let Some(existing) = self.checkpoints.get(&height) {
                if *existing != hash {
                    return Err(ConsensusError::Config(format!(
                        "checkpoint at height {height} conflicts: {existing} vs {hash}"
                    )));
                }
            }
            self.checkpoints.insert(height, hash);
        }
        Ok(self)
    }
}
