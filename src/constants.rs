//! Consensus constants shared by every network

/// Target time per block: 2.5 minutes
pub const TARGET_SPACING: i64 = 150;

/// Target timespan of a difficulty cycle: 1 day
pub const TARGET_TIMESPAN: i64 = 24 * 60 * 60;

/// Blocks per difficulty cycle
pub const INTERVAL: u32 = (TARGET_TIMESPAN / TARGET_SPACING) as u32;

/// Number of trailing blocks averaged by the retarget rule (N)
pub const POW_AVERAGING_WINDOW: u32 = 17;

/// N × spacing
pub const AVERAGING_WINDOW_TIMESPAN: i64 = POW_AVERAGING_WINDOW as i64 * TARGET_SPACING;

/// Number of blocks in the median-time-past window
pub const MEDIAN_TIME_SPAN: usize = 11;

/// Blocks with a timestamp at or after this enforce BIP16 (pay to script hash)
pub const BIP16_ENFORCE_TIME: i64 = 1_333_238_400;

pub const BLOCK_VERSION_GENESIS: i32 = 1;

/// Block version introduced by BIP34 (height in coinbase)
pub const BLOCK_VERSION_BIP34: i32 = 2;

/// Block version introduced by BIP65 (CHECKLOCKTIMEVERIFY)
pub const BLOCK_VERSION_BIP65: i32 = 4;

/// Base units per coin
pub const COIN: i64 = 100_000_000;

/// Maximum number of coins ever generated
pub const MAX_COINS: i64 = 1_000_000_000;

/// Maximum money supply in base units
pub const MAX_MONEY: i64 = MAX_COINS * COIN;

pub const ID_MAINNET: &str = "org.ulord.production";
pub const ID_TESTNET: &str = "org.ulord.test";
pub const ID_REGTEST: &str = "org.ulord.regtest";
pub const ID_UNITTESTNET: &str = "co.usc.ulordj.unittest";

pub const PAYMENT_PROTOCOL_ID_MAINNET: &str = "main";
pub const PAYMENT_PROTOCOL_ID_TESTNET: &str = "test";
pub const PAYMENT_PROTOCOL_ID_REGTEST: &str = "regtest";
pub const PAYMENT_PROTOCOL_ID_UNIT_TESTS: &str = "unittest";
