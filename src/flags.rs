//! Soft-fork rule activation
//!
//! Which optional validation rules apply to a block and to the
//! transactions it carries. Version-gated rules require a supermajority of
//! the recent blocks counted by a [`VersionTally`]; a tally whose window is
//! not yet full never activates anything.

use crate::constants::{BLOCK_VERSION_BIP34, BLOCK_VERSION_BIP65};
use crate::params::ChainParameters;
use crate::tally::VersionTally;
use crate::types::{BlockHeader, Height, Transaction};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Block-level validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BlockVerifyFlag {
    /// BIP34: the coinbase must start with the block height.
    HeightInCoinbase,
}

/// Script validation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScriptVerifyFlag {
    /// BIP16 pay to script hash
    P2sh,
    StrictEnc,
    DerSig,
    LowS,
    NullDummy,
    SigPushOnly,
    MinimalData,
    DiscourageUpgradableNops,
    CleanStack,
    /// BIP65
    CheckLockTimeVerify,
}

/// Block flags for `block` at `height`.
///
/// `HeightInCoinbase` applies to version 2+ blocks once at least
/// `majority_enforce_block_upgrade` of the window signal version 2+.
/// The height is accepted for symmetry with the transaction flags; no
/// current rule reads it.
pub fn block_verification_flags(
    params: &ChainParameters,
    block: &BlockHeader,
    tally: &VersionTally,
    _height: Option<Height>,
) -> BTreeSet<BlockVerifyFlag> {
    let mut flags = BTreeSet::new();

    if block.is_bip34()
        && tally
            .count_at_or_above(BLOCK_VERSION_BIP34)
            .map_or(false, |count| count >= params.majority_enforce_block_upgrade)
    {
        flags.insert(BlockVerifyFlag::HeightInCoinbase);
    }

    flags
}

/// Script flags for `transaction` included in `block` at `height`.
///
/// P2SH is purely time-based. CHECKLOCKTIMEVERIFY needs strictly more than
/// `majority_enforce_block_upgrade` version 4+ blocks in the window.
pub fn transaction_verification_flags(
    params: &ChainParameters,
    block: &BlockHeader,
    _transaction: &Transaction,
    tally: &VersionTally,
    _height: Option<Height>,
) -> BTreeSet<ScriptVerifyFlag> {
    let mut flags = BTreeSet::new();

    if block.timestamp >= params.bip16_enforce_time {
        flags.insert(ScriptVerifyFlag::P2sh);
    }

    if block.is_bip65()
        && tally
            .count_at_or_above(BLOCK_VERSION_BIP65)
            .map_or(false, |count| count > params.majority_enforce_block_upgrade)
    {
        flags.insert(ScriptVerifyFlag::CheckLockTimeVerify);
    }

    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compact::CompactBits;
    use crate::constants::BIP16_ENFORCE_TIME;
    use crate::types::BlockHash;
    use bitcoin_hashes::Hash;

    fn block(version: i32, timestamp: i64) -> BlockHeader {
        BlockHeader {
            version,
            prev_block_hash: BlockHash::from_inner([0; 32]),
            merkle_root: BlockHash::from_inner([0; 32]),
            timestamp,
            bits: CompactBits(0x1f0fffff),
            nonce: [0; 32],
            hash: BlockHash::from_inner([0; 32]),
        }
    }

    fn tx() -> Transaction {
        Transaction {
            version: 1,
            inputs: vec![],
            outputs: vec![],
            lock_time: 0,
        }
    }

    fn tally(window: usize, upgraded: usize, version: i32) -> VersionTally {
        let mut tally = VersionTally::new(window);
        for i in 0..window {
            tally.add(if i < upgraded { version } else { 1 });
        }
        tally
    }

    #[test]
    fn test_height_in_coinbase_at_threshold() {
        let params = ChainParameters::testnet();
        let flags = block_verification_flags(&params, &block(2, 0), &tally(100, 51, 2), None);
        assert!(flags.contains(&BlockVerifyFlag::HeightInCoinbase));
    }

    #[test]
    fn test_height_in_coinbase_below_threshold() {
        let params = ChainParameters::testnet();
        let flags = block_verification_flags(&params, &block(2, 0), &tally(100, 50, 2), None);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_height_in_coinbase_requires_block_version() {
        let params = ChainParameters::testnet();
        let flags = block_verification_flags(&params, &block(1, 0), &tally(100, 100, 2), None);
        assert!(flags.is_empty());
    }

    #[test]
    fn test_version_signals_gate_flags() {
        let params = ChainParameters::testnet();
        let time = BIP16_ENFORCE_TIME;
        let upgraded = tally(100, 100, 4);

        // Version 3 signals BIP34 but not BIP65.
        let v3 = block(3, time);
        assert!(v3.is_bip34() && !v3.is_bip65());
        assert!(block_verification_flags(&params, &v3, &upgraded, None)
            .contains(&BlockVerifyFlag::HeightInCoinbase));
        assert_eq!(
            transaction_verification_flags(&params, &v3, &tx(), &upgraded, None),
            BTreeSet::from([ScriptVerifyFlag::P2sh])
        );

        let v4 = block(4, time);
        assert!(transaction_verification_flags(&params, &v4, &tx(), &upgraded, None)
            .contains(&ScriptVerifyFlag::CheckLockTimeVerify));
    }

    #[test]
    fn test_partial_tally_activates_nothing() {
        let params = ChainParameters::testnet();
        let mut partial = VersionTally::new(100);
        for _ in 0..99 {
            partial.add(4);
        }
        assert!(block_verification_flags(&params, &block(4, 0), &partial, Some(99)).is_empty());
        assert!(transaction_verification_flags(&params, &block(4, 0), &tx(), &partial, Some(99)).is_empty());
    }

    #[test]
    fn test_p2sh_is_time_based() {
        let params = ChainParameters::testnet();
        let empty = VersionTally::new(100);
        let before = transaction_verification_flags(&params, &block(1, BIP16_ENFORCE_TIME - 1), &tx(), &empty, None);
        let at = transaction_verification_flags(&params, &block(1, BIP16_ENFORCE_TIME), &tx(), &empty, None);
        assert!(before.is_empty());
        assert_eq!(at, BTreeSet::from([ScriptVerifyFlag::P2sh]));
    }

    #[test]
    fn test_check_lock_time_verify_is_strict() {
        let params = ChainParameters::testnet();
        let time = BIP16_ENFORCE_TIME;

        let at = transaction_verification_flags(&params, &block(4, time), &tx(), &tally(100, 51, 4), None);
        assert!(!at.contains(&ScriptVerifyFlag::CheckLockTimeVerify));

        let above = transaction_verification_flags(&params, &block(4, time), &tx(), &tally(100, 52, 4), None);
        assert!(above.contains(&ScriptVerifyFlag::CheckLockTimeVerify));
        assert!(above.contains(&ScriptVerifyFlag::P2sh));
    }
}
