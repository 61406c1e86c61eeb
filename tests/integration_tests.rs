//! End-to-end difficulty and flag checks over synthetic chains

mod common;

use common::TestChain;
use consensus_params::u256::U256;
use consensus_params::*;

#[test]
fn test_max_target_window_keeps_max_target() -> anyhow::Result<()> {
    let params = ChainParameters::main();
    let max_bits = params.pow_limit.to_compact().to_u32();

    // Tip at height 33 makes the candidate the 34th block, a retarget height.
    // Slow blocks push the scaled average past the limit, so it clamps back.
    let mut chain = TestChain::from_params(&params);
    chain.extend(33, max_bits, 180);
    assert_eq!(chain.tip.height, 33);

    let candidate = chain.candidate(max_bits);
    assert_eq!(
        params.expected_next_bits(&chain.tip, &candidate, &chain.store)?,
        Some(params.pow_limit.to_compact())
    );
    params.check_difficulty_transitions(&chain.tip, &candidate, &chain.store)?;
    Ok(())
}

#[test]
fn test_seventeen_max_target_blocks_then_an_eighteenth() -> anyhow::Result<()> {
    for params in [ChainParameters::main(), ChainParameters::regtest()] {
        let max_bits = params.pow_limit.to_compact().to_u32();

        // Genesis and 16 blocks at the limit; the candidate is the 18th block.
        let mut chain = TestChain::from_params(&params);
        chain.extend(16, max_bits, params.target_spacing);
        assert_eq!(chain.tip.height, 16);

        // The window would reach back to genesis, so there is no expectation.
        assert_eq!(
            params.expected_next_bits(&chain.tip, &chain.candidate(max_bits), &chain.store)?,
            None
        );
        params.check_difficulty_transitions(&chain.tip, &chain.candidate(0x1d00ffff), &chain.store)?;
    }
    Ok(())
}

#[test]
fn test_max_target_window_at_nominal_spacing_truncates() -> anyhow::Result<()> {
    // The average is divided by N × spacing before it is scaled, which drops
    // its low bits: a full window at the limit expects one mantissa step less.
    for (params, truncated) in [
        (ChainParameters::regtest(), 0x200f0f0e),
        (ChainParameters::main(), 0x1e09b172),
    ] {
        let max_bits = params.pow_limit.to_compact().to_u32();
        let mut chain = TestChain::from_params(&params);
        chain.extend(33, max_bits, params.target_spacing);

        assert_eq!(
            params.expected_next_bits(&chain.tip, &chain.candidate(max_bits), &chain.store)?,
            Some(CompactBits(truncated)),
            "{}",
            params.network
        );
        params.check_difficulty_transitions(&chain.tip, &chain.candidate(truncated), &chain.store)?;
        assert!(matches!(
            params.check_difficulty_transitions(&chain.tip, &chain.candidate(max_bits), &chain.store),
            Err(ConsensusError::DifficultyMismatch { .. })
        ));
    }
    Ok(())
}

#[test]
fn test_nominal_spacing_scales_by_exactly_one() -> anyhow::Result<()> {
    let params = ChainParameters::unit_tests();
    let bits = 0x1f00ffff;

    let mut chain = TestChain::from_params(&params);
    chain.extend(33, bits, 150);

    let average = decode_compact_bits(bits)?.as_u256();
    let w = U256::from(params.averaging_window_timespan() as u64);
    let expected = Target::from(average / w * w).to_compact();

    let candidate = chain.candidate(expected.to_u32());
    assert_eq!(
        params.expected_next_bits(&chain.tip, &candidate, &chain.store)?,
        Some(expected)
    );
    Ok(())
}

#[test]
fn test_regtest_expected_target_is_window_average() -> anyhow::Result<()> {
    let params = ChainParameters::regtest();
    // 2550 << 208: divisible by N × spacing, so no truncation.
    let bits = 0x1c09f600;

    for spacing in [1, 150, 10_000] {
        let mut chain = TestChain::from_params(&params);
        chain.extend(33, bits, spacing);
        let candidate = chain.candidate(bits);
        assert_eq!(
            params.expected_next_bits(&chain.tip, &candidate, &chain.store)?,
            Some(CompactBits(bits)),
            "spacing {spacing}"
        );
    }
    Ok(())
}

#[test]
fn test_fast_blocks_raise_difficulty_by_bounded_step() -> anyhow::Result<()> {
    let params = ChainParameters::main();
    let bits = 0x1e09b173;

    let mut chain = TestChain::from_params(&params);
    chain.extend(33, bits, 1);
    let candidate = chain.candidate(bits);

    let expected = params
        .expected_next_bits(&chain.tip, &candidate, &chain.store)?
        .expect("retarget height");
    let w = U256::from(params.averaging_window_timespan() as u64);
    let min = U256::from(params.min_actual_timespan as u64);
    let floor = decode_compact_bits(bits)?.as_u256() / w * min;
    assert_eq!(expected, Target::from(floor).to_compact());

    let err = params
        .check_difficulty_transitions(&chain.tip, &candidate, &chain.store)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Network provided difficulty bits do not match what was calculated: {expected} vs 1e09b173"
        )
    );
    Ok(())
}

#[test]
fn test_non_retarget_heights_accept_any_bits() -> anyhow::Result<()> {
    let params = ChainParameters::main();
    let mut chain = TestChain::from_params(&params);

    for _ in 0..40 {
        let height = chain.tip.height;
        if (height + 1) % params.averaging_window != 0 {
            for bits in [0x1d00ffff, 0x207fffff, 0x03123456] {
                params.check_difficulty_transitions(&chain.tip, &chain.candidate(bits), &chain.store)?;
            }
        }
        chain.push(1, 0x1e09b173, 150);
    }
    Ok(())
}

#[test]
fn test_testnet_retargets_every_block() -> anyhow::Result<()> {
    let params = ChainParameters::testnet();
    let limit_bits = params.pow_limit.to_compact().to_u32();
    let mut chain = TestChain::from_params(&params);

    // Before a full window the bits are frozen.
    chain.extend(10, limit_bits, 150);
    assert_eq!(
        params.expected_next_bits(&chain.tip, &chain.candidate(0), &chain.store)?,
        Some(CompactBits(limit_bits))
    );

    // With a full window of fast blocks, every height demands harder work.
    chain.extend(10, limit_bits, 30);
    for _ in 0..3 {
        let expected = params
            .expected_next_bits(&chain.tip, &chain.candidate(0), &chain.store)?
            .expect("every block is checked");
        assert!(expected.to_target()? < params.pow_limit);
        params.check_difficulty_transitions(&chain.tip, &chain.candidate(expected.to_u32()), &chain.store)?;
        chain.push(1, expected.to_u32(), 30);
    }
    Ok(())
}

#[test]
fn test_median_time_past_near_genesis() -> anyhow::Result<()> {
    let params = ChainParameters::regtest();
    let mut chain = TestChain::from_params(&params);
    let genesis_time = params.genesis.timestamp;

    assert_eq!(median_time_past(&chain.tip, &chain.store)?, genesis_time);
    chain.push(1, 0x200f0f0f, 100);
    // Two timestamps: lower middle.
    assert_eq!(median_time_past(&chain.tip, &chain.store)?, genesis_time);
    chain.push(1, 0x200f0f0f, 100);
    assert_eq!(median_time_past(&chain.tip, &chain.store)?, genesis_time + 100);
    Ok(())
}

#[test]
fn test_flags_from_initialized_tally() -> anyhow::Result<()> {
    let params = ChainParameters::unit_tests();
    let mut chain = TestChain::from_params(&params);
    for version in [1, 1, 1, 1, 2, 2, 4, 4, 4] {
        chain.push(version, 0x2000ffff, 150);
    }

    let mut tally = VersionTally::new(params.majority_window);
    tally.initialize(&chain.store, &chain.tip)?;
    assert_eq!(tally.count_at_or_above(2), Some(5));
    assert_eq!(tally.count_at_or_above(4), Some(3));

    let block = chain.candidate(0x2000ffff);
    let mut upgraded = block.clone();
    upgraded.version = 4;

    assert!(params.block_verification_flags(&block, &tally, Some(10)).is_empty());
    assert_eq!(
        params.block_verification_flags(&upgraded, &tally, Some(10)),
        [BlockVerifyFlag::HeightInCoinbase].into()
    );

    // Three version 4 blocks is not more than the enforce threshold of three.
    let tx = Transaction {
        version: 1,
        inputs: vec![],
        outputs: vec![],
        lock_time: 0,
    };
    let script_flags = params.transaction_verification_flags(&upgraded, &tx, &tally, Some(10));
    assert!(script_flags.contains(&ScriptVerifyFlag::P2sh));
    assert!(!script_flags.contains(&ScriptVerifyFlag::CheckLockTimeVerify));

    tally.add(4);
    let script_flags = params.transaction_verification_flags(&upgraded, &tx, &tally, Some(11));
    assert!(script_flags.contains(&ScriptVerifyFlag::CheckLockTimeVerify));
    Ok(())
}
