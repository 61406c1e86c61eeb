//! Difficulty retarget validation
//!
//! The expected target for a candidate block is the mean target of the
//! previous `N` blocks, scaled by how long those blocks actually took
//! relative to `N × spacing`. The observed timespan is damped by a
//! factor of four and clamped to the network's bounds before scaling:
//!
//! ```text
//! avg      = Σ target(prev .. prev-N+1) / N
//! actual   = mtp(prev) - mtp(prev-N)
//! actual   = W + (actual - W) / 4          where W = N × spacing
//! actual   = clamp(actual, min, max)
//! expected = min(avg / W * actual, pow_limit)
//! ```
//!
//! The division happens before the multiplication. Reordering changes the
//! truncation and therefore the consensus result.

use crate::compact::{CompactBits, Target};
use crate::error::{ConsensusError, Result};
use crate::median_time::median_time_past;
use crate::params::ChainParameters;
use crate::store::{require_block, require_previous, BlockStore};
use crate::types::{BlockHeader, StoredBlock};
use crate::u256::U512;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Which retarget algorithm a network runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetargetRule {
    /// Retarget only when `(prev_height + 1) % N == 0`, measuring the
    /// window with median time past. Chains shorter than the window pass.
    AveragingWindowMedianTime,
    /// Retarget on every block, measuring the window with raw header
    /// timestamps. Until the window is full the difficulty must not change.
    EveryBlockRawTimespan,
}

/// Sum of the targets in an averaging window, and the block just before it.
struct WindowSum {
    total: U512,
    /// Block preceding the oldest block of the window.
    before_window: StoredBlock,
}

/// CheckDifficultyTransitions: does `candidate` declare the bits the rules require?
///
/// `previous` is the stored block `candidate` builds on.
pub fn check_difficulty_transitions<S: BlockStore + ?Sized>(
    params: &ChainParameters,
    previous: &StoredBlock,
    candidate: &BlockHeader,
    store: &S,
) -> Result<()> {
    let expected = match expected_next_bits(params, previous, candidate, store)? {
        Some(expected) => expected,
        None => return Ok(()),
    };

    if expected != candidate.bits {
        warn!(
            height = previous.height + 1,
            %expected,
            actual = %candidate.bits,
            "network provided difficulty bits do not match what was calculated"
        );
        return Err(ConsensusError::DifficultyMismatch {
            expected,
            actual: candidate.bits,
        });
    }

    Ok(())
}

/// The bits `candidate` must declare, or `None` when no check applies at this height.
pub fn expected_next_bits<S: BlockStore + ?Sized>(
    params: &ChainParameters,
    previous: &StoredBlock,
    candidate: &BlockHeader,
    store: &S,
) -> Result<Option<CompactBits>> {
    match params.retarget_rule {
        RetargetRule::AveragingWindowMedianTime => {
            averaging_window_median_time(params, previous, candidate, store)
        }
        RetargetRule::EveryBlockRawTimespan => every_block_raw_timespan(params, previous, store),
    }
}

fn averaging_window_median_time<S: BlockStore + ?Sized>(
    params: &ChainParameters,
    previous: &StoredBlock,
    candidate: &BlockHeader,
    store: &S,
) -> Result<Option<CompactBits>> {
    if (u64::from(previous.height) + 1) % u64::from(params.averaging_window) != 0 {
        return Ok(None);
    }

    let first = require_block(&candidate.prev_block_hash, store)?;
    let window = match sum_window(params, first, store)? {
        Some(window) => window,
        None => {
            debug!(
                height = previous.height + 1,
                "not enough history for a difficulty retarget, skipping check"
            );
            return Ok(None);
        }
    };

    let prev_median_time = median_time_past(previous, store)?;
    let first_median_time = median_time_past(&window.before_window, store)?;

    let timespan = prev_median_time.saturating_sub(first_median_time);

    let expected = next_target(params, window.total, timespan);
    Ok(Some(expected.to_compact()))
}

fn every_block_raw_timespan<S: BlockStore + ?Sized>(
    params: &ChainParameters,
    previous: &StoredBlock,
    store: &S,
) -> Result<Option<CompactBits>> {
    let first = require_block(&previous.hash(), store)?;
    let window = match sum_window(params, first, store)? {
        Some(window) => window,
        // The difficulty is frozen until a full window exists.
        None => return Ok(Some(previous.header.bits)),
    };

    let timespan = previous
        .header
        .timestamp
        .saturating_sub(window.before_window.header.timestamp);

    let expected = next_target(params, window.total, timespan);
    Ok(Some(expected.to_compact()))
}

/// Walk back from `cursor` over up to `N` blocks, summing their targets.
///
/// Returns `None` if the genesis block is reached first. The genesis
/// block itself is never part of a window.
fn sum_window<S: BlockStore + ?Sized>(
    params: &ChainParameters,
    mut cursor: StoredBlock,
    store: &S,
) -> Result<Option<WindowSum>> {
    let mut total = U512::zero();
    let mut steps = 0;

    while steps < params.averaging_window && !cursor.is_genesis() {
        total = total + cursor.header.target()?.widen();
        cursor = require_previous(&cursor, store)?;
        steps += 1;
    }

    if steps < params.averaging_window {
        return Ok(None);
    }

    Ok(Some(WindowSum {
        total,
        before_window: cursor,
    }))
}

/// Expected target from a window's target sum and its observed timespan.
pub(crate) fn next_target(params: &ChainParameters, total: U512, actual_timespan: i64) -> Target {
    let window_timespan = params.averaging_window_timespan();
    let average = total / U512::from(params.averaging_window);

    let timespan = window_timespan + actual_timespan.saturating_sub(window_timespan) / 4;
    let timespan = timespan
        .max(params.min_actual_timespan)
        .min(params.max_actual_timespan);

    let expected = average / U512::from(window_timespan as u64) * U512::from(timespan as u64);

    match expected.try_narrow().map(Target::from) {
        Some(target) if target <= params.pow_limit => target,
        _ => {
            info!(pow_limit = %params.pow_limit, "difficulty hit proof of work limit");
            params.pow_limit
        }
    }
}
