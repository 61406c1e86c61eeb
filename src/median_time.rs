//! Median time past

use crate::constants::MEDIAN_TIME_SPAN;
use crate::error::Result;
use crate::store::{require_previous, BlockStore};
use crate::types::StoredBlock;

/// Median timestamp of the last [`MEDIAN_TIME_SPAN`] blocks ending at `block`.
///
/// Walks back through predecessors, stopping after the genesis block, so
/// a chain shorter than the span yields the median of whatever is
/// available. For an even count the lower of the two middle values is
/// returned.
///
/// A predecessor missing from the store is an error, never treated as
/// the start of the chain.
pub fn median_time_past<S: BlockStore + ?Sized>(block: &StoredBlock, store: &S) -> Result<i64> {
    let mut timestamps = Vec::with_capacity(MEDIAN_TIME_SPAN);
    timestamps.push(block.header.timestamp);

    let mut cursor = block.clone();
    while timestamps.len() < MEDIAN_TIME_SPAN && !cursor.is_genesis() {
        cursor = require_previous(&cursor, store)?;
        timestamps.push(cursor.header.timestamp);
    }

    timestamps.sort_unstable();
    Ok(timestamps[(timestamps.len() - 1) / 2])
}
