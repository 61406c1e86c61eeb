//! Rolling tally of recent block versions

use crate::error::Result;
use crate::store::{require_previous, BlockStore};
use crate::types::StoredBlock;
use std::collections::VecDeque;
use tracing::debug;

/// Fixed-size window over the versions of the most recent blocks.
///
/// Counts are only reported once the window has been filled, so a node
/// that has seen fewer blocks than the majority window never activates a
/// version-gated rule.
#[derive(Debug, Clone)]
pub struct VersionTally {
    window: usize,
    versions: VecDeque<i32>,
}

impl VersionTally {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            versions: VecDeque::with_capacity(window),
        }
    }

    /// Record the version of a newly connected block, evicting the oldest.
    pub fn add(&mut self, version: i32) {
        if self.window == 0 {
            return;
        }
        if self.versions.len() == self.window {
            self.versions.pop_front();
        }
        self.versions.push_back(version);
    }

    /// Number of blocks in the window at or above `version`, or `None`
    /// until the window is full.
    pub fn count_at_or_above(&self, version: i32) -> Option<usize> {
        if self.versions.len() < self.window {
            return None;
        }
        Some(self.versions.iter().filter(|v| **v >= version).count())
    }

    /// Window size
    pub fn size(&self) -> usize {
        self.window
    }

    /// Versions recorded so far, at most [`VersionTally::size`]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Reset and refill from the chain ending at `head`, oldest first.
    ///
    /// Stops early at the genesis block, leaving the window partially
    /// filled. A missing predecessor is an error.
    pub fn initialize<S: BlockStore + ?Sized>(&mut self, store: &S, head: &StoredBlock) -> Result<()> {
        let mut recent = Vec::with_capacity(self.window);
        let mut cursor = head.clone();

        while recent.len() < self.window {
            recent.push(cursor.header.version);
            if cursor.is_genesis() {
                break;
            }
            if recent.len() < self.window {
                cursor = require_previous(&cursor, store)?;
            }
        }

        self.versions.clear();
        for version in recent.into_iter().rev() {
            self.add(version);
        }

        debug!(
            head = head.height,
            window = self.window,
            stored = self.versions.len(),
            "initialized version tally"
        );
        Ok(())
    }
}
