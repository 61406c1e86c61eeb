//! Proof-of-work header hashing
//!
//! The network's block hash is not a plain double-SHA256, and its hash
//! function is not part of this crate. Anything that has to derive a hash
//! from header fields takes a [`HeaderHasher`] from the caller, the same
//! way ancestor reads go through a [`crate::BlockStore`].

use crate::types::{BlockHash, BlockHeader};
use bitcoin_hashes::{sha256d, Hash as _};

/// Hash of a serialised header.
pub trait HeaderHasher {
    fn hash_header(&self, header: &BlockHeader) -> BlockHash;
}

impl<H: HeaderHasher + ?Sized> HeaderHasher for &H {
    fn hash_header(&self, header: &BlockHeader) -> BlockHash {
        (**self).hash_header(header)
    }
}

/// Double-SHA256 over [`BlockHeader::serialize`].
///
/// Used for locally built chains and the unit test network, whose genesis
/// hash is defined by it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sha256dHasher;

impl HeaderHasher for Sha256dHasher {
    fn hash_header(&self, header: &BlockHeader) -> BlockHash {
        sha256d::Hash::hash(&header.serialize())
    }
}
