//! Compact target codec
//!
//! The proof-of-work target is stored in the block header as a 32-bit
//! [`CompactBits`] value: a base-256 floating point number with an 8-bit
//! exponent and a 24-bit signed mantissa. The expanded [`Target`] is an
//! unsigned 256-bit integer.
//!
//! Decoding is exact. Encoding rounds the mantissa down to its three most
//! significant bytes, so `decode(encode(x))` may be smaller than `x`, but
//! `encode(decode(encode(x))) == encode(x)` always holds. Retarget checks
//! compare the *encoded* form, which rejects non-canonical encodings.

use crate::error::{ConsensusError, Result};
use crate::u256::{U256, U512};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 32-bit "nBits" value as it appears in a block header.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactBits(pub u32);

impl fmt::Debug for CompactBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("CompactBits")
            .field(&format_args!("{:#010x}", self.0))
            .finish()
    }
}

impl fmt::Display for CompactBits {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for CompactBits {
    fn from(bits: u32) -> Self {
        CompactBits(bits)
    }
}

impl CompactBits {
    /// Exponent offset: a mantissa is three bytes wide.
    const OFFSET: u32 = 3;

    /// Sign bit of the 24-bit mantissa.
    const SIGN_BIT: u32 = 0x0080_0000;

    /// Unsigned mantissa mask.
    const UNSIGNED_MANTISSA_MASK: u32 = Self::SIGN_BIT - 1;

    /// Raw 32-bit value.
    pub fn to_u32(self) -> u32 {
        self.0
    }

    /// Expand to the full 256-bit target.
    ///
    /// Negative values and values that do not fit in 256 bits are
    /// rejected with [`ConsensusError::MalformedCompactBits`]. A zero
    /// mantissa decodes to zero whatever the exponent.
    pub fn to_target(self) -> Result<Target> {
        let size = self.0 >> 24;
        let mantissa = self.0 & Self::UNSIGNED_MANTISSA_MASK;

        if mantissa == 0 {
            return Ok(Target::zero());
        }

        if self.0 & Self::SIGN_BIT != 0 {
            return Err(ConsensusError::MalformedCompactBits(self.0));
        }

        // Non-zero bits above 2^256.
        let overflow = size > 34
            || (mantissa > 0xff && size > 33)
            || (mantissa > 0xffff && size > 32);
        if overflow {
            return Err(ConsensusError::MalformedCompactBits(self.0));
        }

        let value = if size <= Self::OFFSET {
            U256::from(mantissa >> (8 * (Self::OFFSET - size)))
        } else {
            U256::from(mantissa) << (8 * (size - Self::OFFSET)) as usize
        };

        Ok(Target(value))
    }

    /// Encode a target in canonical compact form.
    ///
    /// The size byte counts a leading sign byte when the top bit of the
    /// value is set, so the stored mantissa is never negative. Zero
    /// encodes as `0x01000000`.
    pub fn from_target(target: &Target) -> CompactBits {
        let value = target.0;
        let mut size = value.bits() as u32 / 8 + 1;

        let mut mantissa = if size <= Self::OFFSET {
            value.low_u32() << (8 * (Self::OFFSET - size))
        } else {
            (value >> (8 * (size - Self::OFFSET)) as usize).low_u32()
        };

        if mantissa & Self::SIGN_BIT != 0 {
            mantissa >>= 8;
            size += 1;
        }

        CompactBits(mantissa | (size << 24))
    }
}

/// Decode compact bits into a target.
pub fn decode_compact_bits(bits: u32) -> Result<Target> {
    CompactBits(bits).to_target()
}

/// Encode a target into compact bits.
pub fn encode_compact_bits(target: &Target) -> u32 {
    CompactBits::from_target(target).0
}

/// An unsigned 256-bit proof-of-work target. Smaller is harder.
#[derive(Clone, Copy, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Target(pub(crate) U256);

impl Target {
    pub fn zero() -> Self {
        Target(U256::zero())
    }

    /// Parse a big-endian hex string of up to 64 digits.
    pub fn from_hex(hex_str: &str) -> Result<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| ConsensusError::Config(format!("invalid target hex {hex_str}: {e}")))?;
        if bytes.len() > 32 {
            return Err(ConsensusError::Config(format!(
                "target {hex_str} is wider than 256 bits"
            )));
        }
        Ok(Target(U256::from_big_endian(&bytes)))
    }

    /// Interpret a block hash (internal little-endian byte order) as a target-domain integer.
    pub fn from_hash_bytes(bytes: &[u8; 32]) -> Self {
        Target(U256::from_little_endian(bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut buf = [0u8; 32];
        self.0.to_big_endian(&mut buf);
        buf
    }

    pub fn to_compact(&self) -> CompactBits {
        CompactBits::from_target(self)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    pub(crate) fn widen(&self) -> U512 {
        U512::from(self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<U256> for Target {
    fn from(value: U256) -> Self {
        Target(value)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Target")
            .field(&hex::encode(self.to_be_bytes()))
            .finish()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&hex::encode(self.to_be_bytes()))
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.to_be_bytes()))
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Target::from_hex(&s).map_err(de::Error::custom)
    }
}
