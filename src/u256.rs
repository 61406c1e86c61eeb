//! Fixed-width big integers for target arithmetic.
// Kept separate so the macro output can opt out of clippy.
#![allow(clippy::all)]
#![allow(clippy::range_plus_one)]
#![allow(clippy::fallible_impl_from)]
#![allow(missing_docs)]

use uint::construct_uint;

construct_uint! {
    pub struct U256(4);
}

construct_uint! {
    pub struct U512(8);
}

impl From<U256> for U512 {
    fn from(value: U256) -> Self {
        let mut buf = [0u8; 64];
        value.to_big_endian(&mut buf[32..]);
        U512::from_big_endian(&buf)
    }
}

impl U512 {
    /// Narrow to 256 bits, or `None` if any of the upper 256 bits are set.
    pub fn try_narrow(self) -> Option<U256> {
        if self.bits() > 256 {
            return None;
        }
        let mut buf = [0u8; 64];
        self.to_big_endian(&mut buf);
        Some(U256::from_big_endian(&buf[32..]))
    }
}
