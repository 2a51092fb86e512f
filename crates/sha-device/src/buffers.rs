//! Wide internal datapath buffers.
//!
//! Both buffers model unsigned integers stored as little-endian byte limbs:
//! limb `i` holds bits `[8i, 8i+7]`. The gather/scatter helpers implement
//! the address-order contracts between memory and those integers.

use std::fmt;

use crate::hash::{BLOCK_BYTES, DIGEST_BYTES};
use crate::memory::MemoryBus;

/// 512-bit block register filled by `ReadBlock`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockBuffer {
    limbs: [u8; BLOCK_BYTES],
}

impl Default for BlockBuffer {
    fn default() -> Self {
        Self::ZERO
    }
}

impl BlockBuffer {
    /// All-zero block.
    pub const ZERO: Self = Self {
        limbs: [0; BLOCK_BYTES],
    };

    /// Builds a block from little-endian limbs.
    #[must_use]
    pub const fn from_le_bytes(limbs: [u8; BLOCK_BYTES]) -> Self {
        Self { limbs }
    }

    /// Returns the little-endian limbs (limb 0 is the least-significant byte).
    #[must_use]
    pub const fn to_le_bytes(&self) -> [u8; BLOCK_BYTES] {
        self.limbs
    }

    /// Assembles a block from the 64 bytes at `base..base+63`.
    ///
    /// The byte at offset `63 - i` lands in limb `i`, so the highest address
    /// becomes the least-significant byte. Addresses wrap modulo 65536.
    #[must_use]
    pub fn gather<M: MemoryBus + ?Sized>(memory: &M, base: u16) -> Self {
        let mut limbs = [0; BLOCK_BYTES];
        for (i, limb) in limbs.iter_mut().enumerate() {
            *limb = memory.read(base.wrapping_add(block_offset(BLOCK_BYTES - 1 - i)));
        }
        Self { limbs }
    }

    /// Returns the message bytes submitted to the hash primitive.
    ///
    /// Bytes come out most-significant limb first, undoing the reversal
    /// applied by [`BlockBuffer::gather`]: the result is the memory block in
    /// address-increasing order. Reading the limbs least-significant first
    /// would instead hash the block from its highest address down.
    #[must_use]
    pub fn message_bytes(&self) -> [u8; BLOCK_BYTES] {
        let mut out = self.limbs;
        out.reverse();
        out
    }
}

impl fmt::LowerHex for BlockBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_limbs_hex(f, &self.limbs)
    }
}

/// 160-bit digest register latched at the end of `Compute2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DigestBuffer {
    limbs: [u8; DIGEST_BYTES],
}

impl Default for DigestBuffer {
    fn default() -> Self {
        Self::ZERO
    }
}

impl DigestBuffer {
    /// All-zero digest.
    pub const ZERO: Self = Self {
        limbs: [0; DIGEST_BYTES],
    };

    /// Packs a digest so that digest byte `i` occupies limb `i`.
    #[must_use]
    pub const fn from_digest(digest: [u8; DIGEST_BYTES]) -> Self {
        Self { limbs: digest }
    }

    /// Returns the little-endian limbs, which equal the digest bytes in
    /// their natural order.
    #[must_use]
    pub const fn to_le_bytes(&self) -> [u8; DIGEST_BYTES] {
        self.limbs
    }

    /// Stores the digest at `base..base+19`.
    ///
    /// Limb `i` is written to offset `19 - i`, so the digest appears in
    /// reversed byte order in memory. Addresses wrap modulo 65536.
    pub fn scatter<M: MemoryBus + ?Sized>(&self, memory: &mut M, base: u16) {
        for (i, limb) in self.limbs.iter().enumerate() {
            memory.write(base.wrapping_add(block_offset(DIGEST_BYTES - 1 - i)), *limb);
        }
    }
}

impl fmt::LowerHex for DigestBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_limbs_hex(f, &self.limbs)
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn block_offset(offset: usize) -> u16 {
    offset as u16
}

fn write_limbs_hex(f: &mut fmt::Formatter<'_>, limbs: &[u8]) -> fmt::Result {
    if f.alternate() {
        f.write_str("0x")?;
    }
    for limb in limbs.iter().rev() {
        write!(f, "{limb:02x}")?;
    }
    Ok(())
}
