//! External byte-addressable memory seen by the coprocessor.
//!
//! The device only ever touches memory through [`MemoryBus`]. Every address
//! is a `u16`, so offsets computed by the pipeline wrap modulo 65536 before
//! they reach the bus.

/// Owned and shared 64 KiB backing stores.
pub mod flat;

pub use flat::{FlatMemory, SharedMemory};

/// Size in bytes of the flat 16-bit address space (64 KiB).
pub const ADDRESS_SPACE_BYTES: usize = u16::MAX as usize + 1;

/// Allocates a canonical zeroed 64 KiB address-space backing store.
#[must_use]
pub fn new_address_space() -> Box<[u8]> {
    vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice()
}

/// Single-byte memory contract consumed by the block pipeline.
///
/// Reads have no side effects. No alignment constraints apply.
pub trait MemoryBus {
    /// Reads the byte stored at `addr`.
    fn read(&self, addr: u16) -> u8;

    /// Stores `value` at `addr`.
    fn write(&mut self, addr: u16, value: u8);

    /// Writes a contiguous byte slice starting at `base`, wrapping at the top
    /// of the address space.
    fn load(&mut self, base: u16, data: &[u8]) {
        let mut addr = base;
        for byte in data {
            self.write(addr, *byte);
            addr = addr.wrapping_add(1);
        }
    }

    /// Reads `len` consecutive bytes starting at `base`, wrapping at the top of
    /// the address space.
    fn dump(&self, base: u16, len: usize) -> Vec<u8> {
        let mut addr = base;
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(self.read(addr));
            addr = addr.wrapping_add(1);
        }
        out
    }
}

impl<M: MemoryBus + ?Sized> MemoryBus for &mut M {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        (**self).write(addr, value);
    }
}

impl<M: MemoryBus + ?Sized> MemoryBus for Box<M> {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        (**self).write(addr, value);
    }
}
