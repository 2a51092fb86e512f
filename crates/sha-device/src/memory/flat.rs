use std::cell::RefCell;
use std::rc::Rc;

use super::{new_address_space, MemoryBus, ADDRESS_SPACE_BYTES};

/// Owned flat 64 KiB memory image.
///
/// The backing slice always holds exactly [`ADDRESS_SPACE_BYTES`] bytes, so
/// every `u16` address indexes it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMemory {
    bytes: Box<[u8]>,
}

impl Default for FlatMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatMemory {
    /// Creates a zeroed memory image.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: new_address_space(),
        }
    }

    /// Builds a memory image from a full 64 KiB byte slice.
    ///
    /// Returns `None` when `image` is not exactly [`ADDRESS_SPACE_BYTES`] long.
    #[must_use]
    pub fn from_image(image: &[u8]) -> Option<Self> {
        (image.len() == ADDRESS_SPACE_BYTES).then(|| Self {
            bytes: image.to_vec().into_boxed_slice(),
        })
    }

    /// Returns the full memory image in address order.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl MemoryBus for FlatMemory {
    fn read(&self, addr: u16) -> u8 {
        self.bytes[usize::from(addr)]
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.bytes[usize::from(addr)] = value;
    }
}

/// Clonable handle to a memory image shared with the rest of a simulated
/// system.
///
/// Clones alias the same storage, so writes made through one handle are
/// visible through every other. The handle is single-threaded; the device
/// assumes nobody else writes through it during a micro step.
#[derive(Debug, Clone, Default)]
pub struct SharedMemory {
    inner: Rc<RefCell<FlatMemory>>,
}

impl SharedMemory {
    /// Creates a handle to a fresh zeroed memory image.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an existing image in a shared handle.
    #[must_use]
    pub fn from_flat(memory: FlatMemory) -> Self {
        Self {
            inner: Rc::new(RefCell::new(memory)),
        }
    }

    /// Copies the current contents out into an owned image.
    #[must_use]
    pub fn to_flat(&self) -> FlatMemory {
        self.inner.borrow().clone()
    }

    /// Returns `true` when both handles alias the same storage.
    #[must_use]
    pub fn same_store(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl MemoryBus for SharedMemory {
    fn read(&self, addr: u16) -> u8 {
        self.inner.borrow().read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.inner.borrow_mut().write(addr, value);
    }
}
