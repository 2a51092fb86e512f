//! Complete device state threaded through every step function.
//!
//! A [`DeviceSnapshot`] owns the register file, the datapath buffers, the
//! block progress counter and the memory the pipeline reads from and writes
//! to. [`SnapshotImage`] is its flat, versioned persistence form.

use crate::buffers::{BlockBuffer, DigestBuffer};
use crate::error::SnapshotError;
use crate::hash::{BLOCK_BYTES, DIGEST_BYTES};
use crate::memory::{FlatMemory, MemoryBus, ADDRESS_SPACE_BYTES};
use crate::regs::RegisterFile;
use crate::state::PipelineState;

/// Snapshot schema version for persisted device state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema revision.
    #[default]
    V1 = 1,
}

impl SnapshotVersion {
    /// Converts wire value to known snapshot version.
    #[must_use]
    pub const fn from_u16(version: u16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }

    /// Returns the wire value of this version.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Full device state plus the memory it operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot<M> {
    regs: RegisterFile,
    bytes_read: u32,
    block_buffer: BlockBuffer,
    digest_buffer: DigestBuffer,
    memory: M,
}

impl<M: Default> Default for DeviceSnapshot<M> {
    fn default() -> Self {
        Self::new(M::default())
    }
}

#[allow(clippy::len_without_is_empty)]
impl<M> DeviceSnapshot<M> {
    /// Creates an idle snapshot with cleared registers and buffers.
    #[must_use]
    pub const fn new(memory: M) -> Self {
        Self {
            regs: RegisterFile::new(),
            bytes_read: 0,
            block_buffer: BlockBuffer::ZERO,
            digest_buffer: DigestBuffer::ZERO,
            memory,
        }
    }

    /// Register file view.
    #[must_use]
    pub const fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub(crate) const fn regs_mut(&mut self) -> &mut RegisterFile {
        &mut self.regs
    }

    /// Current pipeline state.
    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.regs.state()
    }

    pub(crate) const fn set_state(&mut self, state: PipelineState) {
        self.regs.set_state(state);
    }

    /// Current `rd_addr` register value.
    #[must_use]
    pub const fn rd_addr(&self) -> u16 {
        self.regs.rd_addr()
    }

    /// Current `wr_addr` register value.
    #[must_use]
    pub const fn wr_addr(&self) -> u16 {
        self.regs.wr_addr()
    }

    /// Current `len` register value.
    #[must_use]
    pub const fn len(&self) -> u16 {
        self.regs.len()
    }

    /// Bytes consumed by the pipeline since the last accepted start.
    #[must_use]
    pub const fn bytes_read(&self) -> u32 {
        self.bytes_read
    }

    pub(crate) const fn set_bytes_read(&mut self, bytes_read: u32) {
        self.bytes_read = bytes_read;
    }

    /// Most recently gathered block.
    #[must_use]
    pub const fn block_buffer(&self) -> &BlockBuffer {
        &self.block_buffer
    }

    pub(crate) const fn set_block_buffer(&mut self, block: BlockBuffer) {
        self.block_buffer = block;
    }

    /// Most recently latched digest.
    #[must_use]
    pub const fn digest_buffer(&self) -> &DigestBuffer {
        &self.digest_buffer
    }

    pub(crate) const fn set_digest_buffer(&mut self, digest: DigestBuffer) {
        self.digest_buffer = digest;
    }

    /// Memory seen by the pipeline.
    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    /// Mutable access to memory, for host-side loading between steps.
    pub const fn memory_mut(&mut self) -> &mut M {
        &mut self.memory
    }

    /// Consumes the snapshot and returns its memory.
    #[must_use]
    pub fn into_memory(self) -> M {
        self.memory
    }

    /// Swaps the memory backing while keeping all device state.
    #[must_use]
    pub fn map_memory<N>(self, f: impl FnOnce(M) -> N) -> DeviceSnapshot<N> {
        DeviceSnapshot {
            regs: self.regs,
            bytes_read: self.bytes_read,
            block_buffer: self.block_buffer,
            digest_buffer: self.digest_buffer,
            memory: f(self.memory),
        }
    }
}

impl<M: MemoryBus> DeviceSnapshot<M> {
    /// Exports the full state, including all 64 KiB of memory.
    #[must_use]
    pub fn to_image(&self) -> SnapshotImage {
        SnapshotImage {
            version: SnapshotVersion::V1.as_u16(),
            state: self.state().as_u8(),
            rd_addr: self.rd_addr(),
            wr_addr: self.wr_addr(),
            len: self.len(),
            bytes_read: self.bytes_read,
            block_buffer: self.block_buffer.to_le_bytes().to_vec(),
            digest_buffer: self.digest_buffer.to_le_bytes().to_vec(),
            memory: self.memory.dump(0, ADDRESS_SPACE_BYTES),
        }
    }

    /// Restores device state from `image` on top of an existing memory.
    ///
    /// The image's memory contents are copied into `memory`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the image fails validation; `memory`
    /// is not touched in that case.
    pub fn from_image_with(image: &SnapshotImage, mut memory: M) -> Result<Self, SnapshotError> {
        let parts = image.validate()?;
        memory.load(0, &image.memory);
        Ok(parts.with_memory(memory))
    }
}

impl DeviceSnapshot<FlatMemory> {
    /// Restores a snapshot backed by a fresh [`FlatMemory`].
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] when the image fails validation.
    pub fn from_image(image: &SnapshotImage) -> Result<Self, SnapshotError> {
        let parts = image.validate()?;
        let memory = FlatMemory::from_image(&image.memory).ok_or(
            SnapshotError::MemoryImageSize {
                expected: ADDRESS_SPACE_BYTES,
                actual: image.memory.len(),
            },
        )?;
        Ok(parts.with_memory(memory))
    }
}

/// Flat persistence form of a [`DeviceSnapshot`].
///
/// Buffers are stored as little-endian limbs and memory as a full 64 KiB
/// image starting at address zero.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct SnapshotImage {
    /// Wire value of [`SnapshotVersion`].
    pub version: u16,
    /// Pipeline state encoding.
    pub state: u8,
    /// `rd_addr` register.
    pub rd_addr: u16,
    /// `wr_addr` register.
    pub wr_addr: u16,
    /// `len` register.
    pub len: u16,
    /// Block progress counter.
    pub bytes_read: u32,
    /// Block buffer limbs, least-significant first.
    pub block_buffer: Vec<u8>,
    /// Digest buffer limbs, least-significant first.
    pub digest_buffer: Vec<u8>,
    /// Memory contents for addresses `0x0000..=0xFFFF`.
    pub memory: Vec<u8>,
}

struct ValidatedParts {
    regs: RegisterFile,
    bytes_read: u32,
    block_buffer: BlockBuffer,
    digest_buffer: DigestBuffer,
}

impl ValidatedParts {
    fn with_memory<M>(self, memory: M) -> DeviceSnapshot<M> {
        DeviceSnapshot {
            regs: self.regs,
            bytes_read: self.bytes_read,
            block_buffer: self.block_buffer,
            digest_buffer: self.digest_buffer,
            memory,
        }
    }
}

impl SnapshotImage {
    fn validate(&self) -> Result<ValidatedParts, SnapshotError> {
        SnapshotVersion::from_u16(self.version).ok_or(SnapshotError::UnsupportedVersion {
            version: self.version,
        })?;
        let state = PipelineState::from_u8(self.state)
            .ok_or(SnapshotError::InvalidState { value: self.state })?;
        let block: [u8; BLOCK_BYTES] = self.block_buffer.as_slice().try_into().map_err(|_| {
            SnapshotError::BufferLength {
                buffer: "block_buffer",
                expected: BLOCK_BYTES,
                actual: self.block_buffer.len(),
            }
        })?;
        let digest: [u8; DIGEST_BYTES] =
            self.digest_buffer.as_slice().try_into().map_err(|_| {
                SnapshotError::BufferLength {
                    buffer: "digest_buffer",
                    expected: DIGEST_BYTES,
                    actual: self.digest_buffer.len(),
                }
            })?;
        if self.memory.len() != ADDRESS_SPACE_BYTES {
            return Err(SnapshotError::MemoryImageSize {
                expected: ADDRESS_SPACE_BYTES,
                actual: self.memory.len(),
            });
        }

        Ok(ValidatedParts {
            regs: RegisterFile::from_parts(state, self.rd_addr, self.wr_addr, self.len),
            bytes_read: self.bytes_read,
            block_buffer: BlockBuffer::from_le_bytes(block),
            digest_buffer: DigestBuffer::from_digest(digest),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{DeviceSnapshot, SnapshotImage, SnapshotVersion};
    use crate::buffers::{BlockBuffer, DigestBuffer};
    use crate::error::SnapshotError;
    use crate::memory::{FlatMemory, MemoryBus, SharedMemory};
    use crate::state::PipelineState;

    fn busy_snapshot() -> DeviceSnapshot<FlatMemory> {
        let mut snapshot = DeviceSnapshot::new(FlatMemory::new());
        snapshot.regs_mut().set_rd_addr(0x0100);
        snapshot.regs_mut().set_wr_addr(0x0800);
        snapshot.regs_mut().set_len(200);
        snapshot.set_state(PipelineState::Compute1);
        snapshot.set_bytes_read(128);
        snapshot.set_block_buffer(BlockBuffer::from_le_bytes([0x11; 64]));
        snapshot.set_digest_buffer(DigestBuffer::from_digest([0x22; 20]));
        snapshot.memory_mut().load(0x0100, b"persisted bytes");
        snapshot
    }

    #[test]
    fn version_wire_value_roundtrips() {
        assert_eq!(
            SnapshotVersion::from_u16(SnapshotVersion::V1.as_u16()),
            Some(SnapshotVersion::V1)
        );
        assert_eq!(SnapshotVersion::from_u16(0), None);
    }

    #[test]
    fn new_snapshot_is_idle_and_cleared() {
        let snapshot: DeviceSnapshot<FlatMemory> = DeviceSnapshot::default();
        assert_eq!(snapshot.state(), PipelineState::Idle);
        assert_eq!(snapshot.bytes_read(), 0);
        assert_eq!(*snapshot.block_buffer(), BlockBuffer::ZERO);
        assert_eq!(*snapshot.digest_buffer(), DigestBuffer::ZERO);
    }

    #[test]
    fn image_restores_identical_snapshot() {
        let snapshot = busy_snapshot();
        let restored = DeviceSnapshot::from_image(&snapshot.to_image());
        assert_eq!(restored, Ok(snapshot));
    }

    #[test]
    fn image_restores_onto_shared_memory() {
        let snapshot = busy_snapshot();
        let shared = SharedMemory::new();
        let restored = DeviceSnapshot::from_image_with(&snapshot.to_image(), shared.clone())
            .map(|restored| restored.state());

        assert_eq!(restored, Ok(PipelineState::Compute1));
        assert_eq!(shared.dump(0x0100, 9), b"persisted".to_vec());
    }

    #[test]
    fn validation_rejects_malformed_images() {
        let image = busy_snapshot().to_image();

        let wrong_version = SnapshotImage {
            version: 7,
            ..image.clone()
        };
        assert_eq!(
            DeviceSnapshot::from_image(&wrong_version),
            Err(SnapshotError::UnsupportedVersion { version: 7 })
        );

        let wrong_state = SnapshotImage {
            state: 5,
            ..image.clone()
        };
        assert_eq!(
            DeviceSnapshot::from_image(&wrong_state),
            Err(SnapshotError::InvalidState { value: 5 })
        );

        let short_digest = SnapshotImage {
            digest_buffer: vec![0; 19],
            ..image.clone()
        };
        assert_eq!(
            DeviceSnapshot::from_image(&short_digest),
            Err(SnapshotError::BufferLength {
                buffer: "digest_buffer",
                expected: 20,
                actual: 19,
            })
        );

        let short_memory = SnapshotImage {
            memory: vec![0; 16],
            ..image
        };
        assert_eq!(
            DeviceSnapshot::from_image(&short_memory),
            Err(SnapshotError::MemoryImageSize {
                expected: 65_536,
                actual: 16,
            })
        );
    }

    #[test]
    fn failed_restore_leaves_target_memory_untouched() {
        let mut image = busy_snapshot().to_image();
        image.block_buffer.pop();
        let shared = SharedMemory::new();

        let result = DeviceSnapshot::from_image_with(&image, shared.clone());

        assert!(result.is_err());
        assert_eq!(shared.read(0x0100), 0);
    }

    #[test]
    fn map_memory_keeps_device_state() {
        let snapshot = busy_snapshot();
        let shared = snapshot.clone().map_memory(SharedMemory::from_flat);

        assert_eq!(shared.state(), snapshot.state());
        assert_eq!(shared.bytes_read(), 128);
        assert_eq!(shared.memory().read(0x0100), b'p');
    }
}
