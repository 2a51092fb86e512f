//! Step-accurate functional model of a memory-mapped SHA-1 coprocessor.
//!
//! A host drives the device through five registers at `0xFE00..=0xFE07`
//! (see [`regs::map`]). Each bus transaction is one macro step
//! ([`decoder::macro_step`]); each simulated clock is one micro step of the
//! block pipeline ([`pipeline::micro_step`]). Both are functions from a
//! [`DeviceSnapshot`] to the next one, and [`ShaDevice`] pairs them with the
//! hash primitive that survives between snapshots.

/// External memory contract and backing stores.
pub mod memory;
pub use memory::{new_address_space, FlatMemory, MemoryBus, SharedMemory, ADDRESS_SPACE_BYTES};

/// Host-visible registers and their address map.
pub mod regs;
pub use regs::{
    decode_lane, decode_register, ByteLane, HostWrite, Register, RegisterAccess,
    RegisterDescriptor, RegisterFile, LEN_ADDR, RD_ADDR_ADDR, REGISTER_MAP, START_ADDR,
    STATE_ADDR, WR_ADDR_ADDR,
};

/// Pipeline state enumeration.
pub mod state;
pub use state::PipelineState;

/// Block and digest datapath buffers.
pub mod buffers;
pub use buffers::{BlockBuffer, DigestBuffer};

/// Hash primitive boundary.
pub mod hash;
pub use hash::{HashPrimitive, Sha1Primitive, BLOCK_BYTES, DIGEST_BYTES};

/// Public host-facing API types.
pub mod api;
pub use api::{
    BusTransaction, Command, DeviceConfig, HashResetPolicy, RunOutcome, DEFAULT_STEP_LIMIT,
};

/// Error types for persistence and batched driving.
pub mod error;
pub use error::{RunError, SnapshotError};

/// Device snapshot and its persistence image.
pub mod snapshot;
pub use snapshot::{DeviceSnapshot, SnapshotImage, SnapshotVersion};

/// Host command decoder.
pub mod decoder;
pub use decoder::{apply_transaction, macro_step, MacroOutcome, TransactionEffect};

/// Block-processing pipeline.
pub mod pipeline;
pub use pipeline::{advance, micro_step};

/// Device instance and batched drivers.
pub mod device;
pub use device::ShaDevice;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use serde_json as _;
