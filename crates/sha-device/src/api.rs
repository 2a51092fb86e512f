//! Public host-facing API contracts for driving the device model.

use crate::regs::{Register, START_ADDR};

/// Micro steps needed by the longest possible operation.
///
/// A 16-bit `len` spans at most 1024 blocks; each block costs three steps and
/// the digest write costs one more.
pub const DEFAULT_STEP_LIMIT: u32 = 3 * 1024 + 1;

/// Host bus command tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum Command {
    /// Idle bus cycle.
    #[default]
    NoOp = 0,
    /// Register read.
    Read = 1,
    /// Register write.
    Write = 2,
}

impl Command {
    /// Decodes a 2-bit bus command tag.
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::NoOp),
            1 => Some(Self::Read),
            2 => Some(Self::Write),
            _ => None,
        }
    }

    /// Returns the bus encoding of this command.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

/// One host bus transaction consumed by a macro step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BusTransaction {
    /// Command tag.
    pub command: Command,
    /// Target bus address.
    pub addr: u16,
    /// Write data; ignored for reads and no-ops.
    pub data: u32,
}

impl BusTransaction {
    /// Idle bus cycle.
    #[must_use]
    pub const fn noop() -> Self {
        Self {
            command: Command::NoOp,
            addr: 0,
            data: 0,
        }
    }

    /// Read of `addr`.
    #[must_use]
    pub const fn read(addr: u16) -> Self {
        Self {
            command: Command::Read,
            addr,
            data: 0,
        }
    }

    /// Write of `data` to `addr`.
    #[must_use]
    pub const fn write(addr: u16, data: u32) -> Self {
        Self {
            command: Command::Write,
            addr,
            data,
        }
    }

    /// Read of a named register.
    #[must_use]
    pub const fn read_register(register: Register) -> Self {
        Self::read(register.addr())
    }

    /// Write of `data` to a named register.
    #[must_use]
    pub const fn write_register(register: Register, data: u32) -> Self {
        Self::write(register.addr(), data)
    }

    /// The write that arms the pipeline.
    #[must_use]
    pub const fn start() -> Self {
        Self::write(START_ADDR, 1)
    }
}

/// When the device reinitializes its hash primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HashResetPolicy {
    /// Reset when a start command is accepted; each operation hashes only
    /// its own blocks.
    #[default]
    OnStart,
    /// Never reset; the running hash spans every operation since the device
    /// was created.
    Never,
}

/// Immutable configuration for a device instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DeviceConfig {
    /// Hash primitive lifetime across operations.
    pub hash_reset: HashResetPolicy,
}

/// Aggregated outcome of running micro steps until the pipeline is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Micro steps executed during this run call.
    pub micro_steps: u32,
}
