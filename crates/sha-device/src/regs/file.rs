use super::map::{ByteLane, Register, RegisterAccess};
use crate::state::PipelineState;

/// Outcome of a host write routed into the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostWrite {
    /// The masked value was stored.
    Stored(u16),
    /// The register is not host-writable; nothing changed.
    Ignored,
}

/// Host-visible register set of one device instance.
///
/// Every setter masks its input to the register width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    state: PipelineState,
    rd_addr: u16,
    wr_addr: u16,
    len: u16,
}

#[allow(clippy::len_without_is_empty)]
impl RegisterFile {
    /// Creates an idle register file with every pointer cleared.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: PipelineState::Idle,
            rd_addr: 0,
            wr_addr: 0,
            len: 0,
        }
    }

    pub(crate) const fn from_parts(
        state: PipelineState,
        rd_addr: u16,
        wr_addr: u16,
        len: u16,
    ) -> Self {
        Self {
            state,
            rd_addr,
            wr_addr,
            len,
        }
    }

    /// Reads the pipeline state.
    #[must_use]
    pub const fn state(&self) -> PipelineState {
        self.state
    }

    /// Device-owned update path for the pipeline state.
    pub(crate) const fn set_state(&mut self, state: PipelineState) {
        self.state = state;
    }

    /// Reads the `rd_addr` register.
    #[must_use]
    pub const fn rd_addr(&self) -> u16 {
        self.rd_addr
    }

    /// Writes the `rd_addr` register, masked to 16 bits.
    pub const fn set_rd_addr(&mut self, value: u32) {
        self.rd_addr = Register::RdAddr.mask(value);
    }

    /// Reads the `wr_addr` register.
    #[must_use]
    pub const fn wr_addr(&self) -> u16 {
        self.wr_addr
    }

    /// Writes the `wr_addr` register, masked to 16 bits.
    pub const fn set_wr_addr(&mut self, value: u32) {
        self.wr_addr = Register::WrAddr.mask(value);
    }

    /// Reads the `len` register.
    #[must_use]
    pub const fn len(&self) -> u16 {
        self.len
    }

    /// Writes the `len` register, masked to 16 bits.
    pub const fn set_len(&mut self, value: u32) {
        self.len = Register::Len.mask(value);
    }

    /// Returns the value a host read of `register` observes.
    ///
    /// The write-only `start` trigger always reads back as zero.
    #[must_use]
    pub const fn read(&self, register: Register) -> u16 {
        match register {
            Register::Start => 0,
            Register::State => self.state.as_u8() as u16,
            Register::RdAddr => self.rd_addr,
            Register::WrAddr => self.wr_addr,
            Register::Len => self.len,
        }
    }

    /// Stores a host write into a read-write register.
    ///
    /// Triggers and read-only registers are left untouched. Busy-state
    /// filtering is the command decoder's job, not the register file's.
    pub const fn host_write(&mut self, register: Register, value: u32) -> HostWrite {
        match register.access() {
            RegisterAccess::WriteTrigger | RegisterAccess::ReadOnly => HostWrite::Ignored,
            RegisterAccess::ReadWrite => {
                match register {
                    Register::RdAddr => self.set_rd_addr(value),
                    Register::WrAddr => self.set_wr_addr(value),
                    Register::Len => self.set_len(value),
                    Register::Start | Register::State => {}
                }
                HostWrite::Stored(register.mask(value))
            }
        }
    }

    /// Returns the value a host read observes through one byte lane.
    #[must_use]
    pub const fn read_lane(&self, register: Register, lane: ByteLane) -> u16 {
        let value = self.read(register);
        match lane {
            ByteLane::Full => value,
            ByteLane::High => value >> 8,
        }
    }

    /// Stores a host write arriving through one byte lane.
    ///
    /// A high-lane write replaces bits 15:8 with the low byte of `value`
    /// and keeps bits 7:0. [`HostWrite::Stored`] carries the whole
    /// register value after the merge.
    pub const fn host_write_lane(
        &mut self,
        register: Register,
        lane: ByteLane,
        value: u32,
    ) -> HostWrite {
        match lane {
            ByteLane::Full => self.host_write(register, value),
            ByteLane::High => {
                let low = (self.read(register) & 0x00FF) as u32;
                self.host_write(register, ((value & 0xFF) << 8) | low)
            }
        }
    }
}
