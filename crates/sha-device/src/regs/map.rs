//! Fixed host-visible register map and address decoding.

/// Address of the `start` trigger register.
pub const START_ADDR: u16 = 0xFE00;
/// Address of the `state` status register.
pub const STATE_ADDR: u16 = 0xFE01;
/// Address of the `rd_addr` source-pointer register.
pub const RD_ADDR_ADDR: u16 = 0xFE02;
/// Address of the `wr_addr` destination-pointer register.
pub const WR_ADDR_ADDR: u16 = 0xFE04;
/// Address of the `len` byte-count register.
pub const LEN_ADDR: u16 = 0xFE06;
/// Inclusive start of the address window decoded by the device.
pub const DEVICE_WINDOW_START: u16 = 0xFE00;
/// Inclusive end of the address window decoded by the device.
pub const DEVICE_WINDOW_END: u16 = 0xFE0F;

/// Host-visible register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Register {
    /// Start trigger (`0xFE00`, 1 byte).
    Start,
    /// Pipeline state (`0xFE01`, 1 byte).
    State,
    /// Source address (`0xFE02`, 2 bytes).
    RdAddr,
    /// Digest destination address (`0xFE04`, 2 bytes).
    WrAddr,
    /// Operation length in bytes (`0xFE06`, 2 bytes).
    Len,
}

/// Host access class of a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegisterAccess {
    /// Writes act as a trigger; nothing is stored and reads return zero.
    WriteTrigger,
    /// Readable by the host, written only by the device.
    ReadOnly,
    /// Readable and writable by the host while the device is idle.
    ReadWrite,
}

/// Canonical descriptor for one register in the address map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterDescriptor {
    /// Register identity.
    pub register: Register,
    /// Bus address.
    pub addr: u16,
    /// Width in bytes (1 or 2).
    pub width_bytes: u8,
    /// Host access class.
    pub access: RegisterAccess,
}

impl Register {
    /// Every register in ascending address order.
    pub const ALL: [Self; 5] = [
        Self::Start,
        Self::State,
        Self::RdAddr,
        Self::WrAddr,
        Self::Len,
    ];

    /// Returns the bus address of this register.
    #[must_use]
    pub const fn addr(self) -> u16 {
        match self {
            Self::Start => START_ADDR,
            Self::State => STATE_ADDR,
            Self::RdAddr => RD_ADDR_ADDR,
            Self::WrAddr => WR_ADDR_ADDR,
            Self::Len => LEN_ADDR,
        }
    }

    /// Returns the register's name in the host documentation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::State => "state",
            Self::RdAddr => "rd_addr",
            Self::WrAddr => "wr_addr",
            Self::Len => "len",
        }
    }

    /// Returns the register width in bytes.
    #[must_use]
    pub const fn width_bytes(self) -> u8 {
        match self {
            Self::Start | Self::State => 1,
            Self::RdAddr | Self::WrAddr | Self::Len => 2,
        }
    }

    /// Returns the host access class.
    #[must_use]
    pub const fn access(self) -> RegisterAccess {
        match self {
            Self::Start => RegisterAccess::WriteTrigger,
            Self::State => RegisterAccess::ReadOnly,
            Self::RdAddr | Self::WrAddr | Self::Len => RegisterAccess::ReadWrite,
        }
    }

    /// Returns the bit mask covering the register width.
    #[must_use]
    pub const fn width_mask(self) -> u32 {
        (1_u32 << (8 * self.width_bytes() as u32)) - 1
    }

    /// Masks an incoming bus value to the register width.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn mask(self, value: u32) -> u16 {
        (value & self.width_mask()) as u16
    }

    /// Returns the canonical descriptor for this register.
    #[must_use]
    pub const fn descriptor(self) -> RegisterDescriptor {
        RegisterDescriptor {
            register: self,
            addr: self.addr(),
            width_bytes: self.width_bytes(),
            access: self.access(),
        }
    }
}

/// Canonical register layout in ascending address order.
pub const REGISTER_MAP: [RegisterDescriptor; 5] = [
    Register::Start.descriptor(),
    Register::State.descriptor(),
    Register::RdAddr.descriptor(),
    Register::WrAddr.descriptor(),
    Register::Len.descriptor(),
];

const _: () = assert_register_layout();

const fn assert_register_layout() {
    let mut index = 0;
    while index < REGISTER_MAP.len() {
        let descriptor = REGISTER_MAP[index];
        assert!(
            descriptor.width_bytes == 1 || descriptor.width_bytes == 2,
            "registers are one or two bytes wide"
        );
        assert!(
            descriptor.addr >= DEVICE_WINDOW_START
                && descriptor.addr + descriptor.width_bytes as u16 - 1 <= DEVICE_WINDOW_END,
            "registers must sit inside the device window"
        );

        if index > 0 {
            let previous = REGISTER_MAP[index - 1];
            assert!(
                previous.addr + previous.width_bytes as u16 == descriptor.addr,
                "registers must be packed back to back"
            );
        }

        index += 1;
    }
}

/// Part of a register selected by a bus address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ByteLane {
    /// The register's base address: the whole masked value.
    Full,
    /// Base address plus one on a two-byte register: bits 15:8 only.
    High,
}

/// Decodes a bus address into the register and byte lane it selects.
#[must_use]
pub const fn decode_lane(addr: u16) -> Option<(Register, ByteLane)> {
    if !in_device_window(addr) {
        return None;
    }

    let mut index = 0;
    while index < REGISTER_MAP.len() {
        let descriptor = REGISTER_MAP[index];
        if addr == descriptor.addr {
            return Some((descriptor.register, ByteLane::Full));
        }
        if descriptor.width_bytes == 2 && addr == descriptor.addr + 1 {
            return Some((descriptor.register, ByteLane::High));
        }
        index += 1;
    }
    None
}

/// Decodes a bus address into the register it touches, whichever lane.
#[must_use]
pub const fn decode_register(addr: u16) -> Option<Register> {
    match decode_lane(addr) {
        Some((register, _)) => Some(register),
        None => None,
    }
}

/// Returns `true` when `addr` falls inside the device's decode window.
#[must_use]
pub const fn in_device_window(addr: u16) -> bool {
    addr >= DEVICE_WINDOW_START && addr <= DEVICE_WINDOW_END
}
