//! Host-visible register set and its fixed address map.

/// Register storage with width-masked accessors.
pub mod file;
/// Fixed register address map and decoder.
pub mod map;

pub use file::{HostWrite, RegisterFile};
pub use map::{
    decode_lane, decode_register, in_device_window, ByteLane, Register, RegisterAccess,
    RegisterDescriptor, DEVICE_WINDOW_END, DEVICE_WINDOW_START, LEN_ADDR, RD_ADDR_ADDR,
    REGISTER_MAP, START_ADDR, STATE_ADDR, WR_ADDR_ADDR,
};
