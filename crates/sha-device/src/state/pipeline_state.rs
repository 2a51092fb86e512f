/// Number of defined pipeline states.
pub const PIPELINE_STATE_COUNT: usize = 5;

/// Block-pipeline state exposed through the `state` register.
///
/// The discriminants are the values a host reads back from `state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum PipelineState {
    /// Waiting for a start command; host writes are accepted.
    #[default]
    Idle = 0,
    /// Gathering the next 64-byte block from memory.
    ReadBlock = 1,
    /// One-cycle latency stage.
    Compute1 = 2,
    /// Feeding the block to the hash primitive and latching the digest.
    Compute2 = 3,
    /// Storing the digest to memory.
    WriteDigest = 4,
}

impl PipelineState {
    /// Every state in encoding order.
    pub const ALL: [Self; PIPELINE_STATE_COUNT] = [
        Self::Idle,
        Self::ReadBlock,
        Self::Compute1,
        Self::Compute2,
        Self::WriteDigest,
    ];

    /// Returns the register encoding of this state.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a `state` register value.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Idle),
            1 => Some(Self::ReadBlock),
            2 => Some(Self::Compute1),
            3 => Some(Self::Compute2),
            4 => Some(Self::WriteDigest),
            _ => None,
        }
    }

    /// Returns `true` for [`PipelineState::Idle`].
    #[must_use]
    pub const fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Returns `true` while an operation is in flight.
    #[must_use]
    pub const fn is_busy(self) -> bool {
        !self.is_idle()
    }
}
