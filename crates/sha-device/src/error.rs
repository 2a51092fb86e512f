use thiserror::Error;

use crate::state::PipelineState;

/// Rejections raised while importing a persisted snapshot image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum SnapshotError {
    /// The image was written by an unknown schema revision.
    #[error("unsupported snapshot version {version}")]
    UnsupportedVersion {
        /// Version found in the image.
        version: u16,
    },
    /// The stored `state` value is not a pipeline state encoding.
    #[error("invalid pipeline state encoding {value}")]
    InvalidState {
        /// Raw value found in the image.
        value: u8,
    },
    /// A datapath buffer has the wrong number of bytes.
    #[error("{buffer} holds {actual} bytes, expected {expected}")]
    BufferLength {
        /// Name of the offending buffer.
        buffer: &'static str,
        /// Required length in bytes.
        expected: usize,
        /// Length found in the image.
        actual: usize,
    },
    /// The memory image does not cover the full 16-bit address space.
    #[error("memory image holds {actual} bytes, expected {expected}")]
    MemoryImageSize {
        /// Required length in bytes.
        expected: usize,
        /// Length found in the image.
        actual: usize,
    },
}

/// Failures of the batched drivers layered over the step functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum RunError {
    /// The pipeline was still busy after the step budget was spent.
    #[error("pipeline still busy after {limit} micro steps")]
    StepLimitExceeded {
        /// Step budget that was exhausted.
        limit: u32,
    },
    /// An operation was requested while another one is in flight.
    #[error("device busy in state {state:?}")]
    Busy {
        /// State observed when the request was made.
        state: PipelineState,
    },
}
