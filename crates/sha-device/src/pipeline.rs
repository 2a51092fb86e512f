//! Block-processing pipeline (one micro step per simulated clock).
//!
//! Each call performs the work of the current state and moves to the next:
//!
//! ```text
//! Idle -> (start) -> ReadBlock -> Compute1 -> Compute2 -+-> WriteDigest -> Idle
//!                        ^                              |
//!                        +------ bytes_read < len ------+
//! ```

use crate::buffers::{BlockBuffer, DigestBuffer};
use crate::hash::{HashPrimitive, BLOCK_BYTES};
use crate::memory::MemoryBus;
use crate::snapshot::DeviceSnapshot;
use crate::state::PipelineState;

#[allow(clippy::cast_possible_truncation)]
const BLOCK_STRIDE: u32 = BLOCK_BYTES as u32;

/// Advances `snapshot` by exactly one pipeline state, in place.
///
/// Returns the state the pipeline moved to. An idle pipeline stays idle and
/// touches nothing.
pub fn advance<M, H>(snapshot: &mut DeviceSnapshot<M>, hash: &mut H) -> PipelineState
where
    M: MemoryBus,
    H: HashPrimitive + ?Sized,
{
    let from = snapshot.state();
    let next = match from {
        PipelineState::Idle => return PipelineState::Idle,
        PipelineState::ReadBlock => read_block(snapshot),
        PipelineState::Compute1 => PipelineState::Compute2,
        PipelineState::Compute2 => compute(snapshot, hash),
        PipelineState::WriteDigest => write_digest(snapshot),
    };
    snapshot.set_state(next);
    tracing::trace!(?from, to = ?next, bytes_read = snapshot.bytes_read(), "pipeline step");
    next
}

/// Performs one pipeline step and returns the next snapshot.
#[must_use]
pub fn micro_step<M, H>(mut snapshot: DeviceSnapshot<M>, hash: &mut H) -> DeviceSnapshot<M>
where
    M: MemoryBus,
    H: HashPrimitive + ?Sized,
{
    advance(&mut snapshot, hash);
    snapshot
}

fn read_block<M: MemoryBus>(snapshot: &mut DeviceSnapshot<M>) -> PipelineState {
    let base = snapshot.rd_addr().wrapping_add(low_half(snapshot.bytes_read()));
    let block = BlockBuffer::gather(snapshot.memory(), base);
    snapshot.set_block_buffer(block);
    snapshot.set_bytes_read(snapshot.bytes_read().wrapping_add(BLOCK_STRIDE));
    PipelineState::Compute1
}

fn compute<M, H>(snapshot: &mut DeviceSnapshot<M>, hash: &mut H) -> PipelineState
where
    H: HashPrimitive + ?Sized,
{
    hash.update(&snapshot.block_buffer().message_bytes());
    snapshot.set_digest_buffer(DigestBuffer::from_digest(hash.digest()));
    if snapshot.bytes_read() < u32::from(snapshot.len()) {
        PipelineState::ReadBlock
    } else {
        PipelineState::WriteDigest
    }
}

fn write_digest<M: MemoryBus>(snapshot: &mut DeviceSnapshot<M>) -> PipelineState {
    let base = snapshot.wr_addr();
    let digest = *snapshot.digest_buffer();
    digest.scatter(snapshot.memory_mut(), base);
    tracing::debug!(
        wr_addr = base,
        bytes_read = snapshot.bytes_read(),
        digest = format_args!("{digest:x}"),
        "digest written"
    );
    PipelineState::Idle
}

// Memory offsets wrap at 16 bits even though the counter itself does not.
#[allow(clippy::cast_possible_truncation)]
const fn low_half(value: u32) -> u16 {
    value as u16
}
