//! Host command decoder (one macro step per bus transaction).
//!
//! The decoder only touches the register file and the block progress
//! counter. It never reads memory or drives the hash primitive; accepting a
//! start command merely arms the pipeline.

use crate::api::{BusTransaction, Command};
use crate::regs::{decode_lane, HostWrite, Register};
use crate::snapshot::DeviceSnapshot;
use crate::state::PipelineState;

/// Value written to `start` that arms the pipeline.
pub const START_TRIGGER: u32 = 1;

/// What a transaction did to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionEffect {
    /// Nothing changed: a no-op, a read, or a write the register ignores.
    None,
    /// A read-write register took the masked value.
    Stored {
        /// Register written.
        register: Register,
        /// Whole register value after masking and any byte-lane merge.
        value: u16,
    },
    /// A start command was accepted and the pipeline is now reading.
    Started,
    /// The write arrived while busy and was discarded.
    Dropped,
    /// The address does not decode to a device register.
    Unmapped,
}

/// Result of one macro step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MacroOutcome {
    /// Data returned on the bus; zero for anything but a mapped read.
    pub data: u16,
    /// Device-side effect of the transaction.
    pub effect: TransactionEffect,
}

impl MacroOutcome {
    const fn quiet(data: u16) -> Self {
        Self {
            data,
            effect: TransactionEffect::None,
        }
    }

    const fn effect(effect: TransactionEffect) -> Self {
        Self { data: 0, effect }
    }
}

/// Applies one host transaction to `snapshot` in place.
pub fn apply_transaction<M>(
    snapshot: &mut DeviceSnapshot<M>,
    txn: BusTransaction,
) -> MacroOutcome {
    match txn.command {
        Command::NoOp => MacroOutcome::quiet(0),
        Command::Read => read(snapshot, txn.addr),
        Command::Write => write(snapshot, txn.addr, txn.data),
    }
}

/// Consumes one host transaction and returns the next snapshot with the
/// bus read data.
#[must_use]
pub fn macro_step<M>(
    mut snapshot: DeviceSnapshot<M>,
    txn: BusTransaction,
) -> (DeviceSnapshot<M>, u16) {
    let outcome = apply_transaction(&mut snapshot, txn);
    (snapshot, outcome.data)
}

fn read<M>(snapshot: &DeviceSnapshot<M>, addr: u16) -> MacroOutcome {
    decode_lane(addr).map_or_else(
        || {
            tracing::trace!(addr = format_args!("{addr:#06x}"), "unmapped read");
            MacroOutcome::effect(TransactionEffect::Unmapped)
        },
        |(register, lane)| MacroOutcome::quiet(snapshot.regs().read_lane(register, lane)),
    )
}

fn write<M>(snapshot: &mut DeviceSnapshot<M>, addr: u16, data: u32) -> MacroOutcome {
    let state = snapshot.state();
    if state.is_busy() {
        tracing::trace!(
            addr = format_args!("{addr:#06x}"),
            data,
            ?state,
            "write dropped while busy"
        );
        return MacroOutcome::effect(TransactionEffect::Dropped);
    }

    let Some((register, lane)) = decode_lane(addr) else {
        tracing::trace!(addr = format_args!("{addr:#06x}"), data, "unmapped write");
        return MacroOutcome::effect(TransactionEffect::Unmapped);
    };

    if register == Register::Start {
        if data != START_TRIGGER {
            return MacroOutcome::quiet(0);
        }
        snapshot.set_state(PipelineState::ReadBlock);
        snapshot.set_bytes_read(0);
        tracing::debug!(
            rd_addr = snapshot.rd_addr(),
            wr_addr = snapshot.wr_addr(),
            len = snapshot.len(),
            "start accepted"
        );
        return MacroOutcome::effect(TransactionEffect::Started);
    }

    match snapshot.regs_mut().host_write_lane(register, lane, data) {
        HostWrite::Stored(value) => {
            MacroOutcome::effect(TransactionEffect::Stored { register, value })
        }
        HostWrite::Ignored => MacroOutcome::quiet(0),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{apply_transaction, macro_step, TransactionEffect};
    use crate::api::BusTransaction;
    use crate::memory::FlatMemory;
    use crate::regs::{Register, LEN_ADDR, RD_ADDR_ADDR, STATE_ADDR, WR_ADDR_ADDR};
    use crate::snapshot::DeviceSnapshot;
    use crate::state::PipelineState;

    fn idle() -> DeviceSnapshot<FlatMemory> {
        DeviceSnapshot::new(FlatMemory::new())
    }

    fn busy(state: PipelineState) -> DeviceSnapshot<FlatMemory> {
        let mut snapshot = idle();
        snapshot.regs_mut().set_len(64);
        snapshot.set_state(state);
        snapshot
    }

    #[test]
    fn write_then_read_len_returns_written_value() {
        let (snapshot, data) = macro_step(idle(), BusTransaction::write(LEN_ADDR, 128));
        assert_eq!(data, 0);
        assert_eq!(snapshot.len(), 128);

        let (_, data) = macro_step(snapshot, BusTransaction::read(LEN_ADDR));
        assert_eq!(data, 128);
    }

    #[test]
    fn noop_changes_nothing() {
        let mut snapshot = idle();
        let outcome = apply_transaction(&mut snapshot, BusTransaction::noop());
        assert_eq!(outcome.data, 0);
        assert_eq!(outcome.effect, TransactionEffect::None);
        assert_eq!(snapshot, idle());
    }

    #[test]
    fn start_trigger_arms_pipeline_and_clears_progress() {
        let mut snapshot = idle();
        snapshot.set_bytes_read(640);

        let outcome = apply_transaction(&mut snapshot, BusTransaction::start());

        assert_eq!(outcome.effect, TransactionEffect::Started);
        assert_eq!(snapshot.state(), PipelineState::ReadBlock);
        assert_eq!(snapshot.bytes_read(), 0);
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(0x101)]
    fn other_start_values_are_ignored(#[case] data: u32) {
        let mut snapshot = idle();
        let outcome =
            apply_transaction(&mut snapshot, BusTransaction::write_register(Register::Start, data));

        assert_eq!(outcome.effect, TransactionEffect::None);
        assert_eq!(snapshot, idle());
    }

    #[rstest]
    #[case(PipelineState::ReadBlock)]
    #[case(PipelineState::Compute1)]
    #[case(PipelineState::Compute2)]
    #[case(PipelineState::WriteDigest)]
    fn busy_device_drops_writes(#[case] state: PipelineState) {
        let mut snapshot = busy(state);
        let before = snapshot.clone();

        for txn in [
            BusTransaction::write(LEN_ADDR, 4096),
            BusTransaction::write_register(Register::RdAddr, 0x1234),
            BusTransaction::start(),
        ] {
            let outcome = apply_transaction(&mut snapshot, txn);
            assert_eq!(outcome.effect, TransactionEffect::Dropped);
        }
        assert_eq!(snapshot, before);
    }

    #[test]
    fn reads_are_served_while_busy() {
        let mut snapshot = busy(PipelineState::Compute2);
        let outcome = apply_transaction(&mut snapshot, BusTransaction::read(STATE_ADDR));
        assert_eq!(outcome.data, 3);
        let outcome = apply_transaction(&mut snapshot, BusTransaction::read(LEN_ADDR));
        assert_eq!(outcome.data, 64);
    }

    #[test]
    fn host_cannot_write_state() {
        let mut snapshot = idle();
        let outcome = apply_transaction(&mut snapshot, BusTransaction::write(STATE_ADDR, 4));
        assert_eq!(outcome.effect, TransactionEffect::None);
        assert_eq!(snapshot.state(), PipelineState::Idle);
    }

    #[rstest]
    #[case(0x0000)]
    #[case(0xFDFF)]
    #[case(0xFE08)]
    #[case(0xFE0F)]
    #[case(0xFFFF)]
    fn unmapped_addresses_read_zero_and_ignore_writes(#[case] addr: u16) {
        let mut snapshot = idle();
        snapshot.regs_mut().set_len(77);
        let before = snapshot.clone();

        let read = apply_transaction(&mut snapshot, BusTransaction::read(addr));
        let write = apply_transaction(&mut snapshot, BusTransaction::write(addr, 0xFFFF));

        assert_eq!(read.data, 0);
        assert_eq!(read.effect, TransactionEffect::Unmapped);
        assert_eq!(write.effect, TransactionEffect::Unmapped);
        assert_eq!(snapshot, before);
    }

    #[test]
    fn stored_effect_reports_masked_value() {
        let mut snapshot = idle();
        let outcome = apply_transaction(
            &mut snapshot,
            BusTransaction::write_register(Register::WrAddr, 0x0003_0102),
        );
        assert_eq!(
            outcome.effect,
            TransactionEffect::Stored {
                register: Register::WrAddr,
                value: 0x0102,
            }
        );
    }

    #[test]
    fn byte_lane_writes_assemble_rd_addr() {
        let mut snapshot = idle();
        apply_transaction(&mut snapshot, BusTransaction::write(RD_ADDR_ADDR, 0x34));
        let outcome =
            apply_transaction(&mut snapshot, BusTransaction::write(RD_ADDR_ADDR + 1, 0x12));

        assert_eq!(
            outcome.effect,
            TransactionEffect::Stored {
                register: Register::RdAddr,
                value: 0x1234,
            }
        );
        assert_eq!(snapshot.rd_addr(), 0x1234);
        let high = apply_transaction(&mut snapshot, BusTransaction::read(RD_ADDR_ADDR + 1));
        assert_eq!(high.data, 0x12);
        let full = apply_transaction(&mut snapshot, BusTransaction::read(RD_ADDR_ADDR));
        assert_eq!(full.data, 0x1234);
    }

    #[rstest]
    #[case(RD_ADDR_ADDR + 1, Register::RdAddr)]
    #[case(WR_ADDR_ADDR + 1, Register::WrAddr)]
    #[case(LEN_ADDR + 1, Register::Len)]
    fn high_lane_write_keeps_low_byte(#[case] addr: u16, #[case] register: Register) {
        let mut snapshot = idle();
        apply_transaction(&mut snapshot, BusTransaction::write_register(register, 0xABCD));

        apply_transaction(&mut snapshot, BusTransaction::write(addr, 0x0177));

        let full = apply_transaction(&mut snapshot, BusTransaction::read_register(register));
        assert_eq!(full.data, 0x77CD);
        let high = apply_transaction(&mut snapshot, BusTransaction::read(addr));
        assert_eq!(high.data, 0x77);
    }

    #[test]
    fn busy_device_drops_byte_lane_writes() {
        let mut snapshot = busy(PipelineState::Compute1);
        let before = snapshot.clone();

        let outcome =
            apply_transaction(&mut snapshot, BusTransaction::write(LEN_ADDR + 1, 0x10));

        assert_eq!(outcome.effect, TransactionEffect::Dropped);
        assert_eq!(snapshot, before);
        let high = apply_transaction(&mut snapshot, BusTransaction::read(LEN_ADDR + 1));
        assert_eq!(high.data, 0);
    }
}
