//! Device instance owning the hash primitive and configuration.
//!
//! All mutable device state lives in the [`DeviceSnapshot`] passed in and
//! out of each call; `ShaDevice` holds only what outlives a snapshot. Any
//! number of instances may coexist, including over one [`SharedMemory`].
//!
//! [`SharedMemory`]: crate::memory::SharedMemory

use crate::api::{BusTransaction, DeviceConfig, HashResetPolicy, RunOutcome, DEFAULT_STEP_LIMIT};
use crate::decoder::{apply_transaction, TransactionEffect};
use crate::error::RunError;
use crate::hash::{HashPrimitive, Sha1Primitive};
use crate::memory::MemoryBus;
use crate::pipeline::advance;
use crate::regs::Register;
use crate::snapshot::DeviceSnapshot;

/// One SHA coprocessor instance.
#[derive(Debug, Clone, Default)]
pub struct ShaDevice<H = Sha1Primitive> {
    hash: H,
    config: DeviceConfig,
}

impl ShaDevice<Sha1Primitive> {
    /// Creates a device backed by the production SHA-1 primitive.
    #[must_use]
    pub fn sha1(config: DeviceConfig) -> Self {
        Self::with_hash(Sha1Primitive::new(), config)
    }
}

impl<H: HashPrimitive> ShaDevice<H> {
    /// Creates a device around an explicit hash primitive.
    #[must_use]
    pub const fn with_hash(hash: H, config: DeviceConfig) -> Self {
        Self { hash, config }
    }

    /// Returns the device configuration.
    #[must_use]
    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the hash primitive.
    #[must_use]
    pub const fn hash(&self) -> &H {
        &self.hash
    }

    /// Returns the hash primitive mutably.
    pub const fn hash_mut(&mut self) -> &mut H {
        &mut self.hash
    }

    /// Consumes the device and returns its hash primitive.
    #[must_use]
    pub fn into_hash(self) -> H {
        self.hash
    }

    /// Applies one host transaction in place and returns the bus read data.
    pub fn execute<M>(&mut self, snapshot: &mut DeviceSnapshot<M>, txn: BusTransaction) -> u16 {
        let outcome = apply_transaction(snapshot, txn);
        if outcome.effect == TransactionEffect::Started
            && self.config.hash_reset == HashResetPolicy::OnStart
        {
            self.hash.reset();
        }
        outcome.data
    }

    /// Advances the pipeline of `snapshot` by one state in place.
    pub fn step<M: MemoryBus>(&mut self, snapshot: &mut DeviceSnapshot<M>) {
        advance(snapshot, &mut self.hash);
    }

    /// Macro step: consumes one host transaction.
    #[must_use]
    pub fn macro_step<M>(
        &mut self,
        mut snapshot: DeviceSnapshot<M>,
        txn: BusTransaction,
    ) -> (DeviceSnapshot<M>, u16) {
        let data = self.execute(&mut snapshot, txn);
        (snapshot, data)
    }

    /// Micro step: advances the pipeline by exactly one state.
    #[must_use]
    pub fn micro_step<M: MemoryBus>(
        &mut self,
        mut snapshot: DeviceSnapshot<M>,
    ) -> DeviceSnapshot<M> {
        self.step(&mut snapshot);
        snapshot
    }

    /// Steps the pipeline until it reports `Idle`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::StepLimitExceeded`] when the pipeline is still busy
    /// after `step_limit` micro steps. The snapshot keeps every step taken.
    pub fn run_until_idle<M: MemoryBus>(
        &mut self,
        snapshot: &mut DeviceSnapshot<M>,
        step_limit: u32,
    ) -> Result<RunOutcome, RunError> {
        let mut micro_steps = 0;
        while snapshot.state().is_busy() {
            if micro_steps == step_limit {
                return Err(RunError::StepLimitExceeded { limit: step_limit });
            }
            self.step(snapshot);
            micro_steps += 1;
        }
        Ok(RunOutcome { micro_steps })
    }

    /// Programs a whole operation the way a host would and runs it to
    /// completion.
    ///
    /// Writes `rd_addr`, `wr_addr` and `len`, issues the start trigger and
    /// steps until idle. The digest is then in memory at `wr_addr`.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Busy`] without touching anything when an
    /// operation is already in flight, or [`RunError::StepLimitExceeded`]
    /// from the run.
    pub fn hash_region<M: MemoryBus>(
        &mut self,
        snapshot: &mut DeviceSnapshot<M>,
        rd_addr: u16,
        wr_addr: u16,
        len: u16,
    ) -> Result<RunOutcome, RunError> {
        let state = snapshot.state();
        if state.is_busy() {
            return Err(RunError::Busy { state });
        }
        for txn in [
            BusTransaction::write_register(Register::RdAddr, u32::from(rd_addr)),
            BusTransaction::write_register(Register::WrAddr, u32::from(wr_addr)),
            BusTransaction::write_register(Register::Len, u32::from(len)),
            BusTransaction::start(),
        ] {
            self.execute(snapshot, txn);
        }
        self.run_until_idle(snapshot, DEFAULT_STEP_LIMIT)
    }
}
