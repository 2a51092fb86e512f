//! Command-line host harness for the SHA-1 coprocessor model.
//!
//! Programs the device through bus transactions the way firmware would:
//! configure `rd_addr`, `wr_addr` and `len`, write the start trigger, then
//! poll `state` between clocks until the pipeline reports idle.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, bail, ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use sha1::{Digest, Sha1};
use sha_device::{
    BusTransaction, DeviceConfig, DeviceSnapshot, FlatMemory, MemoryBus, PipelineState, Register,
    ShaDevice, SnapshotImage, BLOCK_BYTES, DEFAULT_STEP_LIMIT, DIGEST_BYTES, REGISTER_MAP,
};
#[cfg(test)]
use tempfile as _;
use tracing_subscriber::EnvFilter;

#[allow(clippy::cast_possible_truncation)]
const DIGEST_SPAN: u32 = DIGEST_BYTES as u32;
#[allow(clippy::cast_possible_truncation)]
const BLOCK_STRIDE: u32 = BLOCK_BYTES as u32;

#[derive(Parser, Debug)]
#[command(
    name = "sha-sim",
    version,
    about = "Drive the SHA-1 coprocessor model from the command line",
    long_about = "Drive the SHA-1 coprocessor model from the command line.\n\nExamples:\n  sha-sim hash message.bin\n  sha-sim hash message.bin --rd-addr 0x1000 --wr-addr 0xF000 --verify\n  sha-sim hash message.bin --armed-out armed.json\n  sha-sim resume armed.json\n  sha-sim regs armed.json"
)]
struct Cli {
    /// Log every pipeline transition and dropped bus write to stderr.
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash a file through the device and print the digest.
    Hash(HashArgs),

    /// Run a saved snapshot image to idle and print the digest at its `wr_addr`.
    Resume {
        /// Snapshot image (JSON).
        snapshot: PathBuf,
    },

    /// Print the registers of a saved snapshot image.
    Regs {
        /// Snapshot image (JSON).
        snapshot: PathBuf,
    },
}

#[derive(Args, Debug, PartialEq, Eq)]
struct HashArgs {
    /// Input file, at most 65535 bytes.
    file: PathBuf,

    /// Memory address the file is loaded at and read from.
    #[arg(long, value_parser = parse_addr, default_value = "0x0000")]
    rd_addr: u16,

    /// Memory address the digest is written to.
    #[arg(long, value_parser = parse_addr, default_value = "0xFD00")]
    wr_addr: u16,

    /// Write the final snapshot image here.
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Write the snapshot image taken right after the start trigger here.
    #[arg(long)]
    armed_out: Option<PathBuf>,

    /// Check the device digest against SHA-1 of the blocks it read.
    #[arg(long)]
    verify: bool,
}

/// Host side of the bus: one device plus the snapshot it steps.
struct Host {
    device: ShaDevice,
    snapshot: DeviceSnapshot<FlatMemory>,
}

impl Host {
    fn new(snapshot: DeviceSnapshot<FlatMemory>) -> Self {
        Self {
            device: ShaDevice::sha1(DeviceConfig::default()),
            snapshot,
        }
    }

    fn read(&mut self, register: Register) -> u16 {
        self.device
            .execute(&mut self.snapshot, BusTransaction::read_register(register))
    }

    fn write(&mut self, register: Register, value: u16) {
        self.device.execute(
            &mut self.snapshot,
            BusTransaction::write_register(register, u32::from(value)),
        );
    }

    fn program(&mut self, rd_addr: u16, wr_addr: u16, len: u16) -> Result<()> {
        self.write(Register::RdAddr, rd_addr);
        self.write(Register::WrAddr, wr_addr);
        self.write(Register::Len, len);
        self.device.execute(&mut self.snapshot, BusTransaction::start());
        ensure!(
            self.snapshot.state() == PipelineState::ReadBlock,
            "device did not accept the start trigger"
        );
        Ok(())
    }

    /// Clocks the pipeline until a `state` read returns idle.
    fn run_to_idle(&mut self) -> Result<u32> {
        let idle = u16::from(PipelineState::Idle.as_u8());
        let mut clocks = 0;
        while self.read(Register::State) != idle {
            ensure!(
                clocks < DEFAULT_STEP_LIMIT,
                "device still busy after {clocks} clocks"
            );
            self.device.step(&mut self.snapshot);
            clocks += 1;
        }
        tracing::info!(clocks, bytes_read = self.snapshot.bytes_read(), "operation complete");
        Ok(clocks)
    }

    /// Reads the digest region from the highest address down.
    fn digest(&self, wr_addr: u16) -> Vec<u8> {
        let mut bytes = self.snapshot.memory().dump(wr_addr, DIGEST_BYTES);
        bytes.reverse();
        bytes
    }
}

fn parse_addr(text: &str) -> Result<u16, String> {
    let parsed = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .map_or_else(|| text.parse::<u16>(), |hex| u16::from_str_radix(hex, 16));
    parsed.map_err(|error| format!("invalid 16-bit address `{text}`: {error}"))
}

/// Bytes the device reads for `len`: whole blocks, at least one.
fn block_span(len: u16) -> u32 {
    u32::from(len).div_ceil(BLOCK_STRIDE).max(1) * BLOCK_STRIDE
}

/// Checks that the file, its block padding and the digest window fit in
/// memory without wrapping or overlapping. Returns the `len` to program.
fn check_layout(file_len: usize, rd_addr: u16, wr_addr: u16) -> Result<u16> {
    let len = u16::try_from(file_len).map_err(|_| {
        anyhow!("input is {file_len} bytes; the length register holds at most 65535")
    })?;

    let read_end = u32::from(rd_addr) + block_span(len) - 1;
    ensure!(
        read_end <= u32::from(u16::MAX),
        "input blocks {rd_addr:#06x}..={read_end:#06x} run past the top of memory"
    );

    let digest_end = u32::from(wr_addr) + DIGEST_SPAN - 1;
    ensure!(
        digest_end <= u32::from(u16::MAX),
        "digest window {wr_addr:#06x}..={digest_end:#06x} runs past the top of memory"
    );
    ensure!(
        digest_end < u32::from(rd_addr) || u32::from(wr_addr) > read_end,
        "digest window {wr_addr:#06x}..={digest_end:#06x} overlaps input blocks \
         {rd_addr:#06x}..={read_end:#06x}"
    );

    Ok(len)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn read_image(path: &Path) -> Result<DeviceSnapshot<FlatMemory>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let image: SnapshotImage = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a snapshot image", path.display()))?;
    DeviceSnapshot::from_image(&image)
        .with_context(|| format!("{} holds an invalid snapshot", path.display()))
}

fn write_image(path: &Path, snapshot: &DeviceSnapshot<FlatMemory>) -> Result<()> {
    let json = serde_json::to_string(&snapshot.to_image())?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn cmd_hash(args: &HashArgs) -> Result<()> {
    let data =
        fs::read(&args.file).with_context(|| format!("failed to read {}", args.file.display()))?;
    let len = check_layout(data.len(), args.rd_addr, args.wr_addr)?;

    let mut memory = FlatMemory::new();
    memory.load(args.rd_addr, &data);
    let mut host = Host::new(DeviceSnapshot::new(memory));
    host.program(args.rd_addr, args.wr_addr, len)?;
    if let Some(path) = &args.armed_out {
        write_image(path, &host.snapshot)?;
    }

    host.run_to_idle()?;
    let digest = host.digest(args.wr_addr);

    if args.verify {
        let hashed = host
            .snapshot
            .memory()
            .dump(args.rd_addr, block_span(len) as usize);
        let expected = Sha1::digest(&hashed);
        ensure!(
            expected.as_slice() == digest.as_slice(),
            "device digest {} differs from reference {}",
            to_hex(&digest),
            to_hex(&expected)
        );
    }
    if let Some(path) = &args.snapshot_out {
        write_image(path, &host.snapshot)?;
    }

    println!("{}  {}", to_hex(&digest), args.file.display());
    Ok(())
}

fn cmd_resume(path: &Path) -> Result<()> {
    let snapshot = read_image(path)?;
    let state = snapshot.state();
    let freshly_armed = state == PipelineState::ReadBlock && snapshot.bytes_read() == 0;
    if state.is_busy() && !freshly_armed {
        bail!(
            "{} is mid-operation ({state:?} after {} bytes); the hash state is not \
             part of the image, so only idle or freshly armed snapshots can resume",
            path.display(),
            snapshot.bytes_read()
        );
    }

    let wr_addr = snapshot.wr_addr();
    let mut host = Host::new(snapshot);
    host.run_to_idle()?;
    println!("{}", to_hex(&host.digest(wr_addr)));
    Ok(())
}

fn cmd_regs(path: &Path) -> Result<()> {
    let mut host = Host::new(read_image(path)?);
    for descriptor in REGISTER_MAP {
        let value = host.read(descriptor.register);
        println!(
            "{:<8} {:#06x}  {:#06x}",
            descriptor.register.name(),
            descriptor.addr,
            value
        );
    }
    println!("{:<8} {:>6}  {}", "progress", "-", host.snapshot.bytes_read());
    Ok(())
}

fn init_tracing(trace: bool) {
    let filter = if trace {
        EnvFilter::new("sha_device=trace,sha_sim=trace")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Hash(args) => cmd_hash(&args),
        Commands::Resume { snapshot } => cmd_resume(&snapshot),
        Commands::Regs { snapshot } => cmd_regs(&snapshot),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}
