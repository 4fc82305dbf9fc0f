//! `initseq` — command-line front end for init-sequence slot fulfillment.
//!
//! ```text
//! USAGE:
//!   initseq inspect <file>                               List records and slots
//!   initseq generate <file> --slot NAME=PATH -o <out>   Fulfill slots, write output
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use initseq::{
    Command, DuplicateSlotPolicy, LegacyRecordPolicy, SequenceStore, StoreConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "initseq", about = "Init-sequence resident-data tool", version)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// List every record and the resident-data slot catalog.
    Inspect {
        /// Input sequence file.
        file: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Fulfill slots from files and write the generated sequence.
    Generate {
        /// Input sequence file.
        file: PathBuf,
        /// Slot data as NAME=PATH (repeatable).
        #[arg(long = "slot", value_name = "NAME=PATH")]
        slots: Vec<String>,
        /// Output file.
        #[arg(short, long)]
        output: PathBuf,
        /// Also print the generated sequence as hex.
        #[arg(long)]
        hexdump: bool,
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

#[derive(Args)]
struct PolicyArgs {
    /// Copy deprecated legacy binary records instead of failing.
    #[arg(long)]
    pass_through_legacy: bool,
    /// Let a later slot declaration replace an earlier one with the same name.
    #[arg(long)]
    allow_duplicate_slots: bool,
}

impl PolicyArgs {
    fn config(&self) -> StoreConfig {
        let mut config = StoreConfig::default();
        if self.pass_through_legacy {
            config = config.with_legacy_records(LegacyRecordPolicy::PassThrough);
        }
        if self.allow_duplicate_slots {
            config = config.with_duplicate_slots(DuplicateSlotPolicy::Overwrite);
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Cmd::Inspect { file, policy } => cmd_inspect(&file, policy.config())?,
        Cmd::Generate {
            file,
            slots,
            output,
            hexdump,
            policy,
        } => cmd_generate(&file, &slots, &output, hexdump, policy.config())?,
    }

    Ok(())
}

fn load(file: &Path, config: StoreConfig) -> Result<SequenceStore> {
    SequenceStore::from_file_with_config(file, config)
        .with_context(|| format!("Failed to load {}", file.display()))
}

fn cmd_inspect(file: &Path, config: StoreConfig) -> Result<()> {
    let store = load(file, config)?;

    println!("Sequence     : {}", file.display());
    println!("Size         : {} bytes", store.raw_bytes().len());
    println!();

    for record in store.records() {
        let record = record?;
        let detail = match record.decode() {
            Ok(Command::SingleWrite { address, value }) => {
                format!("0x{address:08x} <- 0x{value:08x}")
            }
            Ok(Command::ResidentDataSlot {
                name,
                size,
                address,
            }) => format!("'{name}' {size} bytes -> 0x{address:08x}"),
            Ok(Command::DmaWrite { address, data }) => {
                format!("{} bytes -> 0x{address:08x}", data.len())
            }
            Err(e) => format!("({e})"),
        };
        println!(
            "  @{:<6} {:<16} len {:<6} {}",
            record.offset,
            record.kind.name(),
            record.payload.len(),
            detail
        );
    }

    println!();
    println!("Resident-data slots: {}", store.slot_count());
    for slot in store.slots() {
        println!(
            "  {:<24} {:>8} bytes -> 0x{:08x}",
            slot.name(),
            slot.size(),
            slot.destination_address()
        );
    }

    Ok(())
}

fn parse_slot_arg(arg: &str) -> Result<(&str, &Path)> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name, Path::new(path))),
        _ => bail!("Invalid --slot '{arg}', expected NAME=PATH"),
    }
}

fn cmd_generate(
    file: &Path,
    slot_args: &[String],
    output: &Path,
    hexdump: bool,
    config: StoreConfig,
) -> Result<()> {
    let mut store = load(file, config)?;

    for arg in slot_args {
        let (name, path) = parse_slot_arg(arg)?;
        let data = std::fs::read(path)
            .with_context(|| format!("Failed to read data for slot '{name}' from {}", path.display()))?;
        store.fulfill_slot(name, data)?;
        tracing::info!("Slot '{}' loaded from {}", name, path.display());
    }

    let pending: Vec<&str> = store.pending_slots().map(|s| s.name()).collect();
    if !pending.is_empty() {
        bail!("Slots without data: {}", pending.join(", "));
    }

    let sequence = store.generate_output_sequence()?;
    std::fs::write(output, &sequence)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "Wrote {} bytes to {} ({} slots materialized)",
        sequence.len(),
        output.display(),
        store.slot_count()
    );

    if hexdump {
        print_hexdump(&sequence);
    }

    Ok(())
}

fn print_hexdump(data: &[u8]) {
    for (row, chunk) in data.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("{:08x}  {}", row * 16, hex.join(" "));
    }
}
