use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod convert;
pub mod inspect;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert captures to per-stream FLV files.
    Convert(ConvertArgs),
    /// Analyze captures without writing any media output.
    Inspect(InspectArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Convert(args) => convert::run(args),
        Command::Inspect(args) => inspect::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// Capture selection shared by `convert` and `inspect`.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Captures to process (`-` reads stdin and writes stdout).
    #[arg(value_name = "FILE", required = true)]
    pub files: Vec<String>,

    /// Bytes to skip at the start of each input.
    #[arg(long, short = 's', value_name = "N", default_value_t = 0)]
    pub skip: u64,

    /// Initial chunk size, usually needed when the handshake is missing.
    #[arg(
        long,
        short = 'c',
        value_name = "N",
        default_value_t = rtmpsieve_chunk::DEFAULT_CHUNK_SIZE
    )]
    pub chunk_size: u32,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}
