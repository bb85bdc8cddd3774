use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod check;
pub mod decode;
pub mod info;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode framed samples from a capture file or stdin.
    Decode(DecodeArgs),
    /// Validate a frame layout file.
    Check(CheckArgs),
    /// Show the frame layout of a configuration.
    Info(InfoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Decode(args) => decode::run(args, format),
        Command::Check(args) => check::run(args, format),
        Command::Info(args) => info::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Frame layout file (JSON key-value settings).
    pub config: PathBuf,
    /// Raw capture file to decode. Reads stdin when omitted.
    pub input: Option<PathBuf>,
    /// Exit after decoding N frames.
    #[arg(long)]
    pub count: Option<usize>,
    /// Bytes handed to the assembler per read.
    #[arg(long, default_value = "8192")]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Frame layout file (JSON key-value settings).
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Frame layout file (JSON key-value settings).
    pub config: PathBuf,
}

#[derive(Args, Debug, Default)]
pub struct VersionArgs {}
