use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "audio-duper")]
#[command(about = "Consolidates audio collections, one copy per recording", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./Config.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest the source trees into the destination
    Process(ProcessArgs),
    /// Count index entries that have no copy in the destination
    Audit,
    /// List source files whose name is absent from the destination
    Missing(MissingArgs),
    /// Display the number of keys in every index
    CountIndex,
    /// Print configuration values
    PrintConfig,
    /// Check that ffprobe and fpcalc can be run
    CheckTools,
}

#[derive(Debug, Args)]
pub struct ProcessArgs {
    /// Source root, repeatable; replaces the configured list
    #[arg(long = "source", value_name = "DIR")]
    pub sources: Vec<String>,

    /// Destination directory; replaces the configured one
    #[arg(long, value_name = "DIR")]
    pub destination: Option<String>,
}

#[derive(Debug, Args)]
pub struct MissingArgs {
    /// Where to write the JSON list
    #[arg(long, default_value = "missing-index.json")]
    pub output: PathBuf,
}
