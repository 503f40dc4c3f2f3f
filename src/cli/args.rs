use crate::core::count::DEFAULT_TABLE_FACTOR;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kira-kmerfreq",
    version,
    about = "Report every k-mer occurring at or above a minimum frequency"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Run(RunArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Input sequence file, read as raw bytes (gzip is decompressed)
    pub input: PathBuf,

    /// K-mer size, between 2 and 100
    #[arg(short = 'k', long)]
    pub kmer_size: usize,

    /// Minimum fraction of all window positions a k-mer must occupy
    #[arg(short = 'f', long, default_value_t = 0.0)]
    pub min_frequency: f64,

    /// Hashing threads; 0 uses every core
    #[arg(long, default_value_t = 1)]
    pub threads: usize,

    /// Hash table holds at least this many slots per input byte
    #[arg(long, default_value_t = DEFAULT_TABLE_FACTOR)]
    pub table_factor: usize,

    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    pub format: FormatArg,

    /// Write results here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    #[value(name = "text")]
    Text,
    #[value(name = "json")]
    Json,
}
