use crate::cli::args::{Cli, Commands, FormatArg, RunArgs};
use crate::core::engine::{self, RunConfig};
use crate::core::model::{MAX_K, MIN_K};
use crate::core::stats::{fmt_dur, log_stage, stats_enabled};
use crate::report;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::time::Instant;

pub fn entry() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args),
    }
}

fn preflight(args: &RunArgs) -> Result<()> {
    if !(MIN_K..=MAX_K).contains(&args.kmer_size) {
        bail!(
            "expected the k-mer size to be between {} and {}",
            MIN_K,
            MAX_K
        );
    }
    if !args.min_frequency.is_finite() || !(0.0..=1.0).contains(&args.min_frequency) {
        bail!("--min-frequency must be between 0 and 1");
    }
    if args.table_factor == 0 {
        bail!("--table-factor must be >= 1");
    }
    if args.input.as_os_str() == "-" {
        bail!("stdin is not supported; provide a file path");
    }
    if !args.input.is_file() {
        bail!("unable to open file {}", args.input.display());
    }
    Ok(())
}

fn run(args: RunArgs) -> Result<()> {
    let stats = stats_enabled();
    let t0 = Instant::now();

    let t_preflight = Instant::now();
    preflight(&args)?;
    log_stage(stats, "preflight", t_preflight);

    let config = RunConfig {
        input: args.input.clone(),
        k: args.kmer_size,
        min_frequency: args.min_frequency,
        threads: args.threads,
        table_factor: args.table_factor,
    };

    let t_engine = Instant::now();
    let output = engine::run(config)?;
    log_stage(stats, "engine", t_engine);

    let t_report = Instant::now();
    let sink: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        ),
        None => Box::new(io::stdout().lock()),
    };
    let mut w = BufWriter::new(sink);
    let written = match args.format {
        FormatArg::Text => report::text::write(&mut w, &output),
        FormatArg::Json => report::json::write(&mut w, &output),
    };
    written.with_context(|| "failed to write results")?;
    w.flush().with_context(|| "failed to write results")?;
    log_stage(stats, "report", t_report);

    if stats {
        eprintln!("KIRA_STATS total={}", fmt_dur(t0.elapsed()));
    }
    Ok(())
}
