use crate::core::count::{CountParams, CountingPass};
use crate::core::io::{InputKind, Sequence, load_sequence};
use crate::core::model::{ResultEntry, min_count};
use crate::core::stats::{log_stage, stats_enabled};
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Instant;

pub struct RunConfig {
    pub input: PathBuf,
    pub k: usize,
    pub min_frequency: f64,
    /// Worker threads; 0 selects one per core.
    pub threads: usize,
    pub table_factor: usize,
}

pub struct RunOutput {
    pub seq: Sequence,
    pub kind: InputKind,
    pub k: usize,
    pub min_frequency: f64,
    pub min_count: u32,
    pub threads: usize,
    pub max_possible_count: usize,
    pub distinct: usize,
    /// Most frequent first.
    pub entries: Vec<ResultEntry>,
}

impl RunOutput {
    pub fn kmer(&self, entry: &ResultEntry) -> &[u8] {
        &self.seq.bytes()[entry.position..entry.position + self.k]
    }

    pub fn frequency(&self, entry: &ResultEntry) -> f64 {
        entry.frequency(self.max_possible_count)
    }
}

pub fn resolve_threads(threads: usize) -> usize {
    if threads == 0 { num_cpus::get() } else { threads }
}

pub fn run(cfg: RunConfig) -> Result<RunOutput> {
    let stats = stats_enabled();
    let t_total = Instant::now();
    let threads = resolve_threads(cfg.threads);

    let t_load = Instant::now();
    let (seq, kind) = load_sequence(&cfg.input, threads)?;
    log_stage(stats, "engine.load", t_load);

    let t_alloc = Instant::now();
    let params = CountParams {
        table_factor: cfg.table_factor,
        ..CountParams::new(cfg.k)
    };
    let pass = CountingPass::new(seq.bytes(), params)
        .with_context(|| format!("cannot count {}-mers in {}", cfg.k, cfg.input.display()))?;
    let modulus = pass.modulus();
    log_stage(stats, "engine.alloc", t_alloc);

    let t_count = Instant::now();
    let counts = if threads > 1 {
        pass.run_parallel(threads)
    } else {
        pass.run()
    };
    log_stage(stats, "engine.count", t_count);

    let max_possible_count = counts.max_possible_count();
    let min_count = min_count(cfg.min_frequency, max_possible_count);

    let t_select = Instant::now();
    let entries = counts.ranked(min_count);
    log_stage(stats, "engine.select_rank", t_select);

    let distinct = counts.distinct();
    if stats {
        eprintln!(
            "KIRA_STATS input={} kind={:?} bytes={} k={} windows={} modulus={} distinct={} min_count={} selected={} threads={}",
            cfg.input.display(),
            kind,
            seq.len(),
            counts.k(),
            max_possible_count,
            modulus,
            distinct,
            min_count,
            entries.len(),
            threads
        );
        if let Some(top) = entries.first() {
            eprintln!(
                "KIRA_STATS top_kmer={} top_count={}",
                String::from_utf8_lossy(counts.kmer(top.position)),
                top.count
            );
        }
    }
    drop(counts);
    log_stage(stats, "engine.total", t_total);

    Ok(RunOutput {
        seq,
        kind,
        k: cfg.k,
        min_frequency: cfg.min_frequency,
        min_count,
        threads,
        max_possible_count,
        distinct,
        entries,
    })
}
