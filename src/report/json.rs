use crate::core::engine::RunOutput;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct Config {
    k: usize,
    min_frequency: f64,
    min_count: u32,
    threads: usize,
    gzip: bool,
}

#[derive(Serialize)]
struct Row {
    kmer: String,
    position: usize,
    count: u32,
    frequency: f64,
}

#[derive(Serialize)]
struct Report {
    config: Config,
    sequence_length: usize,
    max_possible_count: usize,
    distinct_kmers: usize,
    results: Vec<Row>,
}

pub fn write(w: &mut dyn Write, output: &RunOutput) -> Result<()> {
    let report = Report {
        config: Config {
            k: output.k,
            min_frequency: output.min_frequency,
            min_count: output.min_count,
            threads: output.threads,
            gzip: output.kind.is_compressed(),
        },
        sequence_length: output.seq.len(),
        max_possible_count: output.max_possible_count,
        distinct_kmers: output.distinct,
        results: output
            .entries
            .iter()
            .map(|e| Row {
                kmer: String::from_utf8_lossy(output.kmer(e)).into_owned(),
                position: e.position,
                count: e.count,
                frequency: output.frequency(e),
            })
            .collect(),
    };
    serde_json::to_writer_pretty(&mut *w, &report)?;
    writeln!(w)?;
    Ok(())
}
