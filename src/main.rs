//! # Main — CLI Entry Point
//!
//! Parses arguments, configures structured logging, runs the search, and
//! prints the discoveries. Everything interesting happens in the library;
//! this file is glue.
//!
//! ## Options
//!
//! - `--limit`: upper bound on candidate exponents (default 1000; values
//!   below 2 are replaced by the default with a warning, never fatal).
//! - `--workers`: pool width (0 = all logical cores).
//! - `--batch-size`: candidate exponents per dispatched batch.
//! - `--timeout-secs`: per-batch timeout before a batch is abandoned.
//! - `--json`: machine-readable output instead of text lines.
//! - `--quiet`: suppress the periodic progress reporter.
//!
//! Logging goes to stderr via `tracing`; set `LOG_FORMAT=json` for
//! JSON-formatted records.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, warn};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use merak::progress::Progress;
use merak::scheduler::SchedulerConfig;
use merak::{exact_digits, search};

const DEFAULT_LIMIT: u64 = 1000;

#[derive(Parser)]
#[command(name = "merak", about = "Hunt for Mersenne primes with the Lucas-Lehmer test")]
struct Cli {
    /// Upper bound on candidate exponents p (every prime p <= limit is tested)
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u64,

    /// Number of parallel workers (0 = all logical cores)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Candidate exponents per batch
    #[arg(long, default_value_t = 50)]
    batch_size: usize,

    /// Per-batch timeout in seconds; a batch exceeding it is abandoned
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,

    /// Emit discoveries as a JSON array instead of text lines
    #[arg(long)]
    json: bool,

    /// Suppress the periodic progress reporter
    #[arg(long)]
    quiet: bool,
}

#[derive(Serialize)]
struct DiscoveryRecord {
    exponent: u64,
    digits: u64,
    value: String,
}

fn main() {
    // Structured logging: LOG_FORMAT=json for machine ingestion, human-readable otherwise
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        // Log once and exit nonzero; anything already printed stays printed.
        error!(error = %e, "search failed");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let limit = if cli.limit < 2 {
        warn!(
            limit = cli.limit,
            default = DEFAULT_LIMIT,
            "limit must be at least 2, substituting default"
        );
        DEFAULT_LIMIT
    } else {
        cli.limit
    };

    let config = SchedulerConfig {
        worker_count: cli.workers,
        batch_size: cli.batch_size,
        batch_timeout: Duration::from_secs(cli.timeout_secs),
    };

    let progress = Progress::new();
    // Detached on purpose: the reporter wakes, sees the shutdown flag, exits.
    let _reporter = (!cli.quiet).then(|| progress.start_reporter());

    let start = Instant::now();
    let outcome = search::find_mersenne_primes(limit, &config, Some(Arc::clone(&progress)));
    progress.stop();
    let outcome = outcome?;

    // Completion order varies run to run; sort at the printing site.
    let mut discoveries = outcome.discoveries;
    discoveries.sort_unstable_by_key(|d| d.exponent);

    if cli.json {
        let records: Vec<DiscoveryRecord> = discoveries
            .iter()
            .map(|d| DiscoveryRecord {
                exponent: d.exponent,
                digits: exact_digits(&d.value),
                value: d.value.to_string(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        println!("\nMersenne primes found:");
        for d in &discoveries {
            println!("2^{} - 1 = {}", d.exponent, d.value);
        }
    }

    println!(
        "\nTotal execution time: {:.2} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
