//! # Search — End-to-End Mersenne Orchestration
//!
//! Wires the pipeline together: limit → sieve (candidate exponents) →
//! batch scheduler (Lucas–Lehmer per candidate) → aggregated outcome.
//! All failure containment lives in the scheduler; this layer only adds
//! the candidate source and completion logging.

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use crate::lucas_lehmer::LucasLehmerTester;
use crate::progress::Progress;
use crate::scheduler::{self, Discovery, SchedulerConfig};
use crate::sieve;

/// Final result of one search run.
#[derive(Debug)]
pub struct SearchOutcome {
    /// Unordered — concurrent completion order varies run to run.
    pub discoveries: Vec<Discovery>,
    pub tested: u64,
    pub failures: u64,
    pub skipped_batches: u64,
    pub elapsed: Duration,
}

/// Test every prime exponent p ≤ `limit` for Mersenne primality.
pub fn find_mersenne_primes(
    limit: u64,
    config: &SchedulerConfig,
    progress: Option<Arc<Progress>>,
) -> Result<SearchOutcome> {
    let start = Instant::now();

    let candidates = sieve::generate_primes(limit);
    info!(
        limit,
        candidates = candidates.len(),
        workers = config.effective_workers(),
        batch_size = config.batch_size,
        "testing prime exponents for Mersenne primes 2^p - 1"
    );

    let report = scheduler::run(&candidates, Arc::new(LucasLehmerTester), config, progress)?;

    let elapsed = start.elapsed();
    info!(
        found = report.discoveries.len(),
        tested = report.tested,
        failures = report.failures,
        skipped_batches = report.skipped_batches,
        elapsed_secs = format_args!("{:.2}", elapsed.as_secs_f64()),
        "search complete"
    );

    Ok(SearchOutcome {
        discoveries: report.discoveries,
        tested: report.tested,
        failures: report.failures,
        skipped_batches: report.skipped_batches,
        elapsed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mersenne_number;

    #[test]
    fn limit_10_finds_exactly_the_known_exponents() {
        let outcome =
            find_mersenne_primes(10, &SchedulerConfig::default(), None).unwrap();

        let mut found: Vec<(u64, u64)> = outcome
            .discoveries
            .iter()
            .map(|d| (d.exponent, d.value.to_u64().unwrap()))
            .collect();
        found.sort_unstable();
        assert_eq!(found, vec![(2, 3), (3, 7), (5, 31), (7, 127)]);
        assert_eq!(outcome.tested, 4); // primes 2, 3, 5, 7
        assert_eq!(outcome.failures, 0);
        assert_eq!(outcome.skipped_batches, 0);
    }

    #[test]
    fn limit_150_matches_oeis_a000043() {
        let outcome =
            find_mersenne_primes(150, &SchedulerConfig::default(), None).unwrap();

        let mut found: Vec<u64> = outcome.discoveries.iter().map(|d| d.exponent).collect();
        found.sort_unstable();
        assert_eq!(found, vec![2, 3, 5, 7, 13, 17, 19, 31, 61, 89, 107, 127]);
        for d in &outcome.discoveries {
            assert_eq!(d.value, mersenne_number(d.exponent));
        }
    }

    #[test]
    fn single_worker_agrees_with_many() {
        let one = SchedulerConfig {
            worker_count: 1,
            batch_size: 5,
            ..SchedulerConfig::default()
        };
        let four = SchedulerConfig {
            worker_count: 4,
            batch_size: 3,
            ..SchedulerConfig::default()
        };
        let mut a: Vec<u64> = find_mersenne_primes(100, &one, None)
            .unwrap()
            .discoveries
            .iter()
            .map(|d| d.exponent)
            .collect();
        let mut b: Vec<u64> = find_mersenne_primes(100, &four, None)
            .unwrap()
            .discoveries
            .iter()
            .map(|d| d.exponent)
            .collect();
        a.sort_unstable();
        b.sort_unstable();
        assert_eq!(a, b);
    }

    #[test]
    fn trivial_limit_yields_nothing() {
        let outcome = find_mersenne_primes(1, &SchedulerConfig::default(), None).unwrap();
        assert!(outcome.discoveries.is_empty());
        assert_eq!(outcome.tested, 0);
    }
}
