//! # Scheduler — Batched Worker Pool with Timeout and Fault Isolation
//!
//! Fans candidate exponents out to a bounded pool of CPU workers and fans
//! confirmed discoveries back in. The unit of dispatch is a *batch*: a
//! consecutive slice of the candidate sequence (default 50 exponents), so
//! every candidate lands in exactly one batch and batches reconstruct the
//! sequence with no gaps or duplicates.
//!
//! ## Fault containment
//!
//! Failures are contained at three granularities and none of them aborts
//! the run:
//!
//! - **Candidate**: a tester error (or panic, via `catch_unwind`) is logged
//!   at ERROR and skips only that exponent.
//! - **Batch**: the coordinator waits on each batch's completion channel
//!   with a timeout (default 600 s). On expiry the batch is logged at WARN,
//!   counted as skipped, and its cancellation flag is raised — the worker
//!   abandons remaining candidates at the next candidate boundary. Results
//!   the batch already appended stay valid. An in-flight Lucas–Lehmer
//!   iteration cannot be interrupted mid-squaring; the abandoned worker is
//!   detached and exits with the process.
//! - **Pool**: thread-pool construction errors propagate to the caller
//!   before any work is dispatched, so no results can be corrupted.
//!
//! ## Shared state
//!
//! The only shared mutable resource is the `Mutex<Vec<Discovery>>` result
//! collection. Each append holds the lock for one push, so appends are
//! atomic with respect to each other; the coordinator is the single owner
//! that drains it after the wait loop.

use anyhow::Result;
use rug::Integer;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::progress::Progress;
use crate::{exact_digits, mersenne_number};

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(600);

/// Seam between the scheduler and the primality test. Production plugs in
/// `lucas_lehmer::LucasLehmerTester`; tests inject failing or hanging stubs.
pub trait ExponentTester: Send + Sync {
    /// Decide whether 2^p − 1 is prime.
    fn test(&self, p: u64) -> Result<bool>;
}

/// A confirmed Mersenne prime: the exponent and the value 2^p − 1 itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Discovery {
    pub exponent: u64,
    pub value: Integer,
}

#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    /// Pool width; 0 means all available cores.
    pub worker_count: usize,
    /// Candidates per dispatched batch.
    pub batch_size: usize,
    /// How long the coordinator waits on one batch before abandoning it.
    pub batch_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        SchedulerConfig {
            worker_count: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }
}

impl SchedulerConfig {
    pub fn effective_workers(&self) -> usize {
        if self.worker_count > 0 {
            self.worker_count
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }
}

/// What a run produced, plus enough counters to judge its health.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Confirmed primes in completion order — callers sort if they care.
    pub discoveries: Vec<Discovery>,
    /// Candidates actually handed to the tester (abandoned ones excluded).
    pub tested: u64,
    /// Candidates whose test errored or panicked.
    pub failures: u64,
    /// Total batches dispatched.
    pub batches: u64,
    /// Batches abandoned on timeout.
    pub skipped_batches: u64,
}

/// Per-batch completion message from worker to coordinator.
struct BatchDone {
    tested: u64,
    failures: u64,
}

/// Bookkeeping the coordinator keeps for each dispatched batch.
struct Dispatched {
    index: usize,
    first: u64,
    last: u64,
    cancel: Arc<AtomicBool>,
    done: mpsc::Receiver<BatchDone>,
}

/// Partition `candidates` into batches, test them on a bounded pool, and
/// collect every confirmed discovery.
pub fn run(
    candidates: &[u64],
    tester: Arc<dyn ExponentTester>,
    config: &SchedulerConfig,
    progress: Option<Arc<Progress>>,
) -> Result<RunReport> {
    if candidates.is_empty() {
        return Ok(RunReport::default());
    }
    let batch_size = config.batch_size.max(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.effective_workers())
        .thread_name(|i| format!("ll-worker-{i}"))
        .build()?;

    let results: Arc<Mutex<Vec<Discovery>>> = Arc::new(Mutex::new(Vec::new()));

    // Fan-out: batches are submitted in candidate order. They may complete
    // in any order; the pool just bounds how many run at once.
    let mut dispatched = Vec::with_capacity(candidates.len() / batch_size + 1);
    for (index, batch) in candidates.chunks(batch_size).enumerate() {
        let (done_tx, done_rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        dispatched.push(Dispatched {
            index,
            first: batch[0],
            last: *batch.last().unwrap(),
            cancel: Arc::clone(&cancel),
            done: done_rx,
        });

        let batch = batch.to_vec();
        let tester = Arc::clone(&tester);
        let results = Arc::clone(&results);
        let progress = progress.clone();
        pool.spawn(move || {
            let stats = run_batch(&batch, tester.as_ref(), &results, &cancel, progress.as_deref());
            // The coordinator may have stopped listening after a timeout.
            let _ = done_tx.send(stats);
        });
    }

    if let Some(prog) = &progress {
        prog.set_batches_total(dispatched.len() as u64);
    }

    // Fan-in: wait for each batch in submission order, bounding the wait.
    let mut report = RunReport {
        batches: dispatched.len() as u64,
        ..RunReport::default()
    };
    for batch in &dispatched {
        match batch.done.recv_timeout(config.batch_timeout) {
            Ok(done) => {
                report.tested += done.tested;
                report.failures += done.failures;
                if let Some(prog) = &progress {
                    prog.batch_completed();
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                batch.cancel.store(true, Ordering::Relaxed);
                report.skipped_batches += 1;
                if let Some(prog) = &progress {
                    prog.batch_skipped();
                }
                warn!(
                    batch = batch.index,
                    first = batch.first,
                    last = batch.last,
                    timeout_secs = config.batch_timeout.as_secs(),
                    "batch timed out, abandoning remaining candidates"
                );
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Worker vanished without reporting; should not happen, but
                // one lost batch must not take down the run.
                report.skipped_batches += 1;
                if let Some(prog) = &progress {
                    prog.batch_skipped();
                }
                error!(batch = batch.index, "batch worker dropped its completion channel");
            }
        }
    }

    // Drain: the coordinator is the single aggregating owner. Anything an
    // abandoned worker appends after this point is dropped with the Arc.
    report.discoveries = std::mem::take(&mut *results.lock().unwrap());
    Ok(report)
}

fn run_batch(
    batch: &[u64],
    tester: &dyn ExponentTester,
    results: &Mutex<Vec<Discovery>>,
    cancel: &AtomicBool,
    progress: Option<&Progress>,
) -> BatchDone {
    if let Some(prog) = progress {
        prog.set_current_batch(format!("2^p-1 p=[{}..{}]", batch[0], batch.last().unwrap()));
    }

    let mut stats = BatchDone {
        tested: 0,
        failures: 0,
    };
    for &p in batch {
        if cancel.load(Ordering::Relaxed) {
            // Abandoned by the coordinator; stop at a candidate boundary.
            break;
        }

        // A panicking tester loses one candidate, never the batch.
        let outcome = catch_unwind(AssertUnwindSafe(|| tester.test(p)));
        stats.tested += 1;
        if let Some(prog) = progress {
            prog.candidate_tested();
        }

        match outcome {
            Ok(Ok(true)) => {
                let value = mersenne_number(p);
                info!(
                    exponent = p,
                    digits = exact_digits(&value),
                    "*** MERSENNE PRIME FOUND ***"
                );
                if let Some(prog) = progress {
                    prog.prime_found();
                }
                results.lock().unwrap().push(Discovery { exponent: p, value });
            }
            Ok(Ok(false)) => {}
            Ok(Err(e)) => {
                stats.failures += 1;
                error!(exponent = p, error = %e, "candidate test failed");
            }
            Err(_) => {
                stats.failures += 1;
                error!(exponent = p, "candidate test panicked");
            }
        }
    }
    stats
}
