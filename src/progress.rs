//! # Progress — Live View of a Batch Run
//!
//! Counters shared between the batch workers, the coordinator, and a
//! background reporter thread. Workers bump candidate/prime counts as they
//! test; the coordinator registers batch completions and skips; the
//! reporter periodically logs a snapshot so long hunts show a heartbeat
//! on stderr.
//!
//! All counters are atomics so the hot path never takes a lock; only the
//! in-flight batch label sits behind a Mutex, written once per batch.
//! Reads go through [`Progress::snapshot`], which also derives the test
//! rate and batch completion ratio, so the reporter and tests see one
//! consistent view.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;

const REPORT_INTERVAL: Duration = Duration::from_secs(30);

pub struct Progress {
    tested: AtomicU64,
    found: AtomicU64,
    batches_total: AtomicU64,
    batches_completed: AtomicU64,
    batches_skipped: AtomicU64,
    current_batch: Mutex<String>,
    start: Instant,
    shutdown: AtomicBool,
}

/// One consistent reading of the counters, plus derived figures.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub tested: u64,
    pub found: u64,
    pub batches_total: u64,
    pub batches_completed: u64,
    pub batches_skipped: u64,
    pub current_batch: String,
    pub elapsed: Duration,
    /// Candidates tested per second since the run started.
    pub rate: f64,
}

impl Progress {
    pub fn new() -> Arc<Self> {
        Arc::new(Progress {
            tested: AtomicU64::new(0),
            found: AtomicU64::new(0),
            batches_total: AtomicU64::new(0),
            batches_completed: AtomicU64::new(0),
            batches_skipped: AtomicU64::new(0),
            current_batch: Mutex::new(String::new()),
            start: Instant::now(),
            shutdown: AtomicBool::new(false),
        })
    }

    /// Called once by the coordinator after partitioning.
    pub fn set_batches_total(&self, n: u64) {
        self.batches_total.store(n, Ordering::Relaxed);
    }

    /// One candidate was handed to the tester (worker hot path).
    pub fn candidate_tested(&self) {
        self.tested.fetch_add(1, Ordering::Relaxed);
    }

    /// One Mersenne prime was confirmed.
    pub fn prime_found(&self) {
        self.found.fetch_add(1, Ordering::Relaxed);
    }

    /// A batch reached a terminal state: finished, or abandoned on timeout.
    pub fn batch_completed(&self) {
        self.batches_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn batch_skipped(&self) {
        self.batches_skipped.fetch_add(1, Ordering::Relaxed);
    }

    /// Label of the exponent range a worker just picked up.
    pub fn set_current_batch(&self, label: String) {
        *self.current_batch.lock().unwrap() = label;
    }

    pub fn snapshot(&self) -> Snapshot {
        let elapsed = self.start.elapsed();
        let tested = self.tested.load(Ordering::Relaxed);
        let rate = if elapsed.as_secs() > 0 {
            tested as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };
        Snapshot {
            tested,
            found: self.found.load(Ordering::Relaxed),
            batches_total: self.batches_total.load(Ordering::Relaxed),
            batches_completed: self.batches_completed.load(Ordering::Relaxed),
            batches_skipped: self.batches_skipped.load(Ordering::Relaxed),
            current_batch: self.current_batch.lock().unwrap().clone(),
            elapsed,
            rate,
        }
    }

    /// Spawn the heartbeat thread; it exits on the next wake after `stop`.
    pub fn start_reporter(self: &Arc<Self>) -> thread::JoinHandle<()> {
        let progress = Arc::clone(self);
        thread::spawn(move || loop {
            thread::sleep(REPORT_INTERVAL);
            if progress.shutdown.load(Ordering::Relaxed) {
                break;
            }
            progress.log_status();
        })
    }

    pub fn log_status(&self) {
        let snap = self.snapshot();
        info!(
            current = %snap.current_batch,
            batches = format_args!("{}/{}", snap.batches_completed, snap.batches_total),
            skipped = snap.batches_skipped,
            tested = snap.tested,
            found = snap.found,
            rate = format_args!("{:.2}/s", snap.rate),
            elapsed_secs = snap.elapsed.as_secs(),
            "search progress"
        );
    }

    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    #[cfg(test)]
    fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}
