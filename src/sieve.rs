//! # Sieve — Memoized Prime Exponent Generation
//!
//! Produces the ordered candidate exponents for the Lucas–Lehmer pipeline:
//! every prime p up to the search limit. Two layers:
//!
//! 1. **Bit-packed odd sieve** (`compute_primes`): a classic sieve of
//!    Eratosthenes that stores one bit per odd integer — index i represents
//!    2i+1 — halving memory and striking work versus a full sieve. Composites
//!    are struck at stride 2s starting from s², since even multiples are
//!    never stored in the first place.
//! 2. **Per-limit memoization** (`generate_primes`): the sieve is pure, so
//!    results are cached for the lifetime of the process keyed by limit.
//!    Repeat limits (common when tests and the search share ranges) are
//!    served as a cheap `Arc` clone instead of being resieved.
//!
//! Complexity: O(n log log n) time, n/16 bytes of scratch space.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use tracing::debug;

static PRIME_CACHE: OnceLock<Mutex<HashMap<u64, Arc<Vec<u64>>>>> = OnceLock::new();

/// Generate all primes up to `limit` in increasing order, memoized per limit.
///
/// A limit below 2 yields an empty sequence rather than an error.
pub fn generate_primes(limit: u64) -> Arc<Vec<u64>> {
    let cache = PRIME_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    if let Some(hit) = cache.lock().unwrap().get(&limit) {
        debug!(limit, "sieve cache hit");
        return Arc::clone(hit);
    }
    let primes = Arc::new(compute_primes(limit));
    let mut guard = cache.lock().unwrap();
    // A racing thread may have inserted meanwhile; keep the first entry so
    // every caller for this limit shares one allocation.
    let entry = guard.entry(limit).or_insert(primes);
    Arc::clone(entry)
}

/// The uncached sieve. Public so benchmarks can measure the cold path.
pub fn compute_primes(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return Vec::new();
    }
    let limit = limit as usize;

    // One bit per odd number: index i represents 2i+1.
    let n_odds = limit.div_ceil(2);
    let mut bits = vec![u64::MAX; n_odds.div_ceil(64)];
    clear_bit(&mut bits, 0); // 1 is not prime

    let mut s = 3usize;
    while s * s <= limit {
        if bit_is_set(&bits, s / 2) {
            // Strike s², s²+2s, s²+4s, …: smaller multiples were already
            // struck by smaller primes, and odd strides stay odd.
            let mut m = s * s;
            while m <= limit {
                clear_bit(&mut bits, m / 2);
                m += 2 * s;
            }
        }
        s += 2;
    }

    let mut primes = Vec::with_capacity(estimate_prime_count(limit));
    primes.push(2);
    for i in 1..n_odds {
        let n = 2 * i + 1;
        if n <= limit && bit_is_set(&bits, i) {
            primes.push(n as u64);
        }
    }
    primes
}

#[inline]
fn bit_is_set(bits: &[u64], i: usize) -> bool {
    bits[i / 64] & (1 << (i % 64)) != 0
}

#[inline]
fn clear_bit(bits: &mut [u64], i: usize) {
    bits[i / 64] &= !(1 << (i % 64));
}

/// Estimate prime count up to n using the prime counting function approximation.
fn estimate_prime_count(n: usize) -> usize {
    if n < 10 {
        return 4;
    }
    let nf = n as f64;
    (1.3 * nf / nf.ln()) as usize
}
