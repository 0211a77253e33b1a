//! Property-based tests for merak's mathematical primitives.
//!
//! These use `proptest` to verify invariants across randomly generated
//! inputs rather than hand-picked examples.
//!
//! # How to run
//!
//! ```bash
//! cargo test --test property_tests
//!
//! # Increase case count for thorough testing (default is 256):
//! PROPTEST_CASES=2000 cargo test --test property_tests
//! ```

use proptest::prelude::*;
use rug::integer::IsPrime;
use rug::Integer;

/// Trial-division reference for small n.
fn is_prime_naive(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    let mut d = 2;
    while d * d <= n {
        if n % d == 0 {
            return false;
        }
        d += 1;
    }
    true
}

proptest! {
    /// The sieve output is exactly the set of primes up to the limit.
    #[test]
    fn prop_sieve_matches_trial_division(limit in 0u64..3000) {
        let primes = merak::sieve::compute_primes(limit);
        let expected: Vec<u64> = (2..=limit).filter(|&n| is_prime_naive(n)).collect();
        prop_assert_eq!(primes, expected, "sieve mismatch at limit {}", limit);
    }

    /// The sieve output is strictly increasing — no duplicates, no inversions.
    #[test]
    fn prop_sieve_strictly_increasing(limit in 2u64..50_000) {
        let primes = merak::sieve::compute_primes(limit);
        for w in primes.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
        prop_assert_eq!(primes[0], 2);
        prop_assert!(*primes.last().unwrap() <= limit);
    }

    /// Memoized lookups agree with the uncached sieve for any limit.
    #[test]
    fn prop_sieve_cache_transparent(limit in 0u64..5_000) {
        let cached = merak::sieve::generate_primes(limit);
        let fresh = merak::sieve::compute_primes(limit);
        prop_assert_eq!(&*cached, &fresh);
        // A second call must serve the identical allocation.
        let again = merak::sieve::generate_primes(limit);
        prop_assert!(std::sync::Arc::ptr_eq(&cached, &again));
    }

    /// Partition property: consecutive chunks of any size cover the
    /// candidate sequence exactly once and concatenate back to it.
    #[test]
    fn prop_chunks_reconstruct_sequence(
        len in 0usize..500,
        batch_size in 1usize..80,
    ) {
        let candidates: Vec<u64> = (0..len as u64).collect();
        let batches: Vec<&[u64]> = candidates.chunks(batch_size).collect();

        // No batch exceeds the configured size; only the last may be short.
        for (i, b) in batches.iter().enumerate() {
            if i + 1 < batches.len() {
                prop_assert_eq!(b.len(), batch_size);
            } else {
                prop_assert!(b.len() <= batch_size && !b.is_empty());
            }
        }

        let reconstructed: Vec<u64> = batches.concat();
        prop_assert_eq!(reconstructed, candidates);
    }

    /// M_p = 2^p − 1 has exactly p significant bits, all ones.
    #[test]
    fn prop_mersenne_number_is_all_ones(p in 1u64..4_000) {
        let m = merak::mersenne_number(p);
        prop_assert_eq!(m.significant_bits() as u64, p);
        prop_assert_eq!(m.count_ones().unwrap() as u64, p);
    }

    /// Lucas–Lehmer agrees with GMP's Miller–Rabin on every prime exponent
    /// the generator can feed it.
    #[test]
    fn prop_lucas_lehmer_agrees_with_mr(idx in 0usize..60) {
        let primes = merak::sieve::compute_primes(300);
        let p = primes[idx % primes.len()];
        let ll = merak::lucas_lehmer::lucas_lehmer(p).unwrap();
        let mr = merak::mersenne_number(p).is_probably_prime(25) != IsPrime::No;
        prop_assert_eq!(ll, mr, "disagreement at p = {}", p);
    }

    /// Digit estimation is never off by more than one from the exact count.
    #[test]
    fn prop_estimate_digits_close_to_exact(p in 2u64..2_000) {
        let m = merak::mersenne_number(p);
        let est = merak::estimate_digits(&m) as i64;
        let exact = merak::exact_digits(&m) as i64;
        prop_assert!((est - exact).abs() <= 1);
    }
}

#[test]
fn mersenne_number_agrees_with_pow() {
    use rug::ops::Pow;
    for p in [2u64, 3, 5, 31, 127, 521] {
        let expected = Integer::from(2u32).pow(merak::checked_u32(p)) - 1u32;
        assert_eq!(merak::mersenne_number(p), expected);
    }
}
