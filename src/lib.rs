pub mod lucas_lehmer;
pub mod progress;
pub mod scheduler;
pub mod search;
pub mod sieve;

use rug::Integer;

/// Narrow a u64 exponent to the u32 that rug's shift operators require.
/// An exponent beyond u32::MAX implies a candidate of half a billion
/// gigabytes; panicking is the only sane response at that point.
pub fn checked_u32(n: u64) -> u32 {
    u32::try_from(n).expect("exponent exceeds u32 range")
}

/// The Mersenne number M_p = 2^p − 1.
///
/// Recomputed on every call — candidates are tested once each, so caching
/// the values would only pin megabytes of GMP limbs for nothing.
pub fn mersenne_number(p: u64) -> Integer {
    (Integer::from(1u32) << checked_u32(p)) - 1u32
}

/// Estimate decimal digit count from bit length, avoiding expensive to_string conversion.
pub fn estimate_digits(n: &Integer) -> u64 {
    let bits = n.significant_bits();
    if bits == 0 {
        return 1;
    }
    (bits as f64 * std::f64::consts::LOG10_2) as u64 + 1
}

/// Exact decimal digit count (expensive for very large numbers).
pub fn exact_digits(n: &Integer) -> u64 {
    n.to_string_radix(10).len() as u64
}
