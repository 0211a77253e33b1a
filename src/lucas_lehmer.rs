//! # Lucas–Lehmer — Deterministic Mersenne Primality Test
//!
//! The Lucas–Lehmer test decides primality of M_p = 2^p − 1 for prime p:
//! seed s = 4, iterate s ← (s² − 2) mod M_p exactly p − 2 times; M_p is
//! prime iff the final s is 0. Unlike the probabilistic tests used for
//! forms without known structure, this is an exact proof.
//!
//! The accumulator lives in `rug::Integer` (GMP), so each squaring uses
//! GMP's subquadratic multiplication and precision grows with p — M_p has
//! p bits, far beyond any fixed-width type for interesting exponents. The
//! squaring dominates: the whole test is O(p · M(p)) where M is GMP's
//! multiplication cost.
//!
//! ## References
//!
//! - É. Lucas, "Théorie des fonctions numériques simplement périodiques",
//!   American Journal of Mathematics, 1(2), 1878.
//! - D.H. Lehmer, "An Extended Theory of Lucas' Functions", Annals of
//!   Mathematics, 31(3), 1930.
//! - OEIS: [A000043](https://oeis.org/A000043) — Mersenne prime exponents.

use anyhow::{bail, Result};
use rug::ops::RemRounding;
use rug::Integer;

use crate::mersenne_number;
use crate::scheduler::ExponentTester;

/// Decide whether M_p = 2^p − 1 is prime.
///
/// Exponents below 2 are an error — callers catch and log rather than crash.
/// p = 2 is the base case of the test: M_2 = 3 is prime by convention.
pub fn lucas_lehmer(p: u64) -> Result<bool> {
    if p < 2 {
        bail!("Lucas-Lehmer undefined for p = {}; exponent must be at least 2", p);
    }
    if p == 2 {
        return Ok(true);
    }

    let m_p = mersenne_number(p);
    let mut s = Integer::from(4u32);
    for _ in 0..p - 2 {
        s.square_mut();
        s -= 2u32;
        // rem_euc keeps s in [0, M_p) even for the s = 0 corner where
        // s² − 2 goes negative.
        s = s.rem_euc(&m_p);
    }
    Ok(s == 0u32)
}

/// The production tester plugged into the batch scheduler.
pub struct LucasLehmerTester;

impl ExponentTester for LucasLehmerTester {
    fn test(&self, p: u64) -> Result<bool> {
        lucas_lehmer(p)
    }
}
