//! Number generation and factoring
//!
//! Each round needs four candidates in [1, 200]: exactly one prime (drawn
//! uniformly from the table below) and three pairwise-distinct non-primes
//! found by rejection sampling. Composite density in that range is high, so
//! the rejection loop terminates quickly in practice.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{NUMBER_CEILING, RUNE_COUNT};

/// All primes up to 200, ascending.
pub static PRIMES_200: [u32; 46] = [
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71, 73, 79, 83, 89,
    97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157, 163, 167, 173, 179, 181, 191,
    193, 197, 199,
];

/// Primality by table lookup. Only valid for `n <= 200`, which is all the
/// game ever generates.
pub fn is_prime(n: u32) -> bool {
    PRIMES_200.binary_search(&n).is_ok()
}

/// Proper divisors of `n` between 2 and n/2, ascending.
///
/// Trial division up to sqrt(n); each divisor `i` contributes both `i` and
/// `n / i` unless they coincide (perfect square). Neither 1 nor `n` appears,
/// so primes and 1 yield an empty list.
pub fn factors(n: u32) -> Vec<u32> {
    let mut out = Vec::new();
    let mut i = 2;
    while i * i <= n {
        if n % i == 0 {
            out.push(i);
            if i != n / i {
                out.push(n / i);
            }
        }
        i += 1;
    }
    out.sort_unstable();
    out
}

/// The four candidate numbers for one round, with the prime's slot marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberSet {
    values: [u32; RUNE_COUNT],
    prime_index: usize,
}

impl NumberSet {
    /// Build a set from explicit values. Panics if `prime_index` is out of
    /// range or the marked value is not prime; intended for scripted rounds.
    pub fn scripted(values: [u32; RUNE_COUNT], prime_index: usize) -> Self {
        assert!(prime_index < RUNE_COUNT);
        assert!(is_prime(values[prime_index]), "scripted prime slot must hold a prime");
        Self { values, prime_index }
    }

    /// Draw a fresh set: one uniform prime in a uniform slot, three distinct
    /// rejection-sampled non-primes.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let prime = PRIMES_200[rng.random_range(0..PRIMES_200.len())];
        let prime_index = rng.random_range(0..RUNE_COUNT);

        let mut non_primes: Vec<u32> = Vec::with_capacity(RUNE_COUNT - 1);
        while non_primes.len() < RUNE_COUNT - 1 {
            let n = rng.random_range(1..=NUMBER_CEILING);
            if !is_prime(n) && !non_primes.contains(&n) {
                non_primes.push(n);
            }
        }

        let mut values = [0; RUNE_COUNT];
        let mut next_non_prime = non_primes.into_iter();
        for (slot, value) in values.iter_mut().enumerate() {
            *value = if slot == prime_index {
                prime
            } else {
                next_non_prime.next().unwrap_or(1)
            };
        }

        Self { values, prime_index }
    }

    pub fn values(&self) -> &[u32; RUNE_COUNT] {
        &self.values
    }

    pub fn value(&self, slot: usize) -> u32 {
        self.values[slot]
    }

    pub fn prime_index(&self) -> usize {
        self.prime_index
    }

    pub fn prime_value(&self) -> u32 {
        self.values[self.prime_index]
    }
}
