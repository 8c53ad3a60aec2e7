//! Production implementation of DecisionSource using OS entropy.

use crate::DecisionSource;
use rand::rngs::OsRng;
use rand::{Rng, RngCore};

/// Decision source backed by OS entropy.
///
/// This is the "real" implementation for ad-hoc exploration. Runs made with
/// it cannot be replayed; use a seeded source when a failure must be
/// reproduced.
#[derive(Debug, Clone, Copy)]
pub struct EntropyDecisions {
    /// Probability of answering `true`
    probability: f64,
}

impl EntropyDecisions {
    /// Creates a fair source.
    pub fn new() -> Self {
        Self { probability: 0.5 }
    }

    /// Creates a source answering `true` with the given probability.
    ///
    /// The probability is clamped into `[0, 1]`; NaN falls back to a fair coin.
    pub fn with_probability(probability: f64) -> Self {
        let probability = if probability.is_nan() { 0.5 } else { probability.clamp(0.0, 1.0) };
        Self { probability }
    }

    /// Returns the configured probability.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Draws a fresh master seed for a seeded source.
    ///
    /// Logging the result lets an otherwise unseeded session be replayed.
    pub fn fresh_seed() -> u64 {
        loop {
            // 0 is reserved for "unseeded"
            let seed = OsRng.next_u64();
            if seed != 0 {
                return seed;
            }
        }
    }
}

impl Default for EntropyDecisions {
    fn default() -> Self {
        Self::new()
    }
}

impl DecisionSource for EntropyDecisions {
    fn choose(&mut self) -> bool {
        OsRng.gen_bool(self.probability)
    }

    fn seed(&self) -> u64 {
        // Not seeded
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_seed() {
        let decisions = EntropyDecisions::new();
        assert_eq!(decisions.seed(), 0);
    }

    #[test]
    fn test_entropy_degenerate_probabilities() {
        let mut never = EntropyDecisions::with_probability(0.0);
        let mut always = EntropyDecisions::with_probability(7.0);

        assert_eq!(always.probability(), 1.0);
        for _ in 0..32 {
            assert!(!never.choose());
            assert!(always.choose());
        }
    }

    #[test]
    fn test_fresh_seed_is_never_zero() {
        let seeds: Vec<u64> = (0..8).map(|_| EntropyDecisions::fresh_seed()).collect();
        assert!(seeds.iter().all(|seed| *seed != 0));
        // Eight identical 64-bit draws would mean the source is not random
        assert!(seeds.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_entropy_through_trait_object() {
        let mut boxed: Box<dyn DecisionSource> = Box::new(EntropyDecisions::with_probability(1.0));
        assert!(boxed.choose());
    }
}
