//! Decision sources for deterministic simulation.

use minepump_env::DecisionSource;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::VecDeque;

/// Decision source backed by a seeded ChaCha8 RNG.
///
/// Every answer is a Bernoulli draw with a fixed probability, so two
/// sources built from the same seed and probability answer identically.
#[derive(Debug, Clone)]
pub struct SimDecisions {
    /// Master seed for this source
    seed: u64,

    /// Deterministic RNG
    rng: ChaCha8Rng,

    /// Probability of answering `true`, within `[0, 1]`
    probability: f64,

    /// Number of decisions drawn so far
    drawn: u64,
}

impl SimDecisions {
    /// Creates a fair source with the given seed.
    pub fn new(seed: u64) -> Self {
        Self::with_probability(seed, 0.5)
    }

    /// Creates a source answering `true` with probability `p`.
    ///
    /// `p` is clamped into `[0, 1]`; NaN falls back to a fair coin.
    pub fn with_probability(seed: u64, p: f64) -> Self {
        let probability = if p.is_nan() { 0.5 } else { p.clamp(0.0, 1.0) };
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            probability,
            drawn: 0,
        }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Number of decisions drawn so far.
    pub fn drawn(&self) -> u64 {
        self.drawn
    }
}

impl DecisionSource for SimDecisions {
    fn choose(&mut self) -> bool {
        self.drawn += 1;
        self.rng.gen_bool(self.probability)
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

/// Decision source replaying a fixed script.
///
/// Once the script runs out every answer is `false`, which turns further
/// steps into drain-only steps.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisions {
    script: VecDeque<bool>,
}

impl ScriptedDecisions {
    pub fn new(script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Appends more answers to the script.
    pub fn extend(&mut self, answers: impl IntoIterator<Item = bool>) {
        self.script.extend(answers);
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl DecisionSource for ScriptedDecisions {
    fn choose(&mut self) -> bool {
        self.script.pop_front().unwrap_or(false)
    }

    fn seed(&self) -> u64 {
        0
    }
}
