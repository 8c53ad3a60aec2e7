//! Decision source trait for the mine pump driver.

/// The central interface for nondeterministic choice.
///
/// The core never draws randomness itself. Everything that would be a
/// nondeterministic choice in the modelled system (which capabilities a
/// product has, which stimuli occur on a step) is asked of a
/// `DecisionSource`, so a run can be replayed from its seed or scripted
/// outright in tests.
///
/// # Implementations
///
/// - **Production**: `EntropyDecisions` - OS entropy, not reproducible; also
///   draws the master seed when none is given
/// - **Simulation**: `SimDecisions` - seeded ChaCha8 with a Bernoulli bias
/// - **Tests**: `ScriptedDecisions` - a fixed sequence of answers
///
/// No assumption is made about the distribution of answers.
pub trait DecisionSource {
    /// Returns the next boolean decision.
    fn choose(&mut self) -> bool;

    /// Returns the source's seed (for logging/debugging).
    ///
    /// Unseeded sources return 0.
    fn seed(&self) -> u64;
}

impl<D: DecisionSource + ?Sized> DecisionSource for &mut D {
    fn choose(&mut self) -> bool {
        (**self).choose()
    }

    fn seed(&self) -> u64 {
        (**self).seed()
    }
}

impl<D: DecisionSource + ?Sized> DecisionSource for Box<D> {
    fn choose(&mut self) -> bool {
        (**self).choose()
    }

    fn seed(&self) -> u64 {
        (**self).seed()
    }
}
