//! Bounded random price fluctuation
//!
//! The generator never clamps; bounds are enforced by the store.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Default maximum relative move per tick (±2%)
pub const DEFAULT_MAX_FLUCTUATION: f64 = 0.02;

/// Source of relative price deltas
pub trait DeltaSource: Send {
    /// Next relative delta, e.g. `0.01` for +1%
    fn next_delta(&mut self) -> f64;
}

/// Delta drawn uniformly from `[-max, +max]`
pub struct UniformDelta<R = StdRng> {
    rng: R,
    max: f64,
}

impl UniformDelta<StdRng> {
    /// Reproducible source for tests and replays
    pub fn seeded(seed: u64, max: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), max)
    }

    /// Non-deterministic source seeded from OS entropy
    pub fn from_entropy(max: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), max)
    }
}

impl<R: Rng + Send> UniformDelta<R> {
    pub fn with_rng(rng: R, max: f64) -> Self {
        Self {
            rng,
            max: max.abs(),
        }
    }
}

impl<R: Rng + Send> DeltaSource for UniformDelta<R> {
    fn next_delta(&mut self) -> f64 {
        if self.max == 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-self.max..=self.max)
    }
}

/// Constant delta
#[derive(Debug, Clone, Copy)]
pub struct FixedDelta(pub f64);

impl DeltaSource for FixedDelta {
    fn next_delta(&mut self) -> f64 {
        self.0
    }
}

/// Cycles through a fixed list of deltas
#[derive(Debug, Clone)]
pub struct DeltaSequence {
    deltas: Vec<f64>,
    pos: usize,
}

impl DeltaSequence {
    pub fn new(deltas: Vec<f64>) -> Self {
        Self { deltas, pos: 0 }
    }
}

impl DeltaSource for DeltaSequence {
    fn next_delta(&mut self) -> f64 {
        if self.deltas.is_empty() {
            return 0.0;
        }
        let delta = self.deltas[self.pos % self.deltas.len()];
        self.pos += 1;
        delta
    }
}

/// Apply a relative delta multiplicatively
pub fn apply_delta(current: f64, delta: f64) -> f64 {
    current * (1.0 + delta)
}

/// Produces the next raw price for an instrument
pub struct FluctuationGenerator {
    source: Box<dyn DeltaSource>,
}

impl FluctuationGenerator {
    pub fn new(source: impl DeltaSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Next unclamped price
    pub fn next(&mut self, current: f64) -> f64 {
        apply_delta(current, self.source.next_delta())
    }
}

impl Default for FluctuationGenerator {
    fn default() -> Self {
        Self::new(UniformDelta::from_entropy(DEFAULT_MAX_FLUCTUATION))
    }
}

impl std::fmt::Debug for FluctuationGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FluctuationGenerator").finish_non_exhaustive()
    }
}
