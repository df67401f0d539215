use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of the random choices made during a run: theme, query, candidate
/// and trim offset.
pub trait RandomSource: Send {
    /// Uniform index in `0..len`. `len` is never zero.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Uniform value in `[low, high]`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ThreadRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for ThreadRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Replays fixed choices in order. Runs out to the first option / the lower
/// bound once the scripted values are used up.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    indices: VecDeque<usize>,
    values: VecDeque<f64>,
}

impl ScriptedRandom {
    pub fn new(indices: &[usize], values: &[f64]) -> Self {
        Self {
            indices: indices.iter().copied().collect(),
            values: values.iter().copied().collect(),
        }
    }
}

impl RandomSource for ScriptedRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        self.indices.pop_front().unwrap_or(0).min(len.saturating_sub(1))
    }

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        self.values
            .pop_front()
            .unwrap_or(low)
            .clamp(low, high.max(low))
    }
}
