//! Injectable randomness
//!
//! Response selection and topic sampling are intentionally random. Routing
//! every random decision through `RandomSource` lets production use a real
//! RNG while tests script the exact outcomes.

use rand::Rng;

pub trait RandomSource {
    /// Pick an index into a collection of `len` items. Must return 0 when
    /// `len` is 0 or 1; callers guarantee they never index an empty slice.
    fn pick_index(&mut self, len: usize) -> usize;

    /// Biased coin flip: true with the given probability.
    fn chance(&mut self, probability: f64) -> bool;
}

/// Production source backed by the thread-local generator.
#[derive(Debug, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        rand::rng().random_range(0..len)
    }

    fn chance(&mut self, probability: f64) -> bool {
        rand::rng().random::<f64>() < probability
    }
}

/// Scripted source for tests: replays queued picks and flips, then falls
/// back to 0 / false once exhausted.
#[derive(Debug, Default)]
pub struct SequenceRandom {
    picks: std::collections::VecDeque<usize>,
    flips: std::collections::VecDeque<bool>,
}

impl SequenceRandom {
    pub fn new(picks: Vec<usize>, flips: Vec<bool>) -> Self {
        Self {
            picks: picks.into(),
            flips: flips.into(),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        let pick = self.picks.pop_front().unwrap_or(0);
        if len == 0 {
            0
        } else {
            pick.min(len - 1)
        }
    }

    fn chance(&mut self, _probability: f64) -> bool {
        self.flips.pop_front().unwrap_or(false)
    }
}
