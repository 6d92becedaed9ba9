//! Choice of the next index while shuffle is on.

use rand::Rng;
use rand::rngs::ThreadRng;

/// Picks the next queue index in shuffle mode.
pub trait IndexPicker {
    /// Return an index in `0..len` other than `current`. Called only with
    /// `len >= 2` and `current < len`.
    fn pick(&mut self, len: usize, current: usize) -> usize;
}

/// Uniform choice among the other indices.
#[derive(Debug, Clone)]
pub struct RandomPicker<R = ThreadRng> {
    rng: R,
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self { rng: rand::rng() }
    }
}

impl<R: Rng> RandomPicker<R> {
    pub fn from_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> IndexPicker for RandomPicker<R> {
    fn pick(&mut self, len: usize, current: usize) -> usize {
        // An offset in 1..len never lands back on `current`.
        let offset = self.rng.random_range(1..len);
        (current + offset) % len
    }
}
