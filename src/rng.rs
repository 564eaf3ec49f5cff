//! Seeded random source
//!
//! All gameplay randomness (spawn kinds, lanes, particle bursts) flows through
//! `SeededRng`. The generator counts every 32-bit draw, so its state is a pure
//! function of `(seed, calls)` and can be rebuilt from an `RngState`.

use rand::{Rng, RngCore, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Serializable RNG position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    /// Number of 32-bit outputs consumed since seeding
    pub calls: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, calls: 0 }
    }

    /// Rebuild the generator at this exact position
    pub fn to_rng(&self) -> SeededRng {
        let mut inner = Pcg32::seed_from_u64(self.seed);
        // Pcg32 produces one u32 per state step
        inner.advance(self.calls);
        SeededRng {
            seed: self.seed,
            calls: self.calls,
            inner,
        }
    }
}

/// Deterministic PCG-backed generator with a draw counter
#[derive(Debug, Clone)]
pub struct SeededRng {
    seed: u64,
    calls: u64,
    inner: Pcg32,
}

impl SeededRng {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            calls: 0,
            inner: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn calls(&self) -> u64 {
        self.calls
    }

    pub fn state(&self) -> RngState {
        RngState {
            seed: self.seed,
            calls: self.calls,
        }
    }

    /// Uniform float in [0, 1)
    pub fn next_f32(&mut self) -> f32 {
        self.random::<f32>()
    }

    /// Uniform float in [lo, hi); returns `lo` for an empty range
    pub fn range_f32(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.random_range(lo..hi)
    }

    /// Pick an index with probability proportional to its weight.
    ///
    /// Returns `None` when every weight is zero or the table is empty.
    pub fn weighted_index(&mut self, weights: impl Iterator<Item = u32> + Clone) -> Option<usize> {
        let total: u64 = weights.clone().map(u64::from).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.random_range(0..total);
        for (i, w) in weights.enumerate() {
            let w = u64::from(w);
            if roll < w {
                return Some(i);
            }
            roll -= w;
        }
        None
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.calls += 1;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        // Pcg32 composes u64 from two u32 outputs
        self.calls += 2;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}
