//! Seeded random source and noise helpers

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Seed bookkeeping for reproducible runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Uniform sample in `(0, 1]`
#[inline]
pub fn unit_open_low<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    1.0 - rng.random::<f32>()
}

/// Standard normal sample via the Box-Muller transform
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // u1 must be non-zero for the log
    let u1 = unit_open_low(rng);
    let u2 = rng.random::<f32>();
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}
