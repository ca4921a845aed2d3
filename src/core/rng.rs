//! Marker rotation jitter
//!
//! Neighbouring crosses get slightly different rotations so the trail looks
//! hand-stitched.

use rand::rngs::{OsRng, SmallRng};
use rand::{Rng, SeedableRng};
use tracing::warn;

const FALLBACK_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

#[derive(Clone, Debug)]
pub struct Jitter {
    rng: SmallRng,
}

impl Jitter {
    /// Seed from the OS (or `crypto.getRandomValues` on wasm).
    pub fn from_entropy() -> Self {
        match SmallRng::from_rng(OsRng) {
            Ok(rng) => Self { rng },
            Err(e) => {
                warn!(error = %e, "No entropy source, using fixed jitter seed");
                Self::with_seed(FALLBACK_SEED)
            }
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Uniform in [-range/2, range/2)
    pub fn centered(&mut self, range: f32) -> f32 {
        (self.rng.gen::<f32>() - 0.5) * range
    }
}
