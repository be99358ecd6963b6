#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tuning knobs for building and walking a [`BarnesHutTree`](crate::BarnesHutTree)
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct TreeConfig {
    /// Smallest distance the force walk divides by
    pub min_distance: f64,
    /// Size of the random displacement applied to coincident particles, as a
    /// fraction of the new branch's half size
    pub jitter_fraction: f64,
    /// Deepest branch level the tree will create. Particles that would need a
    /// deeper split are merged into the resident particle instead.
    pub max_depth: usize,
    /// Seed for the jitter generator. `None` draws a fresh seed per tree.
    pub seed: Option<u64>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.01,
            jitter_fraction: 0.08,
            max_depth: 64,
            seed: None,
        }
    }
}

impl TreeConfig {
    /// Set the smallest distance the force walk divides by
    pub fn with_min_distance(mut self, min_distance: f64) -> Self {
        self.min_distance = min_distance;
        self
    }

    /// Set the size of the displacement applied to coincident particles
    pub fn with_jitter_fraction(mut self, jitter_fraction: f64) -> Self {
        self.jitter_fraction = jitter_fraction;
        self
    }

    /// Set the deepest branch level the tree will create
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Make the jitter reproducible by seeding its generator
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
