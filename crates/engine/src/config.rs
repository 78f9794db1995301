//! Engine parameters.
//!
//! One immutable value carries every tunable knob. Components copy what
//! they need at construction, so two callers with different settings can
//! run side by side without sharing state.

use crate::error::Result;
use crate::scorer::RecencyWeights;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BLOCK_SIZE: usize = 5;
pub const DEFAULT_DECAY_FACTOR: f64 = 0.8;
pub const DEFAULT_TOP_N: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Transactions per recency block, counted back from the newest
    pub block_size: usize,
    /// Weight multiplier applied once per block further into the past
    pub decay_factor: f64,
    /// Maximum number of new recommendations returned
    pub top_n: usize,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            decay_factor: DEFAULT_DECAY_FACTOR,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Configure the recency block size (default: 5)
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size;
        self
    }

    /// Configure the per-block decay factor (default: 0.8)
    pub fn with_decay_factor(mut self, decay_factor: f64) -> Self {
        self.decay_factor = decay_factor;
        self
    }

    /// Configure how many new items to recommend (default: 3)
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Check parameter ranges.
    ///
    /// `block_size` must be at least 1 and `decay_factor` finite and at least 0.
    /// `top_n = 0` is valid and yields no recommendations.
    pub fn validate(&self) -> Result<()> {
        self.recency().validate()
    }

    /// Recency weighting described by this config
    pub fn recency(&self) -> RecencyWeights {
        RecencyWeights::new(self.block_size, self.decay_factor)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
