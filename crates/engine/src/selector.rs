//! Recommendation selection from today's candidates.
//!
//! Clusters are visited from highest to lowest affinity. For each one
//! the whole candidate list is scanned in its given order: candidates of
//! that cluster the guest already consumed go to `seen_items`, the rest
//! to `new_items`. Every ranked cluster is scanned in full; `new_items`
//! is truncated to `top_n` only after the scan, so `seen_items` always
//! covers the whole menu.

use crate::config::{DEFAULT_TOP_N, EngineConfig};
use crate::scorer::AffinityVector;
use catalog::{CandidateItem, SerialId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Output of one selection: new items (capped) and already-tried items
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// At most `top_n` unseen serial ids, best cluster first
    pub new_items: Vec<SerialId>,
    /// Candidates also present in the guest's history, not capped
    pub seen_items: Vec<SerialId>,
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationSelector {
    top_n: usize,
}

impl RecommendationSelector {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.top_n)
    }

    /// Rank clusters by `affinity` and pick today's recommendations.
    ///
    /// Candidates whose cluster has no entry in `affinity` are never visited.
    pub fn select(
        &self,
        affinity: &AffinityVector,
        candidates: &[CandidateItem],
        history_serial_ids: &HashSet<SerialId>,
    ) -> RecommendationResult {
        let mut result = RecommendationResult::default();

        for cluster in affinity.ranked_clusters() {
            for candidate in candidates.iter().filter(|c| c.cluster_label == cluster) {
                if history_serial_ids.contains(&candidate.serial_id) {
                    result.seen_items.push(candidate.serial_id);
                } else {
                    result.new_items.push(candidate.serial_id);
                }
            }
        }

        debug!(
            "Selected {} of {} unseen candidates, {} already tried",
            result.new_items.len().min(self.top_n),
            result.new_items.len(),
            result.seen_items.len()
        );

        result.new_items.truncate(self.top_n);
        result
    }
}

impl Default for RecommendationSelector {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_N)
    }
}
