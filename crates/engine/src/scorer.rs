//! Affinity scoring - how closely a guest's history matches each cluster
//!
//! ## Algorithm
//! 1. D[c][t] = distance(history[t], medoid[c])
//! 2. Normalize D by its global maximum (skipped when the maximum is 0)
//! 3. Similarity S = 1 - D
//! 4. Weight each time step by recency: positions are grouped into blocks
//!    of `block_size` counted back from the newest transaction; block k
//!    (0 = newest) gets `decay_factor^k`
//! 5. Sum weighted similarity over time per cluster
//! 6. Normalize the per-cluster sums to 1
//!
//! Only the order of the history matters, not timestamps.

use crate::config::{DEFAULT_BLOCK_SIZE, DEFAULT_DECAY_FACTOR, EngineConfig};
use crate::distance::distance;
use crate::error::{EngineError, Result};
use crate::medoids::MedoidSet;
use catalog::{ClusterLabel, FeatureVector};
use rayon::prelude::*;
use serde::Serialize;
use std::cmp::Ordering;
use tracing::{debug, instrument};

/// Block-wise exponential decay over a time-ordered history
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecencyWeights {
    block_size: usize,
    decay_factor: f64,
}

impl RecencyWeights {
    pub fn new(block_size: usize, decay_factor: f64) -> Self {
        Self {
            block_size,
            decay_factor,
        }
    }

    /// `block_size >= 1` and `decay_factor` finite and `>= 0`.
    ///
    /// A decay of 0 keeps only the newest block; a decay above 1 favours
    /// older blocks.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(EngineError::InvalidConfig(
                "block_size must be at least 1".to_string(),
            ));
        }
        if !self.decay_factor.is_finite() || self.decay_factor < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "decay_factor must be a finite number >= 0, got {}",
                self.decay_factor
            )));
        }
        Ok(())
    }

    /// Weight of every position in a history of `len` items, oldest first.
    ///
    /// The newest `block_size` positions get weight 1, the block before
    /// them `decay_factor`, and so on. A partial oldest block still gets
    /// its own exponent.
    ///
    /// Fails with `InvalidConfig` on the same parameters `validate` rejects.
    pub fn weights(&self, len: usize) -> Result<Vec<f64>> {
        self.validate()?;
        Ok((0..len)
            .map(|position| {
                let age = len - 1 - position;
                let block = age / self.block_size;
                self.decay_factor.powi(block as i32)
            })
            .collect())
    }
}

impl Default for RecencyWeights {
    fn default() -> Self {
        Self::new(DEFAULT_BLOCK_SIZE, DEFAULT_DECAY_FACTOR)
    }
}

/// Per-cluster affinity, indexed by cluster label, summing to 1
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffinityVector {
    scores: Vec<f64>,
}

impl AffinityVector {
    /// Wrap precomputed scores as they are, without normalizing
    pub fn from_scores(scores: Vec<f64>) -> Self {
        Self { scores }
    }

    /// Equal affinity for every cluster.
    ///
    /// Ranking a uniform vector yields ascending cluster order, which is
    /// the fallback when a guest cannot be scored.
    pub fn uniform(num_clusters: usize) -> Self {
        let share = if num_clusters == 0 {
            0.0
        } else {
            1.0 / num_clusters as f64
        };
        Self {
            scores: vec![share; num_clusters],
        }
    }

    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn get(&self, cluster: ClusterLabel) -> Option<f64> {
        self.scores.get(cluster).copied()
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Cluster labels by descending score; equal scores keep ascending label order
    pub fn ranked_clusters(&self) -> Vec<ClusterLabel> {
        let mut labels: Vec<ClusterLabel> = (0..self.scores.len()).collect();
        labels.sort_by(|&a, &b| {
            self.scores[b]
                .partial_cmp(&self.scores[a])
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        labels
    }
}

/// Scores a consumption history against the cluster medoids
#[derive(Debug, Clone, Copy, Default)]
pub struct AffinityScorer {
    recency: RecencyWeights,
}

impl AffinityScorer {
    /// Create a scorer with the default recency settings (block 5, decay 0.8)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            recency: config.recency(),
        }
    }

    /// Configure the recency block size (default: 5)
    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.recency.block_size = block_size;
        self
    }

    /// Configure the per-block decay factor (default: 0.8)
    pub fn with_decay_factor(mut self, decay_factor: f64) -> Self {
        self.recency.decay_factor = decay_factor;
        self
    }

    pub fn recency(&self) -> &RecencyWeights {
        &self.recency
    }

    /// Compute the affinity of `history` (oldest first) to each medoid.
    ///
    /// # Errors
    /// - `EmptyHistory` when there is nothing to score
    /// - `DegenerateScore` when every weighted similarity is zero
    /// - `LengthMismatch` when a history vector and a medoid differ in length
    /// - `InvalidConfig` when the recency parameters are out of range
    #[instrument(skip(self, history, medoids), fields(history_len = history.len(), clusters = medoids.len()))]
    pub fn score(&self, history: &[FeatureVector], medoids: &MedoidSet) -> Result<AffinityVector> {
        self.recency.validate()?;
        if history.is_empty() {
            return Err(EngineError::EmptyHistory);
        }

        // D[c][t], one row per cluster
        let medoid_vectors: Vec<&FeatureVector> = medoids.iter().map(|m| &m.features).collect();
        let raw_distances: Vec<Vec<f64>> = medoid_vectors
            .par_iter()
            .map(|medoid| {
                history
                    .iter()
                    .map(|item| distance(item, medoid))
                    .collect::<Result<Vec<f64>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let max_distance = raw_distances
            .iter()
            .flatten()
            .copied()
            .fold(0.0_f64, f64::max);

        let weights = self.recency.weights(history.len())?;

        let raw_scores: Vec<f64> = raw_distances
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&weights)
                    .map(|(&d, &weight)| {
                        let normalized = if max_distance > 0.0 {
                            d / max_distance
                        } else {
                            0.0
                        };
                        (1.0 - normalized) * weight
                    })
                    .sum::<f64>()
            })
            .collect();

        let total: f64 = raw_scores.iter().sum();
        if total.is_nan() || total <= 0.0 {
            return Err(EngineError::DegenerateScore);
        }

        debug!(
            "Scored {} transactions against {} clusters (max distance {:.3})",
            history.len(),
            raw_scores.len(),
            max_distance
        );

        Ok(AffinityVector {
            scores: raw_scores.into_iter().map(|s| s / total).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::medoids::MedoidResolver;
    use catalog::CatalogItem;

    fn fv(bits: &str) -> FeatureVector {
        bits.parse().unwrap()
    }

    /// One item per cluster, so each item is its own medoid
    fn medoids_of(vectors: &[&str]) -> MedoidSet {
        let catalog: Vec<CatalogItem> = vectors
            .iter()
            .enumerate()
            .map(|(label, bits)| CatalogItem {
                serial_id: label as u32,
                cluster_label: label,
                features: fv(bits),
            })
            .collect();
        MedoidResolver.resolve(&catalog, vectors.len()).unwrap()
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_weights_two_full_blocks() {
        let weights = RecencyWeights::default().weights(10).unwrap();
        assert_eq!(&weights[..5], &[0.8; 5]);
        assert_eq!(&weights[5..], &[1.0; 5]);
    }

    #[test]
    fn test_weights_partial_oldest_block() {
        let weights = RecencyWeights::new(5, 0.8).weights(12).unwrap();
        assert_close(weights[0], 0.64);
        assert_close(weights[1], 0.64);
        assert_close(weights[2], 0.8);
        assert_close(weights[6], 0.8);
        assert_close(weights[7], 1.0);
        assert_close(weights[11], 1.0);

        let short = RecencyWeights::new(5, 0.8).weights(3).unwrap();
        assert_eq!(short, vec![1.0, 1.0, 1.0]);
        assert!(RecencyWeights::default().weights(0).unwrap().is_empty());
    }

    #[test]
    fn test_weights_reject_zero_block_size() {
        let err = RecencyWeights::new(0, 0.8).weights(4).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_zero_decay_keeps_only_newest_block() {
        let weights = RecencyWeights::new(2, 0.0).weights(5).unwrap();
        assert_eq!(weights, vec![0.0, 0.0, 0.0, 1.0, 1.0]);

        let medoids = medoids_of(&["1111", "0000"]);
        let mut history = vec![fv("0000"); 5];
        history.extend(vec![fv("1111"); 5]);

        let affinity = AffinityScorer::new()
            .with_decay_factor(0.0)
            .score(&history, &medoids)
            .unwrap();
        assert_close(affinity.get(0).unwrap(), 1.0);
        assert_close(affinity.get(1).unwrap(), 0.0);
    }

    #[test]
    fn test_recent_outlier_counts_more_than_old_outlier() {
        let medoids = medoids_of(&["1111", "0000"]);

        for position in 0..10 {
            let mut history = vec![fv("1111"); 10];
            history[position] = fv("0000");

            let affinity = AffinityScorer::new().score(&history, &medoids).unwrap();

            // Total weight is 5 * 1.0 + 5 * 0.8 = 9
            let expected = if position >= 5 { 1.0 / 9.0 } else { 0.8 / 9.0 };
            assert_close(affinity.get(1).unwrap(), expected);
            assert_close(affinity.get(0).unwrap(), 1.0 - expected);
        }
    }

    #[test]
    fn test_scores_sum_to_one() {
        let medoids = medoids_of(&["110000", "001100", "000011"]);
        let history = vec![fv("110000"), fv("011000"), fv("001110"), fv("000011"), fv("100001")];

        let affinity = AffinityScorer::new().score(&history, &medoids).unwrap();
        assert_eq!(affinity.len(), 3);
        assert_close(affinity.scores().iter().sum(), 1.0);
        assert!(affinity.scores().iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn test_empty_history() {
        let medoids = medoids_of(&["10", "01"]);
        let err = AffinityScorer::new().score(&[], &medoids).unwrap_err();
        assert_eq!(err, EngineError::EmptyHistory);
    }

    #[test]
    fn test_all_distances_zero_skips_normalization() {
        // Two clusters with the same medoid; history identical to it
        let medoids = medoids_of(&["10", "10"]);
        let affinity = AffinityScorer::new()
            .score(&[fv("10"), fv("10")], &medoids)
            .unwrap();
        assert_eq!(affinity.scores(), &[0.5, 0.5]);
    }

    #[test]
    fn test_saturated_distances_are_degenerate() {
        let medoids = medoids_of(&["11"]);
        let err = AffinityScorer::new()
            .score(&[fv("00"), fv("00")], &medoids)
            .unwrap_err();
        assert_eq!(err, EngineError::DegenerateScore);
    }

    #[test]
    fn test_history_length_mismatch() {
        let medoids = medoids_of(&["101", "010"]);
        let err = AffinityScorer::new()
            .score(&[fv("10")], &medoids)
            .unwrap_err();
        assert_eq!(err, EngineError::LengthMismatch { left: 2, right: 3 });
    }

    #[test]
    fn test_invalid_block_size() {
        let medoids = medoids_of(&["10", "01"]);
        let err = AffinityScorer::new()
            .with_block_size(0)
            .score(&[fv("10")], &medoids)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn test_ranked_clusters_ties_by_label() {
        let affinity = AffinityVector::from_scores(vec![0.2, 0.4, 0.4]);
        assert_eq!(affinity.ranked_clusters(), vec![1, 2, 0]);

        let uniform = AffinityVector::uniform(4);
        assert_eq!(uniform.ranked_clusters(), vec![0, 1, 2, 3]);
        assert_close(uniform.scores().iter().sum(), 1.0);
        assert!(AffinityVector::uniform(0).is_empty());
    }
}
