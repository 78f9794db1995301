//! Synthetic keyword catalog
//!
//! Every cluster owns a native block of `keywords_per_cluster` columns.
//! An item starts with `ones_ratio * keywords_per_cluster` ones shuffled
//! into its native block; `mutation_prob * keywords_per_cluster` of those
//! ones are then moved to random columns outside the block. Items of one
//! cluster therefore share most keywords without being identical.

use anyhow::{Result, bail};
use catalog::{CatalogItem, FeatureVector, SerialId};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::debug;

pub const DEFAULT_KEYWORDS_PER_CLUSTER: usize = 10;
pub const DEFAULT_ONES_RATIO: f64 = 1.0;
pub const DEFAULT_MUTATION_PROB: f64 = 0.3;

#[derive(Debug, Clone)]
pub struct KeywordCatalogSimulator {
    num_clusters: usize,
    items_per_cluster: usize,
    keywords_per_cluster: usize,
    ones_ratio: f64,
    mutation_prob: f64,
}

impl KeywordCatalogSimulator {
    pub fn new(num_clusters: usize, items_per_cluster: usize) -> Self {
        Self {
            num_clusters,
            items_per_cluster,
            keywords_per_cluster: DEFAULT_KEYWORDS_PER_CLUSTER,
            ones_ratio: DEFAULT_ONES_RATIO,
            mutation_prob: DEFAULT_MUTATION_PROB,
        }
    }

    /// Configure the native block width (default: 10)
    pub fn with_keywords_per_cluster(mut self, keywords: usize) -> Self {
        self.keywords_per_cluster = keywords;
        self
    }

    /// Configure the share of the native block set to 1 (default: 1.0)
    pub fn with_ones_ratio(mut self, ratio: f64) -> Self {
        self.ones_ratio = ratio;
        self
    }

    /// Configure the share of the native block moved elsewhere (default: 0.3)
    pub fn with_mutation_prob(mut self, prob: f64) -> Self {
        self.mutation_prob = prob;
        self
    }

    /// Total number of keyword columns
    pub fn feature_len(&self) -> usize {
        self.num_clusters * self.keywords_per_cluster
    }

    fn ones_per_item(&self) -> usize {
        (self.ones_ratio * self.keywords_per_cluster as f64) as usize
    }

    fn moved_per_item(&self) -> usize {
        // A single cluster has nowhere to move keywords to
        if self.num_clusters < 2 {
            return 0;
        }
        (self.mutation_prob * self.keywords_per_cluster as f64) as usize
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_clusters == 0 || self.items_per_cluster == 0 || self.keywords_per_cluster == 0 {
            bail!(
                "clusters, items per cluster and keywords per cluster must all be positive \
                 (got {}, {}, {})",
                self.num_clusters,
                self.items_per_cluster,
                self.keywords_per_cluster
            );
        }
        if !(0.0..=1.0).contains(&self.ones_ratio) {
            bail!("ones_ratio must be in [0, 1], got {}", self.ones_ratio);
        }
        if !(0.0..=1.0).contains(&self.mutation_prob) {
            bail!("mutation_prob must be in [0, 1], got {}", self.mutation_prob);
        }
        if self.moved_per_item() > self.ones_per_item() {
            bail!(
                "cannot move {} keywords when items only have {}",
                self.moved_per_item(),
                self.ones_per_item()
            );
        }
        Ok(())
    }

    /// Generate the catalog, cluster by cluster, with serial ids from 0.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<CatalogItem>> {
        self.validate()?;

        let block = self.keywords_per_cluster;
        let num_ones = self.ones_per_item();
        let num_moved = self.moved_per_item();
        let mut items = Vec::with_capacity(self.num_clusters * self.items_per_cluster);

        for cluster in 0..self.num_clusters {
            let native = cluster * block..(cluster + 1) * block;
            let non_native: Vec<usize> = (0..self.feature_len())
                .filter(|column| !native.contains(column))
                .collect();

            for _ in 0..self.items_per_cluster {
                let mut native_bits: Vec<bool> = (0..block).map(|i| i < num_ones).collect();
                native_bits.shuffle(rng);

                let mut features = FeatureVector::zeros(self.feature_len());
                for (offset, &bit) in native_bits.iter().enumerate() {
                    features.set(native.start + offset, bit);
                }

                let ones: Vec<usize> = native
                    .clone()
                    .filter(|&column| features.get(column) == Some(true))
                    .collect();
                let moved_from: Vec<usize> =
                    ones.choose_multiple(rng, num_moved).copied().collect();
                let moved_to: Vec<usize> =
                    non_native.choose_multiple(rng, num_moved).copied().collect();
                for (&from, &to) in moved_from.iter().zip(&moved_to) {
                    features.set(from, false);
                    features.set(to, true);
                }

                items.push(CatalogItem {
                    serial_id: items.len() as SerialId,
                    cluster_label: cluster,
                    features,
                });
            }
        }

        debug!(
            "Generated {} items over {} keywords ({} ones, {} moved per item)",
            items.len(),
            self.feature_len(),
            num_ones,
            num_moved
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn native_ones(item: &CatalogItem, block: usize) -> usize {
        let start = item.cluster_label * block;
        (start..start + block)
            .filter(|&c| item.features.get(c) == Some(true))
            .count()
    }

    #[test]
    fn test_catalog_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let items = KeywordCatalogSimulator::new(3, 4).generate(&mut rng).unwrap();

        assert_eq!(items.len(), 12);
        for (position, item) in items.iter().enumerate() {
            assert_eq!(item.serial_id, position as u32);
            assert_eq!(item.cluster_label, position / 4);
            assert_eq!(item.features.len(), 30);
            // 10 ones, 3 of them moved out of the native block
            assert_eq!(item.features.count_ones(), 10);
            assert_eq!(native_ones(item, 10), 7);
        }
    }

    #[test]
    fn test_without_mutation_keywords_stay_native() {
        let mut rng = StdRng::seed_from_u64(2);
        let items = KeywordCatalogSimulator::new(4, 3)
            .with_ones_ratio(0.5)
            .with_mutation_prob(0.0)
            .generate(&mut rng)
            .unwrap();

        for item in &items {
            assert_eq!(item.features.count_ones(), 5);
            assert_eq!(native_ones(item, 10), 5);
        }
    }

    #[test]
    fn test_single_cluster_skips_mutation() {
        let mut rng = StdRng::seed_from_u64(3);
        let items = KeywordCatalogSimulator::new(1, 5).generate(&mut rng).unwrap();
        assert!(items.iter().all(|item| item.features.count_ones() == 10));
    }

    #[test]
    fn test_same_seed_same_catalog() {
        let simulator = KeywordCatalogSimulator::new(5, 5);
        let first = simulator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
        let second = simulator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_invalid_parameters() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(KeywordCatalogSimulator::new(0, 5).generate(&mut rng).is_err());
        assert!(
            KeywordCatalogSimulator::new(2, 2)
                .with_ones_ratio(1.5)
                .generate(&mut rng)
                .is_err()
        );
        // 2 ones but 5 to move
        assert!(
            KeywordCatalogSimulator::new(2, 2)
                .with_ones_ratio(0.2)
                .with_mutation_prob(0.5)
                .generate(&mut rng)
                .is_err()
        );
    }
}
