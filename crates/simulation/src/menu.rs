//! Synthetic daily menu
//!
//! Items rotate daily. A menu holds `daily_items` distinct items, and no
//! cluster may contribute more than `ceil(daily_items / num_clusters)` of
//! them, so the menu spreads across clusters.

use anyhow::{Result, bail};
use catalog::{CatalogItem, SerialId};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::debug;

pub const DEFAULT_DAILY_ITEMS: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct DailyMenuSimulator {
    daily_items: usize,
}

impl DailyMenuSimulator {
    pub fn new(daily_items: usize) -> Self {
        Self { daily_items }
    }

    /// Per-cluster cap for a catalog with `num_clusters` clusters
    pub fn repeat_limit(&self, num_clusters: usize) -> usize {
        self.daily_items.div_ceil(num_clusters.max(1))
    }

    /// Draw today's menu from `catalog`.
    ///
    /// Fails when the catalog cannot supply enough items under the cluster cap.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        catalog: &[CatalogItem],
        rng: &mut R,
    ) -> Result<Vec<SerialId>> {
        let num_clusters = catalog
            .iter()
            .map(|item| item.cluster_label + 1)
            .max()
            .unwrap_or(0);
        let limit = self.repeat_limit(num_clusters);

        let mut cluster_sizes = vec![0usize; num_clusters];
        for item in catalog {
            cluster_sizes[item.cluster_label] += 1;
        }
        let available: usize = cluster_sizes.iter().map(|&size| size.min(limit)).sum();
        if available < self.daily_items {
            bail!(
                "catalog can supply only {} menu items with at most {} per cluster, {} requested",
                available,
                limit,
                self.daily_items
            );
        }

        // Walking a random permutation and skipping full clusters is the same
        // as drawing at random and redrawing on a full cluster
        let mut order: Vec<usize> = (0..catalog.len()).collect();
        order.shuffle(rng);

        let mut per_cluster = vec![0usize; num_clusters];
        let mut menu = Vec::with_capacity(self.daily_items);
        for position in order {
            if menu.len() == self.daily_items {
                break;
            }
            let item = &catalog[position];
            if per_cluster[item.cluster_label] == limit {
                continue;
            }
            per_cluster[item.cluster_label] += 1;
            menu.push(item.serial_id);
        }

        debug!(
            "Generated daily menu of {} items (at most {} per cluster)",
            menu.len(),
            limit
        );
        Ok(menu)
    }
}

impl Default for DailyMenuSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_ITEMS)
    }
}
