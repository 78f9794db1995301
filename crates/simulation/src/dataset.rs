//! A complete simulated dataset: catalog, guests, transactions and menu

use crate::guests::GuestDirectorySimulator;
use crate::keywords::{DEFAULT_KEYWORDS_PER_CLUSTER, KeywordCatalogSimulator};
use crate::menu::{DEFAULT_DAILY_ITEMS, DailyMenuSimulator};
use crate::transactions::{DEFAULT_NUM_DAYS, TransactionSimulator};
use anyhow::{Context, Result};
use catalog::{CatalogItem, Guest, SerialId, Transaction};
use rand::Rng;
use std::path::Path;
use tracing::info;

/// Sizes of a simulated dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationParams {
    pub num_clusters: usize,
    pub items_per_cluster: usize,
    pub keywords_per_cluster: usize,
    pub num_guests: usize,
    pub num_days: u32,
    pub daily_items: usize,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            num_clusters: 7,
            items_per_cluster: 7,
            keywords_per_cluster: DEFAULT_KEYWORDS_PER_CLUSTER,
            num_guests: 10,
            num_days: DEFAULT_NUM_DAYS,
            daily_items: DEFAULT_DAILY_ITEMS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulatedDataset {
    /// Declared cluster count, written to meta.dat
    pub num_clusters: usize,
    pub items: Vec<CatalogItem>,
    pub guests: Vec<Guest>,
    pub transactions: Vec<Transaction>,
    pub menu: Vec<SerialId>,
}

impl SimulatedDataset {
    /// Generate every part of the dataset from one random source.
    pub fn generate<R: Rng + ?Sized>(params: &SimulationParams, rng: &mut R) -> Result<Self> {
        let items = KeywordCatalogSimulator::new(params.num_clusters, params.items_per_cluster)
            .with_keywords_per_cluster(params.keywords_per_cluster)
            .generate(rng)
            .context("Failed to simulate keyword catalog")?;

        let guests = GuestDirectorySimulator::default().generate(params.num_guests);

        let transactions = TransactionSimulator::new(params.num_days)
            .generate(&items, &guests, rng)
            .context("Failed to simulate transactions")?;

        let menu = DailyMenuSimulator::new(params.daily_items)
            .generate(&items, rng)
            .context("Failed to simulate daily menu")?;

        info!(
            "Simulated {} items, {} guests, {} transactions, {} menu items",
            items.len(),
            guests.len(),
            transactions.len(),
            menu.len()
        );

        Ok(Self {
            num_clusters: params.num_clusters,
            items,
            guests,
            transactions,
            menu,
        })
    }

    /// Write the dataset files into `data_dir`, creating it if needed.
    pub fn write_to_dir(&self, data_dir: &Path) -> Result<()> {
        catalog::writer::write_dataset(
            data_dir,
            self.num_clusters,
            &self.items,
            &self.guests,
            &self.transactions,
            &self.menu,
        )
        .with_context(|| format!("Failed to write dataset to {}", data_dir.display()))
    }
}
