//! CatalogIndex building and validation.
//!
//! Builds the CatalogIndex from parsed files:
//! - Parse the dataset files in parallel
//! - Insert items, guests and transactions
//! - Keep each guest's history in chronological order
//! - Build the cluster index
//! - Validate references, cluster labels and the feature-length invariant

use crate::error::{CatalogError, Result};
use crate::parser;
use crate::types::*;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

impl CatalogIndex {
    /// Load a dataset directory (meta, items, guests, transactions, menu)
    ///
    /// This is the main entry point for loading data.
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading dataset from {:?}", data_dir);

        let items_path = data_dir.join(parser::ITEMS_FILE);
        let guests_path = data_dir.join(parser::GUESTS_FILE);
        let transactions_path = data_dir.join(parser::TRANSACTIONS_FILE);
        let menu_path = data_dir.join(parser::MENU_FILE);
        let meta_path = data_dir.join(parser::META_FILE);

        // Parallel parse via nested joins
        let ((items, guests), (transactions, (menu, num_clusters))) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_items(&items_path),
                    || parser::parse_guests(&guests_path),
                )
            },
            || {
                rayon::join(
                    || parser::parse_transactions(&transactions_path),
                    || {
                        rayon::join(
                            || parser::parse_menu(&menu_path),
                            || parser::parse_meta(&meta_path),
                        )
                    },
                )
            },
        );

        let items = items?;
        let guests = guests?;
        let transactions = transactions?;
        let menu = menu?;
        let num_clusters = num_clusters?;

        info!(
            "Parsed {} items in {} declared clusters, {} guests, {} transactions, {} menu entries",
            items.len(),
            num_clusters,
            guests.len(),
            transactions.len(),
            menu.len()
        );

        let mut index = CatalogIndex::new();
        index.set_declared_clusters(num_clusters);

        for item in items {
            index.insert_item(item);
        }

        for guest in guests {
            index.insert_guest(guest);
        }

        for transaction in transactions {
            index.insert_transaction(transaction);
        }

        index.order_transactions();
        index.build_secondary_indices();
        index.set_daily_menu(&menu)?;
        index.validate()?;

        let (items, guests, transactions) = index.counts();
        info!(
            "CatalogIndex built: {} items in {} clusters, {} guests, {} transactions",
            items,
            index.num_clusters(),
            guests,
            transactions
        );
        Ok(index)
    }

    /// Sort each guest's history by day.
    ///
    /// The sort is stable, so transactions on the same day keep file order.
    pub fn order_transactions(&mut self) {
        for history in self.guest_transactions.values_mut() {
            history.sort_by_key(|tx| tx.day);
        }
    }

    /// Build the cluster index after items are loaded
    pub fn build_secondary_indices(&mut self) {
        self.cluster_index.clear();
        for item in &self.items {
            self.cluster_index
                .entry(item.cluster_label)
                .or_default()
                .push(item.serial_id);
        }
        debug!("Indexed {} clusters", self.cluster_index.len());
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - Serial ids are unique
    /// - All feature vectors share one length
    /// - Cluster labels fall below the declared cluster count, if one is set
    /// - Every transaction references a known guest and item
    /// - Every menu entry references a known item
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.items.len());
        let expected_len = self.feature_len().unwrap_or(0);

        for item in &self.items {
            if !seen.insert(item.serial_id) {
                return Err(CatalogError::DuplicateId {
                    entity: "Item".to_string(),
                    id: item.serial_id,
                });
            }
            if item.features.len() != expected_len {
                return Err(CatalogError::FeatureLengthMismatch {
                    serial_id: item.serial_id,
                    expected: expected_len,
                    found: item.features.len(),
                });
            }
            if let Some(declared) = self.declared_clusters {
                if item.cluster_label >= declared {
                    return Err(CatalogError::InvalidValue {
                        field: "clusterLabel".to_string(),
                        value: format!(
                            "{} on item {} (dataset declares {} clusters)",
                            item.cluster_label, item.serial_id, declared
                        ),
                    });
                }
            }
        }

        for history in self.guest_transactions.values() {
            for tx in history {
                if !self.guests.contains_key(&tx.guest_id) {
                    return Err(CatalogError::MissingReference {
                        entity: "Guest".to_string(),
                        id: tx.guest_id,
                    });
                }
                if !self.item_positions.contains_key(&tx.serial_id) {
                    return Err(CatalogError::MissingReference {
                        entity: "Item".to_string(),
                        id: tx.serial_id,
                    });
                }
            }
        }

        for candidate in &self.daily_menu {
            if !self.item_positions.contains_key(&candidate.serial_id) {
                return Err(CatalogError::MissingReference {
                    entity: "Item".to_string(),
                    id: candidate.serial_id,
                });
            }
        }

        Ok(())
    }
}
