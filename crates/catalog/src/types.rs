//! Core domain types for the item catalog.
//!
//! This module defines the data structures shared by every other crate:
//! - Type aliases for domain clarity (SerialId, GuestId, ClusterLabel)
//! - FeatureVector, the binary keyword profile of one item
//! - Items, candidates, guests and transactions
//! - CatalogIndex, the in-memory store the loader fills

use crate::error::{CatalogError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================

/// Unique identifier for a catalog item
pub type SerialId = u32;

/// Unique identifier for a guest (simulated directories start at 100)
pub type GuestId = u32;

/// Cluster/genre an item belongs to, in `[0, num_clusters)`
pub type ClusterLabel = usize;

// =============================================================================
// Feature Vectors
// =============================================================================

/// Binary keyword profile of one catalog item.
///
/// Stored as `Vec<bool>` so every entry is 0 or 1 by construction.
/// All vectors in one catalog share the same length; that is checked by
/// `CatalogIndex::validate`, and comparing vectors of different lengths is
/// an error in the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureVector {
    bits: Vec<bool>,
}

impl FeatureVector {
    pub fn new(bits: Vec<bool>) -> Self {
        Self { bits }
    }

    /// All-zero vector of the given length
    pub fn zeros(len: usize) -> Self {
        Self::new(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.bits
    }

    pub fn get(&self, position: usize) -> Option<bool> {
        self.bits.get(position).copied()
    }

    pub fn set(&mut self, position: usize, value: bool) {
        self.bits[position] = value;
    }

    /// Number of keywords that apply to the item
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }
}

impl FromStr for FeatureVector {
    type Err = CatalogError;

    /// Parse a string of `0` and `1` characters, e.g. `"0110"`.
    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(CatalogError::InvalidValue {
                    field: "feature bit".to_string(),
                    value: other.to_string(),
                }),
            })
            .collect::<Result<Vec<bool>>>()
            .map(Self::new)
    }
}

impl fmt::Display for FeatureVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.bits {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

// =============================================================================
// Items and Candidates
// =============================================================================

/// One entry of the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub serial_id: SerialId,
    pub cluster_label: ClusterLabel,
    pub features: FeatureVector,
}

/// An item available today, tagged with its cluster.
///
/// Order matters: the selector scans candidates in the order given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CandidateItem {
    pub serial_id: SerialId,
    pub cluster_label: ClusterLabel,
}

impl CandidateItem {
    pub fn new(serial_id: SerialId, cluster_label: ClusterLabel) -> Self {
        Self {
            serial_id,
            cluster_label,
        }
    }
}

// =============================================================================
// Guests and Transactions
// =============================================================================

/// A guest from the guest directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub name: String,
}

/// One historical consumption: a guest took an item on a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Day index, 0 = first simulated day
    pub day: u32,
    pub guest_id: GuestId,
    pub serial_id: SerialId,
}

// =============================================================================
// CatalogIndex - The In-Memory Store
// =============================================================================

/// Holds the catalog, the guest directory, the transaction log and
/// today's menu, plus the lookup tables built over them.
///
/// Items keep catalog order in `items`; that order is what the medoid
/// tie-break and the cluster index follow.
#[derive(Debug)]
pub struct CatalogIndex {
    pub(crate) items: Vec<CatalogItem>,
    /// Position of each serial id in `items`
    pub(crate) item_positions: HashMap<SerialId, usize>,

    pub(crate) guests: BTreeMap<GuestId, Guest>,
    /// Transactions per guest, chronological
    pub(crate) guest_transactions: HashMap<GuestId, Vec<Transaction>>,

    /// Serial ids grouped by cluster, in catalog order
    pub(crate) cluster_index: BTreeMap<ClusterLabel, Vec<SerialId>>,

    pub(crate) daily_menu: Vec<CandidateItem>,

    /// Cluster count declared by the dataset, if any
    pub(crate) declared_clusters: Option<usize>,
}

impl CatalogIndex {
    /// Creates a new, empty CatalogIndex
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            item_positions: HashMap::new(),
            guests: BTreeMap::new(),
            guest_transactions: HashMap::new(),
            cluster_index: BTreeMap::new(),
            daily_menu: Vec::new(),
            declared_clusters: None,
        }
    }

    /// All items in catalog order
    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn get_item(&self, serial_id: SerialId) -> Option<&CatalogItem> {
        self.item_positions
            .get(&serial_id)
            .map(|&position| &self.items[position])
    }

    pub fn get_guest(&self, id: GuestId) -> Option<&Guest> {
        self.guests.get(&id)
    }

    /// All guests, ordered by id
    pub fn guests(&self) -> impl Iterator<Item = &Guest> {
        self.guests.values()
    }

    /// Get all transactions of a guest, oldest first
    ///
    /// Returns an empty slice if the guest has no history
    pub fn get_guest_transactions(&self, guest_id: GuestId) -> &[Transaction] {
        self.guest_transactions
            .get(&guest_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Get all items of a cluster, in catalog order
    pub fn get_items_by_cluster(&self, cluster: ClusterLabel) -> &[SerialId] {
        self.cluster_index
            .get(&cluster)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Today's candidate set
    pub fn daily_menu(&self) -> &[CandidateItem] {
        &self.daily_menu
    }

    /// Number of clusters in the catalog.
    ///
    /// The declared count wins when one was set; otherwise it is the highest
    /// label + 1. A declared count can exceed what the items use, which
    /// leaves trailing clusters empty.
    pub fn num_clusters(&self) -> usize {
        if let Some(declared) = self.declared_clusters {
            return declared;
        }
        self.items
            .iter()
            .map(|item| item.cluster_label + 1)
            .max()
            .unwrap_or(0)
    }

    /// Length of the feature vectors, taken from the first item
    pub fn feature_len(&self) -> Option<usize> {
        self.items.first().map(|item| item.features.len())
    }

    /// Cluster count from the dataset, `None` when only derived from labels
    pub fn declared_clusters(&self) -> Option<usize> {
        self.declared_clusters
    }

    // Mutators used during loading and by tests

    pub fn set_declared_clusters(&mut self, num_clusters: usize) {
        self.declared_clusters = Some(num_clusters);
    }

    pub fn insert_item(&mut self, item: CatalogItem) {
        self.item_positions.insert(item.serial_id, self.items.len());
        self.items.push(item);
    }

    pub fn insert_guest(&mut self, guest: Guest) {
        self.guests.insert(guest.id, guest);
    }

    /// Append a transaction to the guest's history
    pub fn insert_transaction(&mut self, transaction: Transaction) {
        self.guest_transactions
            .entry(transaction.guest_id)
            .or_default()
            .push(transaction);
    }

    /// Replace today's menu, resolving each serial id's cluster through the catalog
    pub fn set_daily_menu(&mut self, serial_ids: &[SerialId]) -> Result<()> {
        let menu = serial_ids
            .iter()
            .map(|&serial_id| {
                self.get_item(serial_id)
                    .map(|item| CandidateItem::new(serial_id, item.cluster_label))
                    .ok_or_else(|| CatalogError::MissingReference {
                        entity: "Item".to_string(),
                        id: serial_id,
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        self.daily_menu = menu;
        Ok(())
    }

    /// Get counts for debugging/validation: (items, guests, transactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        let total_transactions = self.guest_transactions.values().map(|v| v.len()).sum();
        (self.items.len(), self.guests.len(), total_transactions)
    }
}

impl Default for CatalogIndex {
    fn default() -> Self {
        Self::new()
    }
}
