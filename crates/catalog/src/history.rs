//! Build a guest's consumption history from the CatalogIndex
//!
//! The history is what the affinity scorer and the selector consume:
//! the chronological feature vectors, the chronological serial ids, and
//! a set of those ids for O(1) "already tried" checks.

use crate::error::{CatalogError, Result};
use crate::types::*;
use serde::Serialize;
use std::collections::HashSet;

/// Everything the engine needs to know about one guest's past
#[derive(Debug, Clone, Serialize)]
pub struct GuestHistory {
    pub guest: Guest,
    /// Serial ids consumed, oldest first
    pub serial_ids: Vec<SerialId>,
    /// Feature vector of each consumed item, aligned with `serial_ids`
    pub features: Vec<FeatureVector>,
    /// Distinct serial ids consumed
    pub seen: HashSet<SerialId>,
}

impl GuestHistory {
    pub fn len(&self) -> usize {
        self.serial_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serial_ids.is_empty()
    }
}

/// Build a GuestHistory from the CatalogIndex for a given guest
///
/// Fails with `MissingReference` if the guest is not in the directory.
/// A guest without transactions yields an empty history, not an error.
pub fn build_guest_history(index: &CatalogIndex, guest_id: GuestId) -> Result<GuestHistory> {
    let guest = index
        .get_guest(guest_id)
        .ok_or_else(|| CatalogError::MissingReference {
            entity: "Guest".to_string(),
            id: guest_id,
        })?
        .clone();

    let transactions = index.get_guest_transactions(guest_id);
    let mut serial_ids = Vec::with_capacity(transactions.len());
    let mut features = Vec::with_capacity(transactions.len());

    for tx in transactions {
        let item = index
            .get_item(tx.serial_id)
            .ok_or_else(|| CatalogError::MissingReference {
                entity: "Item".to_string(),
                id: tx.serial_id,
            })?;
        serial_ids.push(tx.serial_id);
        features.push(item.features.clone());
    }

    let seen = serial_ids.iter().copied().collect();

    Ok(GuestHistory {
        guest,
        serial_ids,
        features,
        seen,
    })
}
