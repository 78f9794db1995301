//! Synthetic consumption log: one random item per guest per day

use anyhow::{Result, bail};
use catalog::{CatalogItem, Guest, Transaction};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

pub const DEFAULT_NUM_DAYS: u32 = 31;

#[derive(Debug, Clone, Copy)]
pub struct TransactionSimulator {
    num_days: u32,
}

impl TransactionSimulator {
    pub fn new(num_days: u32) -> Self {
        Self { num_days }
    }

    /// Rows are ordered by day, then by guest in the given order.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        catalog: &[CatalogItem],
        guests: &[Guest],
        rng: &mut R,
    ) -> Result<Vec<Transaction>> {
        if catalog.is_empty() && !guests.is_empty() && self.num_days > 0 {
            bail!("cannot simulate transactions over an empty catalog");
        }

        let mut transactions = Vec::with_capacity(self.num_days as usize * guests.len());
        for day in 0..self.num_days {
            for guest in guests {
                if let Some(item) = catalog.choose(rng) {
                    transactions.push(Transaction {
                        day,
                        guest_id: guest.id,
                        serial_id: item.serial_id,
                    });
                }
            }
        }

        debug!(
            "Generated {} transactions for {} guests over {} days",
            transactions.len(),
            guests.len(),
            self.num_days
        );
        Ok(transactions)
    }
}

impl Default for TransactionSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_DAYS)
    }
}
