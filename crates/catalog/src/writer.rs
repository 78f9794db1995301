//! Writers producing the `::` separated files the parser reads.

use crate::error::Result;
use crate::parser::{
    GUESTS_FILE, ITEMS_FILE, MENU_FILE, META_FILE, NUM_CLUSTERS_KEY, TRANSACTIONS_FILE,
};
use crate::types::*;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

fn create(path: &Path) -> Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

pub fn write_items(path: &Path, items: &[CatalogItem]) -> Result<()> {
    let mut out = create(path)?;
    for item in items {
        writeln!(out, "{}::{}::{}", item.serial_id, item.cluster_label, item.features)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_guests(path: &Path, guests: &[Guest]) -> Result<()> {
    let mut out = create(path)?;
    for guest in guests {
        writeln!(out, "{}::{}", guest.id, guest.name)?;
    }
    out.flush()?;
    Ok(())
}

/// Transactions are written in the order given, which the parser treats as chronological
pub fn write_transactions(path: &Path, transactions: &[Transaction]) -> Result<()> {
    let mut out = create(path)?;
    for tx in transactions {
        writeln!(out, "{}::{}::{}", tx.day, tx.guest_id, tx.serial_id)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_menu(path: &Path, menu: &[SerialId]) -> Result<()> {
    let mut out = create(path)?;
    for serial_id in menu {
        writeln!(out, "{}", serial_id)?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_meta(path: &Path, num_clusters: usize) -> Result<()> {
    let mut out = create(path)?;
    writeln!(out, "{}::{}", NUM_CLUSTERS_KEY, num_clusters)?;
    out.flush()?;
    Ok(())
}

/// Write all dataset files into `data_dir`, creating it if needed
pub fn write_dataset(
    data_dir: &Path,
    num_clusters: usize,
    items: &[CatalogItem],
    guests: &[Guest],
    transactions: &[Transaction],
    menu: &[SerialId],
) -> Result<()> {
    fs::create_dir_all(data_dir)?;
    write_meta(&data_dir.join(META_FILE), num_clusters)?;
    write_items(&data_dir.join(ITEMS_FILE), items)?;
    write_guests(&data_dir.join(GUESTS_FILE), guests)?;
    write_transactions(&data_dir.join(TRANSACTIONS_FILE), transactions)?;
    write_menu(&data_dir.join(MENU_FILE), menu)?;
    debug!(
        "Wrote dataset to {:?}: {} clusters, {} items, {} guests, {} transactions, {} menu entries",
        data_dir,
        num_clusters,
        items.len(),
        guests.len(),
        transactions.len(),
        menu.len()
    );
    Ok(())
}
