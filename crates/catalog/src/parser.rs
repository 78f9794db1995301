//! Parser for the dataset files.
//!
//! Every file is plain text with `::` separated fields, one record per line:
//! - items.dat: serialId::clusterLabel::bits
//! - guests.dat: guestId::name
//! - transactions.dat: day::guestId::serialId
//! - menu.dat: serialId
//! - meta.dat: numClusters::count
//!
//! Blank lines are skipped and a record with more fields than its format
//! names is rejected. Line numbers in errors are 1-based.

use crate::error::{CatalogError, Result};
use crate::types::*;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

pub const ITEMS_FILE: &str = "items.dat";
pub const GUESTS_FILE: &str = "guests.dat";
pub const TRANSACTIONS_FILE: &str = "transactions.dat";
pub const MENU_FILE: &str = "menu.dat";
pub const META_FILE: &str = "meta.dat";

/// Key of the declared cluster count in meta.dat
pub const NUM_CLUSTERS_KEY: &str = "numClusters";

/// Read a whole file into lines, mapping a missing file to `FileNotFound`
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CatalogError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => CatalogError::IoError(e),
    })?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Non-empty trimmed lines paired with their 1-based line number
fn records(lines: &[String]) -> impl Iterator<Item = (usize, &str)> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Pull the next `::` field or report which one is missing
fn next_field<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts.next().ok_or_else(|| CatalogError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

/// Fail if a record still has fields after the ones its format names
fn end_of_record<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    file: &str,
    line: usize,
) -> Result<()> {
    match parts.next() {
        None => Ok(()),
        Some(extra) => Err(CatalogError::ParseError {
            file: file.to_string(),
            line,
            reason: format!("Unexpected trailing field '{}'", extra),
        }),
    }
}

/// Parse a field with `FromStr`, keeping the parser's message as the reason
fn parse_field<T>(value: &str, file: &str, line: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| CatalogError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

/// Parse the items.dat file
///
/// Format: serialId::clusterLabel::bits, e.g. `12::1::0010110000`
pub fn parse_items(path: &Path) -> Result<Vec<CatalogItem>> {
    let lines = read_lines(path)?;
    let mut items = Vec::new();

    for (line_no, line) in records(&lines) {
        let mut parts = line.split("::");

        let serial_id = next_field(&mut parts, ITEMS_FILE, line_no, "serialId")?;
        let cluster_label = next_field(&mut parts, ITEMS_FILE, line_no, "clusterLabel")?;
        let bits = next_field(&mut parts, ITEMS_FILE, line_no, "feature bits")?;
        end_of_record(&mut parts, ITEMS_FILE, line_no)?;

        items.push(CatalogItem {
            serial_id: parse_field(serial_id, ITEMS_FILE, line_no, "serialId")?,
            cluster_label: parse_field(cluster_label, ITEMS_FILE, line_no, "clusterLabel")?,
            features: parse_field(bits, ITEMS_FILE, line_no, "feature bits")?,
        });
    }

    Ok(items)
}

/// Parse the guests.dat file
///
/// Format: guestId::name
pub fn parse_guests(path: &Path) -> Result<Vec<Guest>> {
    let lines = read_lines(path)?;
    let mut guests = Vec::new();

    for (line_no, line) in records(&lines) {
        let mut parts = line.split("::");

        let id = next_field(&mut parts, GUESTS_FILE, line_no, "guestId")?;
        let name = next_field(&mut parts, GUESTS_FILE, line_no, "name")?;
        end_of_record(&mut parts, GUESTS_FILE, line_no)?;

        guests.push(Guest {
            id: parse_field(id, GUESTS_FILE, line_no, "guestId")?,
            name: name.trim().to_string(),
        });
    }

    Ok(guests)
}

/// Parse the transactions.dat file
///
/// Format: day::guestId::serialId. File order is chronological order.
pub fn parse_transactions(path: &Path) -> Result<Vec<Transaction>> {
    let lines = read_lines(path)?;
    let mut transactions = Vec::new();

    for (line_no, line) in records(&lines) {
        let mut parts = line.split("::");

        let day = next_field(&mut parts, TRANSACTIONS_FILE, line_no, "day")?;
        let guest_id = next_field(&mut parts, TRANSACTIONS_FILE, line_no, "guestId")?;
        let serial_id = next_field(&mut parts, TRANSACTIONS_FILE, line_no, "serialId")?;
        end_of_record(&mut parts, TRANSACTIONS_FILE, line_no)?;

        transactions.push(Transaction {
            day: parse_field(day, TRANSACTIONS_FILE, line_no, "day")?,
            guest_id: parse_field(guest_id, TRANSACTIONS_FILE, line_no, "guestId")?,
            serial_id: parse_field(serial_id, TRANSACTIONS_FILE, line_no, "serialId")?,
        });
    }

    Ok(transactions)
}

/// Parse the menu.dat file
///
/// Format: one serialId per line, in display order
pub fn parse_menu(path: &Path) -> Result<Vec<SerialId>> {
    let lines = read_lines(path)?;
    records(&lines)
        .map(|(line_no, line)| parse_field(line, MENU_FILE, line_no, "serialId"))
        .collect()
}

/// Parse the meta.dat file and return the declared cluster count
///
/// Format: `numClusters::7`. The key must appear exactly once.
pub fn parse_meta(path: &Path) -> Result<usize> {
    let lines = read_lines(path)?;
    let mut num_clusters = None;

    for (line_no, line) in records(&lines) {
        let mut parts = line.split("::");

        let key = next_field(&mut parts, META_FILE, line_no, "key")?;
        let value = next_field(&mut parts, META_FILE, line_no, "value")?;
        end_of_record(&mut parts, META_FILE, line_no)?;

        if key.trim() != NUM_CLUSTERS_KEY {
            return Err(CatalogError::ParseError {
                file: META_FILE.to_string(),
                line: line_no,
                reason: format!("Unknown key '{}'", key.trim()),
            });
        }
        if num_clusters.is_some() {
            return Err(CatalogError::ParseError {
                file: META_FILE.to_string(),
                line: line_no,
                reason: format!("Repeated key '{}'", NUM_CLUSTERS_KEY),
            });
        }
        num_clusters = Some(parse_field(value, META_FILE, line_no, NUM_CLUSTERS_KEY)?);
    }

    num_clusters.ok_or_else(|| CatalogError::InvalidValue {
        field: NUM_CLUSTERS_KEY.to_string(),
        value: format!("missing from {}", META_FILE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_items() {
        let file = write_temp("0::0::1100\n\n1::1::0011\n");
        let items = parse_items(file.path()).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[1].serial_id, 1);
        assert_eq!(items[1].cluster_label, 1);
        assert_eq!(items[1].features.to_string(), "0011");
    }

    #[test]
    fn test_parse_items_reports_line() {
        let file = write_temp("0::0::1100\n1::1::0021\n");
        let err = parse_items(file.path()).unwrap_err();

        match err {
            CatalogError::ParseError { line, file, .. } => {
                assert_eq!(line, 2);
                assert_eq!(file, ITEMS_FILE);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_transactions_missing_field() {
        let file = write_temp("0::100\n");
        let err = parse_transactions(file.path()).unwrap_err();
        assert!(err.to_string().contains("Missing serialId"));
    }

    #[test]
    fn test_parse_guests_and_menu() {
        let guests = write_temp("100::Ada Lovelace\n101::Alan Turing\n");
        let guests = parse_guests(guests.path()).unwrap();
        assert_eq!(guests[0].name, "Ada Lovelace");
        assert_eq!(guests[1].id, 101);

        let menu = write_temp("4\n9\n2\n");
        assert_eq!(parse_menu(menu.path()).unwrap(), vec![4, 9, 2]);
    }

    #[test]
    fn test_extra_fields_are_rejected() {
        let items = write_temp("0::0::1100\n1::0::1010::junk\n");
        let err = parse_items(items.path()).unwrap_err();
        match err {
            CatalogError::ParseError { line, reason, .. } => {
                assert_eq!(line, 2);
                assert!(reason.contains("junk"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let guests = write_temp("100::Ada::Lovelace\n");
        assert!(parse_guests(guests.path()).is_err());

        let transactions = write_temp("0::100::4::9\n");
        assert!(parse_transactions(transactions.path()).is_err());
    }

    #[test]
    fn test_parse_meta() {
        let meta = write_temp("numClusters::5\n");
        assert_eq!(parse_meta(meta.path()).unwrap(), 5);

        let unknown = write_temp("clusters::5\n");
        assert!(parse_meta(unknown.path()).is_err());

        let repeated = write_temp("numClusters::5\nnumClusters::6\n");
        assert!(parse_meta(repeated.path()).is_err());

        let empty = write_temp("\n");
        assert!(matches!(
            parse_meta(empty.path()).unwrap_err(),
            CatalogError::InvalidValue { .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = parse_menu(Path::new("does/not/exist/menu.dat")).unwrap_err();
        assert!(matches!(err, CatalogError::FileNotFound { .. }));
    }
}
