//! # Bill Artifacts
//!
//! Writes the two files of a bill under the bills directory.
//!
//! ```text
//! bills/
//! ├── bill_12_10_2025_C1_10_45_00.txt     fixed-width invoice
//! └── bill_12_10_2025_C1_10_45_00.csv     tabular bill
//! ```
//!
//! Files are opened create-new. If the name is already taken (two bills for
//! one customer within a second) the bill id is appended to the stem, so an
//! earlier bill is never overwritten.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tally_core::Bill;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Paths of one written bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillArtifacts {
    pub bill_id: String,
    pub text_path: PathBuf,
    pub table_path: PathBuf,
}

/// Writes bill artifacts into one directory.
#[derive(Debug, Clone)]
pub struct BillWriter {
    dir: PathBuf,
    title: String,
}

impl BillWriter {
    pub fn new(dir: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        BillWriter {
            dir: dir.into(),
            title: title.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Renders and writes both artifacts.
    ///
    /// Either both files exist afterwards or neither does.
    pub fn write(&self, bill: &Bill) -> StoreResult<BillArtifacts> {
        fs::create_dir_all(&self.dir).map_err(StoreError::io(&self.dir))?;

        let stem = self.free_stem(bill);
        let text_path = self.dir.join(format!("{}.txt", stem));
        let table_path = self.dir.join(format!("{}.csv", stem));

        let text = bill.render_text(&self.title);
        write_new(&text_path, |file| {
            file.write_all(text.as_bytes())
                .and_then(|_| file.sync_all())
                .map_err(StoreError::io(&text_path))
        })?;

        if let Err(e) = write_table_file(&table_path, bill) {
            discard(&text_path);
            return Err(e);
        }

        debug!(bill_id = %bill.bill_id, path = %text_path.display(), "Bill written");
        Ok(BillArtifacts {
            bill_id: bill.bill_id.clone(),
            text_path,
            table_path,
        })
    }

    fn free_stem(&self, bill: &Bill) -> String {
        let stem = bill_stem(bill);
        let taken = ["txt", "csv"]
            .iter()
            .any(|ext| self.dir.join(format!("{}.{}", stem, ext)).exists());
        if taken {
            format!("{}_{}", stem, bill.bill_id)
        } else {
            stem
        }
    }
}

/// `bill_<DD_MM_YYYY>_<customer>_<HH_MM_SS>`
pub fn bill_stem(bill: &Bill) -> String {
    format!(
        "bill_{}_{}_{}",
        bill.issued_at.format("%d_%m_%Y"),
        sanitize(&bill.customer_id),
        bill.issued_at.format("%H_%M_%S")
    )
}

/// Keeps a customer id safe to embed in a file name.
fn sanitize(id: &str) -> String {
    let cleaned: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if cleaned.is_empty() {
        "unknown".to_string()
    } else {
        cleaned
    }
}

fn create_new(path: &Path) -> StoreResult<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == ErrorKind::AlreadyExists {
                warn!(path = %path.display(), "Bill file appeared while writing");
            }
            StoreError::io(path)(e)
        })
}

/// Creates `path` and fills it. If `fill` fails the file is removed again,
/// so a failed write never leaves a truncated artifact behind.
fn write_new(path: &Path, fill: impl FnOnce(&mut File) -> StoreResult<()>) -> StoreResult<()> {
    let mut file = create_new(path)?;
    let result = fill(&mut file);
    drop(file);
    if result.is_err() {
        discard(path);
    }
    result
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Could not remove partial bill file");
    }
}

fn write_table_file(path: &Path, bill: &Bill) -> StoreResult<()> {
    write_new(path, |file| {
        let mut writer = csv::Writer::from_writer(file);
        for row in bill.tabular_rows() {
            writer.write_record(&row).map_err(StoreError::csv(path))?;
        }
        writer.flush().map_err(StoreError::io(path))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tally_core::{CartLine, Money, Order, Product};
    use tempfile::tempdir;

    fn bill(customer: &str) -> Bill {
        let pen = Product::new("P001", "Pen", Money::from_cents(1000), 10);
        let order = Order {
            order_id: "ORD1760264700".to_string(),
            customer_id: customer.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 10, 12).unwrap(),
            lines: vec![CartLine::from_product(&pen, 3)],
            total: Money::from_cents(3000),
        };
        let at = NaiveDate::from_ymd_opt(2025, 10, 12)
            .unwrap()
            .and_hms_opt(10, 45, 0)
            .unwrap();
        Bill::for_order(&order, "INV20251012104500AB12", at)
    }

    #[test]
    fn test_write_creates_both_files() {
        let dir = tempdir().unwrap();
        let writer = BillWriter::new(dir.path().join("bills"), "SHOP");

        let artifacts = writer.write(&bill("C1")).unwrap();

        assert!(artifacts
            .text_path
            .ends_with("bill_12_10_2025_C1_10_45_00.txt"));
        let text = fs::read_to_string(&artifacts.text_path).unwrap();
        assert!(text.contains("TOTAL                                   30.00"));

        let table = fs::read_to_string(&artifacts.table_path).unwrap();
        assert!(table.starts_with("Bill ID,INV20251012104500AB12,,\n"));
        assert!(table.contains("Item Name,Quantity,Price,Subtotal\nPen,3,10.00,30.00\n,,,\n,,TOTAL,30.00\n"));
    }

    #[test]
    fn test_name_clash_appends_bill_id() {
        let dir = tempdir().unwrap();
        let writer = BillWriter::new(dir.path(), "SHOP");

        let first = writer.write(&bill("C1")).unwrap();
        let second = writer.write(&bill("C1")).unwrap();

        assert_ne!(first.text_path, second.text_path);
        assert!(second
            .text_path
            .ends_with("bill_12_10_2025_C1_10_45_00_INV20251012104500AB12.txt"));
        assert!(first.text_path.exists());
    }

    #[test]
    fn test_failed_fill_removes_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bill.txt");

        let err = write_new(&path, |file| {
            file.write_all(b"HALF A BI").map_err(StoreError::io(&path))?;
            Err(StoreError::io(&path)(std::io::Error::new(
                ErrorKind::WriteZero,
                "disk full",
            )))
        })
        .unwrap_err();

        assert!(matches!(err, StoreError::Io { .. }));
        assert!(!path.exists());
    }

    #[test]
    fn test_existing_file_is_never_discarded() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bill.txt");
        fs::write(&path, "earlier bill").unwrap();

        assert!(write_new(&path, |_| Ok(())).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "earlier bill");
    }

    #[test]
    fn test_customer_id_is_sanitized() {
        assert_eq!(bill_stem(&bill("../x y")), "bill_12_10_2025____x_y_10_45_00");
        assert_eq!(bill_stem(&bill("")), "bill_12_10_2025_unknown_10_45_00");
    }
}
