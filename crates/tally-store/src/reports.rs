//! # Reports
//!
//! Sales and low-stock reports, returned as data and saved as CSV under the
//! reports directory.
//!
//! ```text
//! reports/report_20251012_180000.csv            sales in a date range
//! order_id,customer_id,date,total
//! ORD1760264700,C1,2025-10-12,30.00
//! ,,,
//! TOTAL SALES,,,30.00
//!
//! reports/low_stock_report_20251012_180000.csv  stock below threshold
//! product_id,name,price,stock
//! P002,Ink,2.50,1
//! ,,,
//! TOTAL LOW STOCK,,,1
//! ```
//!
//! Nothing is written when a report has no rows.

use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use tally_core::{Money, Product, SalesLogEntry, ValidationError};
use tracing::{info, warn};

use crate::error::StoreResult;
use crate::repository::product::{product_to_record, ProductRepository, RejectedRow, PRODUCT_FIELDS};
use crate::repository::sales::{SalesLedger, LEDGER_DATE_FORMAT, SALES_FIELDS};
use crate::table::{Record, RecordStore};

/// Sales between two dates, inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub rows: Vec<SalesLogEntry>,
    pub total: Money,
    /// Ledger rows ignored for an unreadable date or total.
    pub skipped: usize,
    pub path: Option<PathBuf>,
}

/// Products whose stock is under the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockReport {
    pub threshold: i64,
    pub products: Vec<Product>,
    /// Product ids whose row could not be read (e.g. stock `"abc"`).
    pub flagged: Vec<String>,
    pub path: Option<PathBuf>,
}

/// Builds reports from the product table and the sales ledger.
#[derive(Debug)]
pub struct Reports {
    products: ProductRepository,
    ledger: SalesLedger,
    store: RecordStore,
    dir: PathBuf,
}

impl Reports {
    pub fn new(
        products: ProductRepository,
        ledger: SalesLedger,
        store: RecordStore,
        dir: impl Into<PathBuf>,
    ) -> Self {
        Reports {
            products,
            ledger,
            store,
            dir: dir.into(),
        }
    }

    /// Sales with `from <= date <= to`.
    pub fn sales_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
        now: NaiveDateTime,
    ) -> StoreResult<SalesReport> {
        let read = self.ledger.read()?;
        let rows: Vec<SalesLogEntry> = read
            .entries
            .into_iter()
            .filter(|e| e.date >= from && e.date <= to)
            .collect();
        let total = Money::checked_sum(rows.iter().map(|e| e.total)).ok_or_else(|| {
            ValidationError::invalid("total", "sales total is too large to represent")
        })?;

        let path = if rows.is_empty() {
            None
        } else {
            let mut records: Vec<Record> = rows.iter().map(sales_record).collect();
            records.push(Record::new());
            records.push(summary(&SALES_FIELDS, "TOTAL SALES", total.to_plain_string()));
            Some(self.save("report", &SALES_FIELDS, &records, now)?)
        };

        info!(%from, %to, rows = rows.len(), total = %total, "Sales report built");
        Ok(SalesReport {
            from,
            to,
            rows,
            total,
            skipped: read.skipped,
            path,
        })
    }

    /// Products with `stock < threshold`, in table order.
    pub fn low_stock_report(&self, threshold: i64, now: NaiveDateTime) -> StoreResult<LowStockReport> {
        let scan = self.products.scan()?;
        let flagged: Vec<String> = scan.rejected.iter().map(flag).collect();
        let products: Vec<Product> = scan
            .products
            .into_iter()
            .filter(|p| p.is_low_stock(threshold))
            .collect();

        let path = if products.is_empty() {
            None
        } else {
            let mut records: Vec<Record> = products.iter().map(product_to_record).collect();
            records.push(Record::new());
            records.push(summary(
                &PRODUCT_FIELDS,
                "TOTAL LOW STOCK",
                products.len().to_string(),
            ));
            Some(self.save("low_stock_report", &PRODUCT_FIELDS, &records, now)?)
        };

        info!(threshold, low = products.len(), flagged = flagged.len(), "Low-stock report built");
        Ok(LowStockReport {
            threshold,
            products,
            flagged,
            path,
        })
    }

    fn save(
        &self,
        prefix: &str,
        fields: &[&str],
        records: &[Record],
        now: NaiveDateTime,
    ) -> StoreResult<PathBuf> {
        let path = free_path(&self.dir, prefix, now);
        self.store.write_table(&path, fields, records)?;
        Ok(path)
    }
}

fn sales_record(entry: &SalesLogEntry) -> Record {
    let mut record = Record::new();
    record.insert("order_id".to_string(), entry.order_id.clone());
    record.insert("customer_id".to_string(), entry.customer_id.clone());
    record.insert("date".to_string(), entry.date.format(LEDGER_DATE_FORMAT).to_string());
    record.insert("total".to_string(), entry.total.to_plain_string());
    record
}

/// Label in the first column, value in the last.
fn summary(fields: &[&str], label: &str, value: String) -> Record {
    let mut record = Record::new();
    if let (Some(first), Some(last)) = (fields.first(), fields.last()) {
        record.insert(first.to_string(), label.to_string());
        record.insert(last.to_string(), value);
    }
    record
}

fn flag(row: &RejectedRow) -> String {
    let id = row
        .record
        .get("product_id")
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .unwrap_or("<no id>");
    warn!(product_id = %id, reason = %row.reason, "Product flagged in low-stock report");
    id.to_string()
}

/// `<prefix>_<YYYYmmdd_HHMMSS>.csv`, with `_2`, `_3`... if already taken.
fn free_path(dir: &Path, prefix: &str, now: NaiveDateTime) -> PathBuf {
    let stem = format!("{}_{}", prefix, now.format("%Y%m%d_%H%M%S"));
    let mut path = dir.join(format!("{}.csv", stem));
    let mut n = 2;
    while path.exists() {
        path = dir.join(format!("{}_{}.csv", stem, n));
        n += 1;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::repository::product::ProductCatalog;
    use crate::store::Store;
    use std::fs;
    use tempfile::tempdir;

    fn at(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn evening() -> NaiveDateTime {
        at(2025, 10, 12).and_hms_opt(18, 0, 0).unwrap()
    }

    fn log(store: &Store, order_id: &str, date: NaiveDate, cents: i64) {
        store
            .sales()
            .append(&SalesLogEntry {
                order_id: order_id.to_string(),
                customer_id: "C1".to_string(),
                date,
                total: Money::from_cents(cents),
            })
            .unwrap();
    }

    #[test]
    fn test_sales_report_filters_and_totals() {
        let dir = tempdir().unwrap();
        let store = Store::open(StoreConfig::rooted_at(dir.path()));
        log(&store, "ORD1", at(2025, 10, 10), 1000);
        log(&store, "ORD2", at(2025, 10, 11), 2550);
        log(&store, "ORD3", at(2025, 10, 12), 450);

        let report = store
            .reports()
            .sales_report(at(2025, 10, 11), at(2025, 10, 12), evening())
            .unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.total, Money::from_cents(3000));

        let path = report.path.unwrap();
        assert!(path.ends_with("report_20251012_180000.csv"));
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "order_id,customer_id,date,total\n\
             ORD2,C1,2025-10-11,25.50\n\
             ORD3,C1,2025-10-12,4.50\n\
             ,,,\n\
             TOTAL SALES,,,30.00\n"
        );
    }

    #[test]
    fn test_sales_total_overflow_is_an_error() {
        let dir = tempdir().unwrap();
        let store = Store::open(StoreConfig::rooted_at(dir.path()));
        log(&store, "ORD1", at(2025, 10, 12), i64::MAX - 10);
        log(&store, "ORD2", at(2025, 10, 12), 100);

        let err = store
            .reports()
            .sales_report(at(2025, 10, 12), at(2025, 10, 12), evening())
            .unwrap_err();
        assert!(matches!(err, crate::error::StoreError::Validation(_)));
        assert!(!dir.path().join("reports").exists());
    }

    #[test]
    fn test_empty_sales_report_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = Store::open(StoreConfig::rooted_at(dir.path()));
        log(&store, "ORD1", at(2025, 10, 10), 1000);

        let report = store
            .reports()
            .sales_report(at(2025, 11, 1), at(2025, 11, 30), evening())
            .unwrap();

        assert!(report.rows.is_empty());
        assert_eq!(report.total, Money::zero());
        assert!(report.path.is_none());
        assert!(!store.config().reports_dir.exists());
    }

    #[test]
    fn test_low_stock_report_flags_unreadable_rows() {
        let dir = tempdir().unwrap();
        let store = Store::open(StoreConfig::rooted_at(dir.path()));
        fs::create_dir_all(&store.config().data_dir).unwrap();
        fs::write(
            store.config().products_path(),
            "product_id,name,price,stock\nP001,Pen,10.00,10\nP002,Ink,2.50,1\nP003,Tape,1.00,abc\nP004,Glue,3.00,2.0\nP005,Clip,0.50,-4\n",
        )
        .unwrap();

        let report = store.reports().low_stock_report(5, evening()).unwrap();

        let ids: Vec<&str> = report.products.iter().map(|p| p.product_id.as_str()).collect();
        assert_eq!(ids, vec!["P002", "P004"]);
        assert_eq!(report.flagged, vec!["P003".to_string(), "P005".to_string()]);
        assert_eq!(
            fs::read_to_string(report.path.unwrap()).unwrap(),
            "product_id,name,price,stock\nP002,Ink,2.50,1\nP004,Glue,3.00,2\n,,,\nTOTAL LOW STOCK,,,2\n"
        );
    }

    #[test]
    fn test_low_stock_report_none_low() {
        let dir = tempdir().unwrap();
        let store = Store::open(StoreConfig::rooted_at(dir.path()));
        store
            .products()
            .add(Product::new("P001", "Pen", Money::from_cents(1000), 10))
            .unwrap();

        let report = store.reports().low_stock_report(5, evening()).unwrap();

        assert!(report.products.is_empty());
        assert!(report.path.is_none());
    }

    #[test]
    fn test_report_names_do_not_clobber() {
        let dir = tempdir().unwrap();
        let first = free_path(dir.path(), "report", evening());
        fs::write(&first, "x").unwrap();

        let second = free_path(dir.path(), "report", evening());
        assert!(second.ends_with("report_20251012_180000_2.csv"));
    }
}
