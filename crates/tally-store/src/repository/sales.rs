//! # Sales Ledger
//!
//! Append-only record of completed orders in `sales_log.csv`.
//!
//! ```text
//! order_id,customer_id,date,total
//! ORD1760264700,C1,2025-10-12,30.00
//! ```
//!
//! Dates are written as `YYYY-MM-DD`. Older ledgers edited in a spreadsheet
//! may contain `MM/DD/YYYY`; both are accepted on read.
//!
//! Order ids are handed out here too. The last number issued lives in
//! `order_seq.csv` next to the ledger and is bumped under that file's lock,
//! so two `tally` processes never get the same id:
//!
//! ```text
//! last_order
//! 1760264701
//! ```

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tally_core::ids::{next_order_number, order_id, parse_order_id};
use tally_core::{Money, SalesLogEntry};
use tracing::{debug, info, warn};

use crate::error::StoreResult;
use crate::table::{record, Record, RecordStore};

/// Column order of `sales_log.csv`.
pub const SALES_FIELDS: [&str; 4] = ["order_id", "customer_id", "date", "total"];

/// Format dates are written in.
pub const LEDGER_DATE_FORMAT: &str = "%Y-%m-%d";

/// File holding the last issued order number, in the ledger's directory.
pub const ORDER_SEQ_FILE: &str = "order_seq.csv";

const ORDER_SEQ_FIELDS: [&str; 1] = ["last_order"];

const ACCEPTED_DATE_FORMATS: [&str; 2] = [LEDGER_DATE_FORMAT, "%m/%d/%Y"];

/// Parses a ledger date in any accepted format.
pub fn parse_ledger_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    ACCEPTED_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

/// Ledger contents split into readable entries and a count of skipped rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRead {
    pub entries: Vec<SalesLogEntry>,
    pub skipped: usize,
}

fn entry_from_record(record: &Record) -> Result<SalesLogEntry, String> {
    let text = |field: &str| record.get(field).map(|v| v.trim()).unwrap_or("");

    let order_id = text("order_id");
    if order_id.is_empty() {
        return Err("missing order_id".to_string());
    }
    let date = parse_ledger_date(text("date"))
        .ok_or_else(|| format!("unreadable date '{}'", text("date")))?;
    let total: Money = text("total")
        .parse()
        .map_err(|_| format!("unreadable total '{}'", text("total")))?;

    Ok(SalesLogEntry {
        order_id: order_id.to_string(),
        customer_id: text("customer_id").to_string(),
        date,
        total,
    })
}

/// Whether a raw ledger row records `entry`. Order id, customer and total
/// must all agree; the date is left out since spreadsheets rewrite it.
fn row_records(record: &Record, entry: &SalesLogEntry) -> bool {
    let text = |field: &str| record.get(field).map(|v| v.trim()).unwrap_or("");
    text("order_id") == entry.order_id
        && text("customer_id") == entry.customer_id
        && text("total").parse::<Money>().ok() == Some(entry.total)
}

/// The sales ledger.
#[derive(Debug, Clone)]
pub struct SalesLedger {
    path: PathBuf,
    sequence_path: PathBuf,
    store: RecordStore,
}

impl SalesLedger {
    pub fn new(path: impl Into<PathBuf>, store: RecordStore) -> Self {
        let path = path.into();
        SalesLedger {
            sequence_path: path.with_file_name(ORDER_SEQ_FILE),
            path,
            store,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry.
    pub fn append(&self, entry: &SalesLogEntry) -> StoreResult<()> {
        let date = entry.date.format(LEDGER_DATE_FORMAT).to_string();
        let total = entry.total.to_plain_string();
        let row = record([
            ("order_id", entry.order_id.as_str()),
            ("customer_id", entry.customer_id.as_str()),
            ("date", date.as_str()),
            ("total", total.as_str()),
        ]);
        self.store.append_record(&self.path, &SALES_FIELDS, &row)?;

        info!(order_id = %entry.order_id, total = %entry.total, "Sale logged");
        Ok(())
    }

    /// Reads every entry, skipping rows with an unreadable date or total.
    pub fn read(&self) -> StoreResult<LedgerRead> {
        let mut read = LedgerRead::default();
        for record in self.store.read_table(&self.path)? {
            match entry_from_record(&record) {
                Ok(entry) => read.entries.push(entry),
                Err(reason) => {
                    warn!(path = %self.path.display(), %reason, "Skipping ledger row");
                    read.skipped += 1;
                }
            }
        }
        debug!(entries = read.entries.len(), skipped = read.skipped, "Ledger read");
        Ok(read)
    }

    pub fn entries(&self) -> StoreResult<Vec<SalesLogEntry>> {
        Ok(self.read()?.entries)
    }

    /// Whether a row for exactly this sale exists, readable date or not.
    ///
    /// A row that only shares the order id (another sale logged under a
    /// colliding id) does not count.
    pub fn contains_entry(&self, entry: &SalesLogEntry) -> StoreResult<bool> {
        let records = self.store.read_table(&self.path)?;
        let mut same_id = 0;
        for record in &records {
            if row_records(record, entry) {
                return Ok(true);
            }
            if record.get("order_id").map(|v| v.trim()) == Some(entry.order_id.as_str()) {
                same_id += 1;
            }
        }
        if same_id > 0 {
            warn!(
                order_id = %entry.order_id,
                rows = same_id,
                "Order id already logged for a different sale"
            );
        }
        Ok(false)
    }

    /// Highest `ORD<n>` number present in the ledger.
    pub fn last_order_number(&self) -> StoreResult<Option<i64>> {
        Ok(self
            .store
            .read_table(&self.path)?
            .iter()
            .filter_map(|r| r.get("order_id").and_then(|v| parse_order_id(v)))
            .max())
    }

    /// Issues the next order id and records it in `order_seq.csv`.
    ///
    /// The floor is the larger of the recorded number and the highest id in
    /// the ledger, so an edited or missing sequence file never causes reuse.
    /// Fails only if the sequence file cannot be locked, read or written.
    pub fn next_order_id(&self, now_secs: i64) -> StoreResult<String> {
        let guard = self.store.lock(&self.sequence_path)?;

        let recorded = self
            .store
            .read_table(&self.sequence_path)?
            .iter()
            .filter_map(|r| r.get("last_order").and_then(|v| v.trim().parse::<i64>().ok()))
            .max();
        // The ledger only raises the floor; an unreadable ledger is left for
        // the append step to report.
        let logged = match self.last_order_number() {
            Ok(logged) => logged,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Ledger unreadable while issuing order id");
                None
            }
        };
        let last = recorded.max(logged);

        let number = next_order_number(now_secs, last);
        let value = number.to_string();
        self.store.write_table_locked(
            &guard,
            &ORDER_SEQ_FIELDS,
            &[record([("last_order", value.as_str())])],
        )?;

        debug!(order_number = number, ?recorded, ?logged, "Order id issued");
        Ok(order_id(number))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn entry(order_id: &str, date: NaiveDate, cents: i64) -> SalesLogEntry {
        SalesLogEntry {
            order_id: order_id.to_string(),
            customer_id: "C1".to_string(),
            date,
            total: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_parse_ledger_date() {
        let expected = NaiveDate::from_ymd_opt(2025, 10, 12);
        assert_eq!(parse_ledger_date("2025-10-12"), expected);
        assert_eq!(parse_ledger_date("10/12/2025"), expected);
        assert_eq!(parse_ledger_date("12.10.2025"), None);
    }

    #[test]
    fn test_append_and_read() {
        let dir = tempdir().unwrap();
        let ledger = SalesLedger::new(dir.path().join("sales_log.csv"), RecordStore::default());
        let date = NaiveDate::from_ymd_opt(2025, 10, 12).unwrap();

        ledger.append(&entry("ORD1", date, 3000)).unwrap();

        assert_eq!(
            fs::read_to_string(ledger.path()).unwrap(),
            "order_id,customer_id,date,total\nORD1,C1,2025-10-12,30.00\n"
        );
        assert_eq!(ledger.entries().unwrap(), vec![entry("ORD1", date, 3000)]);
        assert!(ledger.contains_entry(&entry("ORD1", date, 3000)).unwrap());
        assert!(!ledger.contains_entry(&entry("ORD2", date, 3000)).unwrap());
    }

    #[test]
    fn test_contains_entry_needs_the_same_sale() {
        let dir = tempdir().unwrap();
        let ledger = SalesLedger::new(dir.path().join("sales_log.csv"), RecordStore::default());
        let date = NaiveDate::from_ymd_opt(2025, 10, 12).unwrap();
        let mut other_customer = entry("ORD1", date, 3000);
        other_customer.customer_id = "C2".to_string();

        ledger.append(&other_customer).unwrap();

        assert!(ledger.contains_entry(&other_customer).unwrap());
        assert!(!ledger.contains_entry(&entry("ORD1", date, 3000)).unwrap());
        assert!(!ledger.contains_entry(&entry("ORD1", date, 2999)).unwrap());
    }

    #[test]
    fn test_order_ids_survive_across_ledger_handles() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sales_log.csv");
        let first = SalesLedger::new(&path, RecordStore::default());
        let second = SalesLedger::new(&path, RecordStore::default());

        // Two handles stand in for two separate processes.
        assert_eq!(first.next_order_id(1_760_000_000).unwrap(), "ORD1760000000");
        assert_eq!(second.next_order_id(1_760_000_000).unwrap(), "ORD1760000001");
        assert_eq!(first.next_order_id(1_759_999_000).unwrap(), "ORD1760000002");
        assert_eq!(
            fs::read_to_string(dir.path().join(ORDER_SEQ_FILE)).unwrap(),
            "last_order\n1760000002\n"
        );
    }

    #[test]
    fn test_order_ids_start_above_the_ledger() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sales_log.csv");
        fs::write(
            &path,
            "order_id,customer_id,date,total\nORD1760000500,C1,2025-10-12,5.00\nmanual-7,C1,2025-10-12,1.00\n",
        )
        .unwrap();
        let ledger = SalesLedger::new(&path, RecordStore::default());

        assert_eq!(ledger.last_order_number().unwrap(), Some(1_760_000_500));
        assert_eq!(ledger.next_order_id(1_760_000_000).unwrap(), "ORD1760000501");
    }

    #[test]
    fn test_bad_rows_are_skipped_but_still_counted_for_contains() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sales_log.csv");
        fs::write(
            &path,
            "order_id,customer_id,date,total\nORD1,C1,10/12/2025,5.00\nORD2,C1,yesterday,1.00\nORD3,C1,2025-10-13,lots\n",
        )
        .unwrap();
        let ledger = SalesLedger::new(path, RecordStore::default());

        let read = ledger.read().unwrap();
        assert_eq!(read.entries.len(), 1);
        assert_eq!(read.skipped, 2);

        let unreadable_date = entry("ORD2", NaiveDate::from_ymd_opt(2025, 10, 11).unwrap(), 100);
        assert!(ledger.contains_entry(&unreadable_date).unwrap());
    }
}
