//! # Record Store
//!
//! Generic table access over comma-separated flat files.
//!
//! ## File Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  product_id,name,price,stock     ← header row: field names and order    │
//! │  P001,Pen,10.00,10               ← one record per row                   │
//! │  P002,"Notebook, A5",45.50,3     ← quoting handled by the csv crate     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Fields are untyped at rest: a [`Record`] maps field name to text and the
//! repositories parse numbers on demand.
//!
//! ## Write Path
//! ```text
//! write_table(path, fields, records)
//!      │
//!      ├── create parent directory
//!      ├── acquire <path>.lock      (TableLock, bounded wait)
//!      ├── encode header + rows in memory
//!      ├── write <path>.tmp
//!      └── rename over <path>       (readers never see a half-written table)
//! ```
//!
//! ## Malformed Rows
//! A row whose field count disagrees with the header is skipped with a
//! warning by [`RecordStore::read_table`] and rejected with
//! [`StoreError::MalformedRecord`] by [`RecordStore::read_table_strict`].
//! Read-modify-write paths use the strict read so that rewriting a table
//! never silently drops a corrupt row.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::lock::TableLock;

/// One row keyed by header field name.
pub type Record = BTreeMap<String, String>;

/// Default time to wait for another writer to release a table.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(2);

/// Reads and writes whole tables.
#[derive(Debug, Clone)]
pub struct RecordStore {
    lock_timeout: Duration,
}

impl Default for RecordStore {
    fn default() -> Self {
        RecordStore::new(DEFAULT_LOCK_TIMEOUT)
    }
}

impl RecordStore {
    pub fn new(lock_timeout: Duration) -> Self {
        RecordStore { lock_timeout }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Reads every well-formed record. Missing file means an empty table.
    pub fn read_table(&self, path: &Path) -> StoreResult<Vec<Record>> {
        read_records(path, false)
    }

    /// Like [`RecordStore::read_table`], but the first malformed row fails
    /// the whole read.
    pub fn read_table_strict(&self, path: &Path) -> StoreResult<Vec<Record>> {
        read_records(path, true)
    }

    /// Header row of a table, or `None` if the file is missing or empty.
    pub fn read_header(&self, path: &Path) -> StoreResult<Option<Vec<String>>> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path)(e)),
        };
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(BufReader::new(file));
        let header = reader.headers().map_err(StoreError::csv(path))?;
        if header.is_empty() {
            return Ok(None);
        }
        Ok(Some(header.iter().map(str::to_string).collect()))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Takes the exclusive lock on a table. Hold the guard across a
    /// read-modify-write cycle and pass it to the `*_locked` writers.
    pub fn lock(&self, path: &Path) -> StoreResult<TableLock> {
        ensure_parent(path)?;
        TableLock::acquire(path, self.lock_timeout)
    }

    /// Replaces the whole table with `records` in `fields` order.
    ///
    /// A record missing a field is written with an empty value; keys not
    /// listed in `fields` are dropped.
    pub fn write_table(&self, path: &Path, fields: &[&str], records: &[Record]) -> StoreResult<()> {
        let guard = self.lock(path)?;
        self.write_table_locked(&guard, fields, records)
    }

    /// [`RecordStore::write_table`] for a caller already holding the lock.
    pub fn write_table_locked(
        &self,
        guard: &TableLock,
        fields: &[&str],
        records: &[Record],
    ) -> StoreResult<()> {
        let path = guard.table();

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(fields).map_err(StoreError::csv(path))?;
        for record in records {
            writer
                .write_record(project(record, fields))
                .map_err(StoreError::csv(path))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::io(path)(e.into_error()))?;

        atomic_write(path, &bytes)?;
        debug!(path = %path.display(), rows = records.len(), "Table written");
        Ok(())
    }

    /// Appends one record, writing the header first if the file is absent
    /// or empty. Uniqueness is not checked here.
    pub fn append_record(&self, path: &Path, fields: &[&str], record: &Record) -> StoreResult<()> {
        let guard = self.lock(path)?;
        self.append_record_locked(&guard, fields, record)
    }

    /// [`RecordStore::append_record`] for a caller already holding the lock.
    ///
    /// When the file already has a header, the record is laid out in that
    /// header's order.
    pub fn append_record_locked(
        &self,
        guard: &TableLock,
        fields: &[&str],
        record: &Record,
    ) -> StoreResult<()> {
        let path = guard.table();
        let existing = self.read_header(path)?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(StoreError::io(path))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());

        match &existing {
            Some(header) => {
                if !same_field_set(header, fields) {
                    warn!(
                        path = %path.display(),
                        expected = ?fields,
                        found = ?header,
                        "Table header differs from expected fields"
                    );
                }
                if !ends_with_newline(&mut file).map_err(StoreError::io(path))? {
                    file.write_all(b"\n").map_err(StoreError::io(path))?;
                }
                let order: Vec<&str> = header.iter().map(String::as_str).collect();
                writer
                    .write_record(project(record, &order))
                    .map_err(StoreError::csv(path))?;
            }
            None => {
                // An existing but blank file gets its header rewritten from scratch.
                file.set_len(0).map_err(StoreError::io(path))?;
                writer.write_record(fields).map_err(StoreError::csv(path))?;
                writer
                    .write_record(project(record, fields))
                    .map_err(StoreError::csv(path))?;
            }
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| StoreError::io(path)(e.into_error()))?;
        file.write_all(&bytes).map_err(StoreError::io(path))?;
        file.sync_all().map_err(StoreError::io(path))?;

        debug!(path = %path.display(), "Record appended");
        Ok(())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn read_records(path: &Path, strict: bool) -> StoreResult<Vec<Record>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "Table missing, treating as empty");
            return Ok(Vec::new());
        }
        Err(e) => return Err(StoreError::io(path)(e)),
    };

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(BufReader::new(file));
    let header = reader.headers().map_err(StoreError::csv(path))?.clone();

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let row = match result {
            Ok(row) => row,
            Err(e) if !strict && matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                warn!(path = %path.display(), error = %e, "Skipping undecodable row");
                skipped += 1;
                continue;
            }
            Err(e) => return Err(StoreError::csv(path)(e)),
        };

        if row.len() != header.len() {
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            if strict {
                return Err(StoreError::MalformedRecord {
                    path: path.to_path_buf(),
                    line,
                    expected: header.len(),
                    found: row.len(),
                });
            }
            warn!(
                path = %path.display(),
                line,
                expected = header.len(),
                found = row.len(),
                "Skipping malformed row"
            );
            skipped += 1;
            continue;
        }

        records.push(
            header
                .iter()
                .zip(row.iter())
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        );
    }

    debug!(path = %path.display(), rows = records.len(), skipped, "Table read");
    Ok(records)
}

fn project<'a>(record: &'a Record, fields: &[&str]) -> Vec<&'a str> {
    fields
        .iter()
        .map(|f| record.get(*f).map(String::as_str).unwrap_or(""))
        .collect()
}

fn same_field_set(header: &[String], fields: &[&str]) -> bool {
    header.len() == fields.len() && fields.iter().all(|f| header.iter().any(|h| h == f))
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn ensure_parent(path: &Path) -> StoreResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(StoreError::io(parent))
        }
        _ => Ok(()),
    }
}

/// Writes `data` next to `path` and renames it into place.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StoreResult<()> {
    let tmp = tmp_path_for(path);
    {
        let mut file = File::create(&tmp).map_err(StoreError::io(&tmp))?;
        file.write_all(data).map_err(StoreError::io(&tmp))?;
        file.sync_all().map_err(StoreError::io(&tmp))?;
    }
    fs::rename(&tmp, path).map_err(StoreError::io(path))
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Builds a record from `(field, value)` pairs.
pub fn record<K, V, I>(pairs: I) -> Record
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
