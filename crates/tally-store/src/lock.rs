//! # Table Locks
//!
//! Advisory, scoped, exclusive locks for table writes.
//!
//! ```text
//! products.csv        the table
//! products.csv.lock   exists while a writer holds the table
//! ```
//!
//! The lock file is created with create-new semantics, so exactly one
//! writer wins. Losers retry until the configured timeout and then fail
//! with [`StoreError::Locked`]. Dropping the guard removes the file.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// Guard for an exclusive table lock. Released on drop.
#[derive(Debug)]
pub struct TableLock {
    table: PathBuf,
    lock_path: PathBuf,
}

impl TableLock {
    /// Acquires the lock for `table`, waiting at most `timeout`.
    pub fn acquire(table: &Path, timeout: Duration) -> StoreResult<TableLock> {
        let lock_path = lock_path_for(table);
        let deadline = Instant::now() + timeout;

        loop {
            match OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&lock_path)
            {
                Ok(mut file) => {
                    // Owner pid helps when someone has to clear a stale lock by hand.
                    let _ = writeln!(file, "{}", std::process::id());
                    debug!(lock = %lock_path.display(), "Table lock acquired");
                    return Ok(TableLock {
                        table: table.to_path_buf(),
                        lock_path,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        warn!(lock = %lock_path.display(), "Timed out waiting for table lock");
                        return Err(StoreError::Locked {
                            path: table.to_path_buf(),
                        });
                    }
                    thread::sleep(RETRY_INTERVAL);
                }
                Err(e) => return Err(StoreError::io(&lock_path)(e)),
            }
        }
    }

    /// The table this guard protects.
    pub fn table(&self) -> &Path {
        &self.table
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for TableLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.lock_path) {
            warn!(lock = %self.lock_path.display(), error = %e, "Failed to release table lock");
        }
    }
}

/// `<table>.lock` next to the table.
pub fn lock_path_for(table: &Path) -> PathBuf {
    let mut name = table
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    table.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_path_for() {
        assert_eq!(
            lock_path_for(Path::new("data/products.csv")),
            PathBuf::from("data/products.csv.lock")
        );
    }

    #[test]
    fn test_lock_is_exclusive_and_released_on_drop() {
        let dir = tempdir().unwrap();
        let table = dir.path().join("products.csv");

        let guard = TableLock::acquire(&table, Duration::from_millis(50)).unwrap();
        assert!(guard.path().exists());
        assert_eq!(guard.table(), table.as_path());

        let second = TableLock::acquire(&table, Duration::from_millis(50));
        assert!(matches!(second, Err(StoreError::Locked { .. })));

        drop(guard);
        assert!(!lock_path_for(&table).exists());
        assert!(TableLock::acquire(&table, Duration::from_millis(50)).is_ok());
    }
}
