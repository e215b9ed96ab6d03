//! # Admin Repository
//!
//! Read-only credential check against `admin.csv` (`username,password`).

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::StoreResult;
use crate::table::RecordStore;

/// Column order of `admin.csv`.
pub const ADMIN_FIELDS: [&str; 2] = ["username", "password"];

#[derive(Debug, Clone)]
pub struct AdminRepository {
    path: PathBuf,
    store: RecordStore,
}

impl AdminRepository {
    pub fn new(path: impl Into<PathBuf>, store: RecordStore) -> Self {
        AdminRepository {
            path: path.into(),
            store,
        }
    }

    /// True when some row matches both username and password.
    ///
    /// A missing `admin.csv` means nobody can log in as admin.
    pub fn authenticate(&self, username: &str, password: &str) -> StoreResult<bool> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "Admin file missing, admin login disabled");
            return Ok(false);
        }

        let ok = self.store.read_table(&self.path)?.iter().any(|r| {
            r.get("username").map(|v| v.trim()) == Some(username.trim())
                && r.get("password").map(String::as_str) == Some(password)
        });

        if ok {
            debug!(username = %username, "Admin authenticated");
        } else {
            warn!(username = %username, "Admin login failed");
        }
        Ok(ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_authenticate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("admin.csv");
        fs::write(&path, "username,password\nadmin,admin123\n").unwrap();
        let admins = AdminRepository::new(path, RecordStore::default());

        assert!(admins.authenticate("admin", "admin123").unwrap());
        assert!(!admins.authenticate("admin", "nope").unwrap());
        assert!(!admins.authenticate("root", "admin123").unwrap());
    }

    #[test]
    fn test_missing_file_denies() {
        let dir = tempdir().unwrap();
        let admins = AdminRepository::new(dir.path().join("admin.csv"), RecordStore::default());
        assert!(!admins.authenticate("admin", "admin123").unwrap());
    }
}
