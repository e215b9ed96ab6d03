//! # Store Configuration
//!
//! Where the tables and artifacts live, plus a few tunables.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  <data_dir>/                                                            │
//! │  ├── products.csv      product_id,name,price,stock                      │
//! │  ├── customers.csv     customer_id,name,password                        │
//! │  ├── sales_log.csv     order_id,customer_id,date,total                  │
//! │  ├── order_seq.csv     last_order                                       │
//! │  └── admin.csv         username,password                                │
//! │                                                                         │
//! │  <bills_dir>/          bill_<date>_<customer>_<time>.{txt,csv}          │
//! │  <reports_dir>/        report_<ts>.csv, low_stock_report_<ts>.csv       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Environment Overrides
//! | Variable | Field |
//! |---|---|
//! | `TALLY_DATA_DIR` | `data_dir` |
//! | `TALLY_BILLS_DIR` | `bills_dir` |
//! | `TALLY_REPORTS_DIR` | `reports_dir` |
//! | `TALLY_STORE_TITLE` | `store_title` |
//! | `TALLY_LOW_STOCK_THRESHOLD` | `low_stock_threshold` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use tally_core::DEFAULT_LOW_STOCK_THRESHOLD;
use tracing::warn;

use crate::table::DEFAULT_LOCK_TIMEOUT;

pub const ENV_DATA_DIR: &str = "TALLY_DATA_DIR";
pub const ENV_BILLS_DIR: &str = "TALLY_BILLS_DIR";
pub const ENV_REPORTS_DIR: &str = "TALLY_REPORTS_DIR";
pub const ENV_STORE_TITLE: &str = "TALLY_STORE_TITLE";
pub const ENV_LOW_STOCK_THRESHOLD: &str = "TALLY_LOW_STOCK_THRESHOLD";

/// Title printed at the top of every text bill.
pub const DEFAULT_STORE_TITLE: &str = "INVENTORY MANAGEMENT SYSTEM";

/// Store configuration.
///
/// ## Example
/// ```rust
/// use tally_store::StoreConfig;
///
/// let config = StoreConfig::new("/srv/shop/data")
///     .bills_dir("/srv/shop/bills")
///     .low_stock_threshold(10);
/// assert!(config.products_path().ends_with("products.csv"));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Directory holding the four tables.
    /// Default: `data`
    pub data_dir: PathBuf,

    /// Directory for bill artifacts.
    /// Default: `bills`
    pub bills_dir: PathBuf,

    /// Directory for report artifacts.
    /// Default: `reports`
    pub reports_dir: PathBuf,

    /// Header line of the text bill.
    pub store_title: String,

    /// Products with stock strictly below this are "low".
    /// Default: 5
    pub low_stock_threshold: i64,

    /// Re-read the product table before every write instead of trusting the
    /// snapshot from the previous operation.
    /// Default: true
    pub reload_before_write: bool,

    /// How long a writer waits for another writer's table lock.
    /// Default: 2 seconds
    pub lock_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: PathBuf::from("data"),
            bills_dir: PathBuf::from("bills"),
            reports_dir: PathBuf::from("reports"),
            store_title: DEFAULT_STORE_TITLE.to_string(),
            low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            reload_before_write: true,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Creates a configuration rooted at `data_dir`, other fields default.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        StoreConfig {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Defaults with any `TALLY_*` environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary lookup. Split from
    /// [`StoreConfig::from_env`] so tests need not touch the process
    /// environment.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_BILLS_DIR) {
            self.bills_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_REPORTS_DIR) {
            self.reports_dir = PathBuf::from(dir);
        }
        if let Some(title) = lookup(ENV_STORE_TITLE) {
            self.store_title = title;
        }
        if let Some(raw) = lookup(ENV_LOW_STOCK_THRESHOLD) {
            match raw.trim().parse::<i64>() {
                Ok(threshold) if threshold >= 0 => self.low_stock_threshold = threshold,
                _ => warn!(
                    var = ENV_LOW_STOCK_THRESHOLD,
                    value = %raw,
                    "Ignoring invalid low-stock threshold"
                ),
            }
        }
        self
    }

    pub fn data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn bills_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.bills_dir = dir.into();
        self
    }

    pub fn reports_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.reports_dir = dir.into();
        self
    }

    pub fn store_title(mut self, title: impl Into<String>) -> Self {
        self.store_title = title.into();
        self
    }

    pub fn low_stock_threshold(mut self, threshold: i64) -> Self {
        self.low_stock_threshold = threshold;
        self
    }

    pub fn reload_before_write(mut self, reload: bool) -> Self {
        self.reload_before_write = reload;
        self
    }

    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Puts the data, bills and reports directories side by side under
    /// `root`. Handy for tests and the seed tool.
    pub fn rooted_at(root: &Path) -> Self {
        StoreConfig::new(root.join("data"))
            .bills_dir(root.join("bills"))
            .reports_dir(root.join("reports"))
    }

    pub fn products_path(&self) -> PathBuf {
        self.data_dir.join("products.csv")
    }

    pub fn customers_path(&self) -> PathBuf {
        self.data_dir.join("customers.csv")
    }

    pub fn sales_log_path(&self) -> PathBuf {
        self.data_dir.join("sales_log.csv")
    }

    pub fn admin_path(&self) -> PathBuf {
        self.data_dir.join("admin.csv")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.products_path(), PathBuf::from("data/products.csv"));
        assert_eq!(config.bills_dir, PathBuf::from("bills"));
        assert_eq!(config.store_title, DEFAULT_STORE_TITLE);
        assert_eq!(config.low_stock_threshold, 5);
        assert!(config.reload_before_write);
    }

    #[test]
    fn test_overrides_apply() {
        let env: HashMap<&str, &str> = [
            (ENV_DATA_DIR, "/tmp/shop"),
            (ENV_STORE_TITLE, "CORNER SHOP"),
            (ENV_LOW_STOCK_THRESHOLD, "12"),
        ]
        .into_iter()
        .collect();

        let config = StoreConfig::default().with_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.sales_log_path(), PathBuf::from("/tmp/shop/sales_log.csv"));
        assert_eq!(config.store_title, "CORNER SHOP");
        assert_eq!(config.low_stock_threshold, 12);
        assert_eq!(config.reports_dir, PathBuf::from("reports"));
    }

    #[test]
    fn test_invalid_threshold_is_ignored() {
        let config = StoreConfig::default().with_overrides(|k| {
            (k == ENV_LOW_STOCK_THRESHOLD).then(|| "lots".to_string())
        });
        assert_eq!(config.low_stock_threshold, 5);
    }
}
