//! # Store Handle
//!
//! Entry point to the flat-file storage layer.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Store Handle                                  │
//! │                                                                         │
//! │  StoreConfig::from_env() ← data/bills/reports dirs, tunables           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Store::open(config)                                                   │
//! │       │                                                                 │
//! │       ├── products()   → ProductRepository   (products.csv)            │
//! │       ├── customers()  → CustomerRepository  (customers.csv)           │
//! │       ├── sales()      → SalesLedger         (sales_log.csv)           │
//! │       ├── admins()     → AdminRepository     (admin.csv)               │
//! │       ├── bills()      → BillWriter          (bills/)                  │
//! │       ├── checkout()   → Checkout<ProductRepository>                   │
//! │       └── reports()    → Reports             (reports/)                │
//! │                                                                         │
//! │  Repositories are cheap to create and hold no open files; every call   │
//! │  goes to disk.                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tracing::debug;

use crate::bills::BillWriter;
use crate::checkout::Checkout;
use crate::config::StoreConfig;
use crate::reports::Reports;
use crate::repository::admin::AdminRepository;
use crate::repository::customer::CustomerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::sales::SalesLedger;
use crate::table::RecordStore;

/// Main storage handle providing repository access.
///
/// ## Usage
/// ```rust,ignore
/// let store = Store::open(StoreConfig::from_env());
///
/// let products = store.products().list()?;
/// let customer = store.customers().authenticate("C1", "secret")?;
/// let receipt = store.checkout().run(&customer.customer_id, &cart)?;
/// ```
#[derive(Debug, Clone)]
pub struct Store {
    config: StoreConfig,
    records: RecordStore,
}

impl Store {
    /// Opens the store. Directories are created lazily on first write, so
    /// opening never touches the disk.
    pub fn open(config: StoreConfig) -> Self {
        debug!(
            data_dir = %config.data_dir.display(),
            bills_dir = %config.bills_dir.display(),
            reports_dir = %config.reports_dir.display(),
            "Store opened"
        );
        let records = RecordStore::new(config.lock_timeout);
        Store { config, records }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Raw table access.
    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(
            self.config.products_path(),
            self.records.clone(),
            self.config.reload_before_write,
        )
    }

    pub fn customers(&self) -> CustomerRepository {
        CustomerRepository::new(self.config.customers_path(), self.records.clone())
    }

    pub fn sales(&self) -> SalesLedger {
        SalesLedger::new(self.config.sales_log_path(), self.records.clone())
    }

    pub fn admins(&self) -> AdminRepository {
        AdminRepository::new(self.config.admin_path(), self.records.clone())
    }

    pub fn bills(&self) -> BillWriter {
        BillWriter::new(&self.config.bills_dir, &self.config.store_title)
    }

    /// A checkout over the CSV catalog.
    pub fn checkout(&self) -> Checkout<ProductRepository> {
        Checkout::new(self.products(), self.sales(), self.bills())
    }

    pub fn reports(&self) -> Reports {
        Reports::new(
            self.products(),
            self.sales(),
            self.records.clone(),
            &self.config.reports_dir,
        )
    }
}
