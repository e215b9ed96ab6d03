//! # Product Repository
//!
//! The product catalog, backed by `products.csv`.
//!
//! ## Key Operations
//! - Listing and lookup (every call re-reads the file)
//! - Insert, upsert, patch, remove
//! - Stock mutation for checkout
//!
//! ## Read-Modify-Write
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  set_stock("P001", 7)                                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock products.csv                                                     │
//! │       │                                                                 │
//! │       ├── reload_before_write = true  ──► strict re-read of the file   │
//! │       └── reload_before_write = false ──► last written snapshot        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mutate every row with product_id == "P001"                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  rewrite whole table (tmp + rename), unlock                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Duplicate Ids
//! Writes through this repository never create a duplicate `product_id`.
//! A hand-edited file may still contain one: reads keep the first row and
//! warn, mutations apply to every matching row.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tally_core::validation::{
    parse_price, parse_stock, validate_identifier, validate_name, validate_price, validate_stock,
};
use tally_core::{Product, ProductPatch, ValidationError};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::table::{Record, RecordStore};

/// Column order of `products.csv`.
pub const PRODUCT_FIELDS: [&str; 4] = ["product_id", "name", "price", "stock"];

// =============================================================================
// Catalog Trait
// =============================================================================

/// Storage-agnostic product catalog.
///
/// The checkout works against this trait, so it runs the same over the
/// CSV file and over [`MemoryCatalog`].
pub trait ProductCatalog {
    /// All readable products, in table order, first row per id.
    fn list(&self) -> StoreResult<Vec<Product>>;

    /// Inserts a new product. Fails with `Duplicate` if the id exists.
    fn add(&self, product: Product) -> StoreResult<()>;

    /// Inserts the product, or replaces every row with the same id.
    fn upsert(&self, product: Product) -> StoreResult<()>;

    /// Overwrites the stock of a product. Fails with `NotFound` if absent.
    fn set_stock(&self, product_id: &str, stock: i64) -> StoreResult<()>;

    /// Looks a product up by id.
    fn find(&self, product_id: &str) -> StoreResult<Product> {
        self.list()?
            .into_iter()
            .find(|p| p.product_id == product_id)
            .ok_or_else(|| StoreError::not_found("Product", product_id))
    }
}

// =============================================================================
// Record Conversion
// =============================================================================

/// Parses a product row.
///
/// ## Errors
/// - `Required` for an empty `product_id`
/// - `InvalidFormat` / `OutOfRange` for a bad price or stock (e.g. `"abc"`,
///   `"-3"`, or a price above the cap)
pub fn product_from_record(record: &Record) -> Result<Product, ValidationError> {
    let text = |field: &str| record.get(field).map(|v| v.trim()).unwrap_or("");

    let product_id = text("product_id");
    if product_id.is_empty() {
        return Err(ValidationError::Required {
            field: "product_id".to_string(),
        });
    }

    let price = parse_price(text("price"))?;
    let stock = parse_stock(text("stock"))?;
    validate_stock(stock)?;

    Ok(Product {
        product_id: product_id.to_string(),
        name: text("name").to_string(),
        price,
        stock,
    })
}

/// Renders a product as a row.
pub fn product_to_record(product: &Product) -> Record {
    let mut record = Record::new();
    record.insert("product_id".to_string(), product.product_id.clone());
    record.insert("name".to_string(), product.name.clone());
    record.insert("price".to_string(), product.price.to_plain_string());
    record.insert("stock".to_string(), product.stock.to_string());
    record
}

fn validate_product(product: &Product) -> Result<(), ValidationError> {
    validate_identifier("product_id", &product.product_id)?;
    validate_name("name", &product.name)?;
    validate_price(product.price)?;
    validate_stock(product.stock)?;
    Ok(())
}

fn validate_patch(patch: &ProductPatch) -> Result<(), ValidationError> {
    if let Some(name) = &patch.name {
        validate_name("name", name)?;
    }
    if let Some(price) = patch.price {
        validate_price(price)?;
    }
    if let Some(stock) = patch.stock {
        validate_stock(stock)?;
    }
    Ok(())
}

fn row_id(record: &Record) -> &str {
    record.get("product_id").map(|v| v.trim()).unwrap_or("")
}

// =============================================================================
// Scan
// =============================================================================

/// A row that could not be turned into a [`Product`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based position among the well-formed rows of the table.
    pub row: usize,
    pub record: Record,
    pub reason: String,
}

/// Result of [`ProductRepository::scan`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogScan {
    pub products: Vec<Product>,
    pub rejected: Vec<RejectedRow>,
}

fn scan_records(path: &Path, records: Vec<Record>) -> CatalogScan {
    let mut scan = CatalogScan::default();
    let mut seen = HashSet::new();

    for (index, record) in records.into_iter().enumerate() {
        match product_from_record(&record) {
            Ok(product) => {
                if seen.insert(product.product_id.clone()) {
                    scan.products.push(product);
                } else {
                    warn!(
                        path = %path.display(),
                        product_id = %product.product_id,
                        "Duplicate product id, keeping first row"
                    );
                }
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    row = index + 1,
                    error = %e,
                    "Skipping unreadable product row"
                );
                scan.rejected.push(RejectedRow {
                    row: index + 1,
                    record,
                    reason: e.to_string(),
                });
            }
        }
    }

    scan
}

// =============================================================================
// CSV Repository
// =============================================================================

/// Product catalog stored in `products.csv`.
///
/// ## Usage
/// ```rust,ignore
/// let repo = store.products();
///
/// repo.add(Product::new("P001", "Pen", "10.00".parse()?, 10))?;
/// let pen = repo.find("P001")?;
/// repo.set_stock("P001", pen.stock - 3)?;
/// ```
#[derive(Debug)]
pub struct ProductRepository {
    path: PathBuf,
    store: RecordStore,
    reload_before_write: bool,
    /// Rows as last written; only consulted when `reload_before_write` is off.
    snapshot: Mutex<Option<Vec<Record>>>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(path: impl Into<PathBuf>, store: RecordStore, reload_before_write: bool) -> Self {
        ProductRepository {
            path: path.into(),
            store,
            reload_before_write,
            snapshot: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the table and separates readable products from rejected rows.
    pub fn scan(&self) -> StoreResult<CatalogScan> {
        let records = self.store.read_table(&self.path)?;
        Ok(scan_records(&self.path, records))
    }

    /// Applies a partial update to a product.
    pub fn update(&self, product_id: &str, patch: &ProductPatch) -> StoreResult<()> {
        validate_patch(patch)?;

        self.mutate(|records| {
            let mut matched = 0;
            for record in records.iter_mut().filter(|r| row_id(r) == product_id) {
                if let Some(name) = &patch.name {
                    record.insert("name".to_string(), name.trim().to_string());
                }
                if let Some(price) = patch.price {
                    record.insert("price".to_string(), price.to_plain_string());
                }
                if let Some(stock) = patch.stock {
                    record.insert("stock".to_string(), stock.to_string());
                }
                matched += 1;
            }
            if matched == 0 {
                return Err(StoreError::not_found("Product", product_id));
            }
            Ok(())
        })?;

        info!(product_id = %product_id, "Product updated");
        Ok(())
    }

    /// Deletes every row with the given id.
    pub fn remove(&self, product_id: &str) -> StoreResult<()> {
        self.mutate(|records| {
            let before = records.len();
            records.retain(|r| row_id(r) != product_id);
            if records.len() == before {
                return Err(StoreError::not_found("Product", product_id));
            }
            Ok(())
        })?;

        info!(product_id = %product_id, "Product removed");
        Ok(())
    }

    /// Number of readable products.
    pub fn count(&self) -> StoreResult<usize> {
        Ok(self.list()?.len())
    }

    /// Runs `op` on the table under the lock and writes the result back.
    /// Nothing is written if `op` fails.
    fn mutate<T>(&self, op: impl FnOnce(&mut Vec<Record>) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.store.lock(&self.path)?;
        let mut snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);

        let mut records = match snapshot.take() {
            Some(cached) if !self.reload_before_write => cached,
            _ => self.store.read_table_strict(&self.path)?,
        };

        let out = op(&mut records)?;
        self.store
            .write_table_locked(&guard, &PRODUCT_FIELDS, &records)?;

        if !self.reload_before_write {
            *snapshot = Some(records);
        }
        Ok(out)
    }
}

impl ProductCatalog for ProductRepository {
    fn list(&self) -> StoreResult<Vec<Product>> {
        let scan = self.scan()?;
        debug!(count = scan.products.len(), "Listed products");
        Ok(scan.products)
    }

    fn add(&self, product: Product) -> StoreResult<()> {
        validate_product(&product)?;

        self.mutate(|records| {
            if records.iter().any(|r| row_id(r) == product.product_id) {
                return Err(StoreError::duplicate("product_id", &product.product_id));
            }
            records.push(product_to_record(&product));
            Ok(())
        })?;

        info!(product_id = %product.product_id, "Product added");
        Ok(())
    }

    fn upsert(&self, product: Product) -> StoreResult<()> {
        validate_product(&product)?;

        self.mutate(|records| {
            let replacement = product_to_record(&product);
            let mut matched = false;
            for record in records.iter_mut().filter(|r| row_id(r) == product.product_id) {
                *record = replacement.clone();
                matched = true;
            }
            if !matched {
                records.push(replacement);
            }
            Ok(())
        })?;

        debug!(product_id = %product.product_id, "Product upserted");
        Ok(())
    }

    fn set_stock(&self, product_id: &str, stock: i64) -> StoreResult<()> {
        validate_stock(stock)?;

        self.mutate(|records| {
            let mut matched = 0;
            for record in records.iter_mut().filter(|r| row_id(r) == product_id) {
                record.insert("stock".to_string(), stock.to_string());
                matched += 1;
            }
            if matched == 0 {
                return Err(StoreError::not_found("Product", product_id));
            }
            if matched > 1 {
                warn!(product_id = %product_id, rows = matched, "Stock set on duplicate rows");
            }
            Ok(())
        })?;

        debug!(product_id = %product_id, stock, "Stock updated");
        Ok(())
    }
}

// =============================================================================
// In-Memory Catalog
// =============================================================================

/// Catalog held in memory. Used by tests and anywhere a throwaway catalog
/// is enough.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: Mutex<Vec<Product>>,
}

impl MemoryCatalog {
    pub fn new(products: Vec<Product>) -> Self {
        MemoryCatalog {
            products: Mutex::new(products),
        }
    }

    fn with<T>(&self, op: impl FnOnce(&mut Vec<Product>) -> T) -> T {
        let mut products = self.products.lock().unwrap_or_else(PoisonError::into_inner);
        op(&mut products)
    }
}

impl ProductCatalog for MemoryCatalog {
    fn list(&self) -> StoreResult<Vec<Product>> {
        Ok(self.with(|products| products.clone()))
    }

    fn add(&self, product: Product) -> StoreResult<()> {
        validate_product(&product)?;
        self.with(|products| {
            if products.iter().any(|p| p.product_id == product.product_id) {
                return Err(StoreError::duplicate("product_id", &product.product_id));
            }
            products.push(product);
            Ok(())
        })
    }

    fn upsert(&self, product: Product) -> StoreResult<()> {
        validate_product(&product)?;
        self.with(|products| {
            match products.iter_mut().find(|p| p.product_id == product.product_id) {
                Some(existing) => *existing = product,
                None => products.push(product),
            }
            Ok(())
        })
    }

    fn set_stock(&self, product_id: &str, stock: i64) -> StoreResult<()> {
        validate_stock(stock)?;
        self.with(|products| {
            let product = products
                .iter_mut()
                .find(|p| p.product_id == product_id)
                .ok_or_else(|| StoreError::not_found("Product", product_id))?;
            product.stock = stock;
            Ok(())
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
