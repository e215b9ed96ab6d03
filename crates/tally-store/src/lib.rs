//! # tally-store: Flat-File Storage Layer for Tally
//!
//! This crate persists the Tally domain in plain CSV files and runs the
//! checkout against them.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally Data Flow                                  │
//! │                                                                         │
//! │  Console command (tally checkout ...)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tally-store (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌────────────────┐  │   │
//! │  │   │    Store      │   │ Repositories  │   │   Checkout     │  │   │
//! │  │   │  (store.rs)   │   │               │   │ (checkout.rs)  │  │   │
//! │  │   │               │   │ Products      │   │                │  │   │
//! │  │   │ StoreConfig   │──►│ Customers     │◄──│ bills → ledger │  │   │
//! │  │   │ RecordStore   │   │ SalesLedger   │   │   → stock      │  │   │
//! │  │   │               │   │ Admins        │   │                │  │   │
//! │  │   └───────────────┘   └───────────────┘   └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  data/*.csv, bills/, reports/                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`table`] - Generic record store (read, write, append)
//! - [`lock`] - Exclusive table locks
//! - [`config`] - Paths and tunables
//! - [`store`] - The [`Store`] handle
//! - [`repository`] - One repository per table
//! - [`bills`] - Bill artifact writer
//! - [`checkout`] - The checkout saga
//! - [`reports`] - Sales and low-stock reports
//! - [`error`] - Storage error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_core::Cart;
//! use tally_store::{ProductCatalog, Store, StoreConfig};
//!
//! let store = Store::open(StoreConfig::from_env());
//! let pen = store.products().find("P001")?;
//!
//! let mut cart = Cart::new();
//! cart.add_line(&pen, 3)?;
//!
//! let receipt = store.checkout().run("C1", &cart)?;
//! println!("{} {}", receipt.order_id, receipt.total);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bills;
pub mod checkout;
pub mod config;
pub mod error;
pub mod lock;
pub mod reports;
pub mod repository;
pub mod store;
pub mod table;

// =============================================================================
// Re-exports
// =============================================================================

pub use bills::{BillArtifacts, BillWriter};
pub use checkout::{Checkout, CheckoutError, CheckoutProgress, CheckoutReceipt, CheckoutStage};
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use reports::{LowStockReport, Reports, SalesReport};
pub use store::Store;
pub use table::{Record, RecordStore};

// Repository re-exports for convenience
pub use repository::admin::AdminRepository;
pub use repository::customer::CustomerRepository;
pub use repository::product::{CatalogScan, MemoryCatalog, ProductCatalog, ProductRepository};
pub use repository::sales::SalesLedger;
