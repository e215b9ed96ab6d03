//! # Checkout
//!
//! Turns a cart into a sale: bill files, a ledger row, and stock decrements.
//!
//! ## Saga
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Checkout Stages                                  │
//! │                                                                         │
//! │  pre-flight: cart non-empty, every product exists with enough stock    │
//! │       │         (failure → Rejected, nothing written)                  │
//! │       ▼                                                                 │
//! │  Started ──write bills──► BillsWritten ──append ledger──► SaleLogged   │
//! │                                                              │          │
//! │                                        decrement stock line by line    │
//! │                                                              │          │
//! │                                                              ▼          │
//! │                                                        StockApplied    │
//! │                                                                         │
//! │  A failure after the bills exist → Incomplete { progress, source }     │
//! │  resume(progress) picks up exactly where the failure happened:         │
//! │    • the ledger row is skipped if this exact sale is already logged    │
//! │    • stock continues from `lines_applied`                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing is rolled back. A partial checkout is surfaced to the caller as a
//! reconciliation task carrying everything needed to finish it.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tally_core::ids::bill_id;
use tally_core::{Bill, Cart, CartLine, CoreError, Money, Order, ValidationError};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::bills::{BillArtifacts, BillWriter};
use crate::error::{StoreError, StoreResult};
use crate::repository::product::ProductCatalog;
use crate::repository::sales::SalesLedger;

// =============================================================================
// Progress
// =============================================================================

/// How far a checkout got. Stages only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStage {
    Started,
    BillsWritten,
    SaleLogged,
    StockApplied,
}

/// Resumable record of one checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutProgress {
    /// Idempotency key for the whole checkout.
    pub order_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub issued_at: NaiveDateTime,
    /// Lines as they were at checkout time (prices frozen).
    pub lines: Vec<CartLine>,
    pub total: Money,
    pub stage: CheckoutStage,
    pub bills: Option<BillArtifacts>,
    /// Number of leading `lines` whose stock decrement is done.
    pub lines_applied: usize,
}

impl CheckoutProgress {
    /// The order this checkout is producing.
    pub fn order(&self) -> Order {
        Order {
            order_id: self.order_id.clone(),
            customer_id: self.customer_id.clone(),
            date: self.date,
            lines: self.lines.clone(),
            total: self.total,
        }
    }

    /// Saves the progress as `pending_<order_id>.json` under `dir`.
    pub fn save(&self, dir: &Path) -> StoreResult<PathBuf> {
        fs::create_dir_all(dir).map_err(StoreError::io(dir))?;
        let path = dir.join(format!("pending_{}.json", self.order_id));
        let json = serde_json::to_vec_pretty(self).map_err(StoreError::json(&path))?;
        fs::write(&path, json).map_err(StoreError::io(&path))?;
        Ok(path)
    }

    /// Loads progress written by [`CheckoutProgress::save`].
    pub fn load(path: &Path) -> StoreResult<CheckoutProgress> {
        let bytes = fs::read(path).map_err(StoreError::io(path))?;
        serde_json::from_slice(&bytes).map_err(StoreError::json(path))
    }
}

/// Result of a completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub customer_id: String,
    pub date: NaiveDate,
    pub lines: Vec<CartLine>,
    pub total: Money,
    pub bill_id: String,
    pub bill_text_path: PathBuf,
    pub bill_csv_path: PathBuf,
}

// =============================================================================
// Errors
// =============================================================================

/// Checkout failure.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Nothing was persisted. Safe to fix the cause and try again.
    #[error(transparent)]
    Rejected(StoreError),

    /// Some steps were persisted. Finish with [`Checkout::resume`].
    #[error("Checkout {} stopped at stage {:?}: {source}", progress.order_id, progress.stage)]
    Incomplete {
        progress: Box<CheckoutProgress>,
        #[source]
        source: StoreError,
    },
}

impl CheckoutError {
    fn incomplete(progress: CheckoutProgress, source: StoreError) -> Self {
        warn!(
            order_id = %progress.order_id,
            stage = ?progress.stage,
            lines_applied = progress.lines_applied,
            error = %source,
            "Checkout incomplete, reconciliation required"
        );
        CheckoutError::Incomplete {
            progress: Box::new(progress),
            source,
        }
    }

    /// Progress of an incomplete checkout.
    pub fn progress(&self) -> Option<&CheckoutProgress> {
        match self {
            CheckoutError::Rejected(_) => None,
            CheckoutError::Incomplete { progress, .. } => Some(progress.as_ref()),
        }
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Runs checkouts against a catalog, a ledger and a bills directory.
///
/// ## Usage
/// ```rust,ignore
/// let checkout = store.checkout();
/// let receipt = checkout.run(&customer.customer_id, &cart)?;
/// cart.clear();
/// ```
#[derive(Debug)]
pub struct Checkout<C> {
    catalog: C,
    ledger: SalesLedger,
    bills: BillWriter,
}

impl<C: ProductCatalog> Checkout<C> {
    pub fn new(catalog: C, ledger: SalesLedger, bills: BillWriter) -> Self {
        Checkout {
            catalog,
            ledger,
            bills,
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn ledger(&self) -> &SalesLedger {
        &self.ledger
    }

    /// Checks out `cart` for `customer_id` at the current local time.
    ///
    /// The cart is not cleared; do that after a successful return.
    pub fn run(&self, customer_id: &str, cart: &Cart) -> Result<CheckoutReceipt, CheckoutError> {
        self.run_at(customer_id, cart, Local::now())
    }

    /// [`Checkout::run`] with an explicit clock reading.
    pub fn run_at(
        &self,
        customer_id: &str,
        cart: &Cart,
        now: DateTime<Local>,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        self.preflight(customer_id, cart)
            .map_err(CheckoutError::Rejected)?;
        let order_id = self
            .ledger
            .next_order_id(now.timestamp())
            .map_err(CheckoutError::Rejected)?;

        let progress = CheckoutProgress {
            order_id,
            customer_id: customer_id.trim().to_string(),
            date: now.date_naive(),
            issued_at: now.naive_local(),
            lines: cart.lines().to_vec(),
            total: cart.total(),
            stage: CheckoutStage::Started,
            bills: None,
            lines_applied: 0,
        };

        info!(
            order_id = %progress.order_id,
            customer_id = %progress.customer_id,
            lines = progress.lines.len(),
            total = %progress.total,
            "Checkout started"
        );
        self.advance(progress)
    }

    /// Continues a checkout that stopped part way.
    pub fn resume(&self, progress: CheckoutProgress) -> Result<CheckoutReceipt, CheckoutError> {
        info!(
            order_id = %progress.order_id,
            stage = ?progress.stage,
            lines_applied = progress.lines_applied,
            "Resuming checkout"
        );
        self.advance(progress)
    }

    /// Verifies everything that can be checked without writing.
    fn preflight(&self, customer_id: &str, cart: &Cart) -> StoreResult<()> {
        if customer_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "customer_id".to_string(),
            }
            .into());
        }

        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        for line in cart.lines() {
            let product = self.catalog.find(&line.product_id)?;
            if !product.can_sell(line.qty) {
                return Err(CoreError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available: product.stock,
                    requested: line.qty,
                }
                .into());
            }
        }

        Ok(())
    }

    fn advance(&self, mut progress: CheckoutProgress) -> Result<CheckoutReceipt, CheckoutError> {
        // Bills. The writer cleans up after itself, so a failure here leaves
        // nothing behind.
        let bills = match progress.bills.clone() {
            Some(bills) => bills,
            None => {
                let bill = Bill::for_order(
                    &progress.order(),
                    bill_id(progress.issued_at),
                    progress.issued_at,
                );
                let bills = self.bills.write(&bill).map_err(CheckoutError::Rejected)?;
                progress.bills = Some(bills.clone());
                progress.stage = progress.stage.max(CheckoutStage::BillsWritten);
                bills
            }
        };

        // Ledger.
        if progress.stage < CheckoutStage::SaleLogged {
            let entry = progress.order().to_log_entry();
            match self.ledger.contains_entry(&entry) {
                Ok(true) => {
                    debug!(order_id = %progress.order_id, "Sale already logged, skipping");
                }
                Ok(false) => {
                    if let Err(e) = self.ledger.append(&entry) {
                        return Err(CheckoutError::incomplete(progress, e));
                    }
                }
                Err(e) => return Err(CheckoutError::incomplete(progress, e)),
            }
            progress.stage = CheckoutStage::SaleLogged;
        }

        // Stock. Re-read at decrement time, one line at a time.
        if progress.stage < CheckoutStage::StockApplied {
            while progress.lines_applied < progress.lines.len() {
                let line = &progress.lines[progress.lines_applied];
                if let Err(e) = self.decrement(line) {
                    return Err(CheckoutError::incomplete(progress, e));
                }
                progress.lines_applied += 1;
            }
            progress.stage = CheckoutStage::StockApplied;
        }

        info!(
            order_id = %progress.order_id,
            bill_id = %bills.bill_id,
            total = %progress.total,
            "Checkout complete"
        );

        Ok(CheckoutReceipt {
            order_id: progress.order_id,
            customer_id: progress.customer_id,
            date: progress.date,
            lines: progress.lines,
            total: progress.total,
            bill_id: bills.bill_id,
            bill_text_path: bills.text_path,
            bill_csv_path: bills.table_path,
        })
    }

    fn decrement(&self, line: &CartLine) -> StoreResult<()> {
        let product = self.catalog.find(&line.product_id)?;
        if !product.can_sell(line.qty) {
            return Err(CoreError::InsufficientStock {
                product_id: line.product_id.clone(),
                available: product.stock,
                requested: line.qty,
            }
            .into());
        }
        self.catalog
            .set_stock(&line.product_id, product.stock - line.qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
