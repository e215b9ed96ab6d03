//! # Checkout Commands
//!
//! Runs a checkout for a logged-in customer and finishes interrupted ones.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    tally checkout                                       │
//! │                                                                         │
//! │  --customer C1 --password ... --item P001=3 --item P002=1              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  authenticate customer ──► AUTH_FAILED                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  build cart from live catalog ──► NOT_FOUND / INSUFFICIENT_STOCK       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Checkout::run                                                         │
//! │       │                                                                 │
//! │       ├── Ok(receipt)       → print receipt                            │
//! │       ├── Rejected(e)       → error, nothing written                   │
//! │       └── Incomplete {..}   → data/pending/pending_<order>.json        │
//! │                               RECONCILIATION_REQUIRED                  │
//! │                               (finish with `tally resume <FILE>`)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use tally_core::Cart;
use tally_store::{CheckoutError, CheckoutProgress, CheckoutReceipt, ProductCatalog};
use tracing::{error, warn};

use super::Context;
use crate::error::{AppError, AppResult, ErrorCode};

/// Directory under `data_dir` holding progress of interrupted checkouts.
pub const PENDING_DIR: &str = "pending";

#[derive(Debug, Args)]
pub struct CheckoutArgs {
    /// Customer id
    #[arg(long)]
    pub customer: String,

    /// Customer password
    #[arg(long, env = "TALLY_CUSTOMER_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Line to buy as PRODUCT_ID=QUANTITY; repeat for more lines
    #[arg(long = "item", value_parser = parse_item, required = true)]
    pub items: Vec<(String, i64)>,
}

/// Parses `P001=3`.
pub fn parse_item(text: &str) -> Result<(String, i64), String> {
    let (id, qty) = text
        .split_once('=')
        .ok_or_else(|| format!("expected PRODUCT_ID=QUANTITY, got '{}'", text))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(format!("missing product id in '{}'", text));
    }
    let qty = qty
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("quantity must be a whole number in '{}'", text))?;
    Ok((id.to_string(), qty))
}

pub fn run(ctx: &Context, args: CheckoutArgs) -> AppResult<()> {
    let customer = ctx
        .store
        .customers()
        .authenticate(&args.customer, &args.password)?;

    let cart = build_cart(ctx, &args.items)?;
    let result = ctx.store.checkout().run(&customer.customer_id, &cart);
    finish(ctx, result)
}

/// Finishes a checkout from a saved progress file.
pub fn resume(ctx: &Context, file: &Path) -> AppResult<()> {
    let progress = CheckoutProgress::load(file)?;
    let result = ctx.store.checkout().resume(progress);
    let done = result.is_ok();
    finish(ctx, result)?;

    if done {
        if let Err(e) = fs::remove_file(file) {
            warn!(path = %file.display(), error = %e, "Could not remove finished progress file");
        }
    }
    Ok(())
}

/// Adds each requested line against the live catalog. Repeated ids merge.
fn build_cart(ctx: &Context, items: &[(String, i64)]) -> AppResult<Cart> {
    let products = ctx.store.products();
    let mut cart = Cart::new();
    for (product_id, qty) in items {
        let product = products.find(product_id)?;
        cart.add_line(&product, *qty)?;
    }
    Ok(cart)
}

fn finish(ctx: &Context, result: Result<CheckoutReceipt, CheckoutError>) -> AppResult<()> {
    match result {
        Ok(receipt) => ctx.emit(&receipt, render_receipt),
        Err(CheckoutError::Incomplete { progress, source }) => {
            Err(reconciliation(&pending_dir(ctx), &progress, source.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn pending_dir(ctx: &Context) -> PathBuf {
    ctx.store.config().data_dir.join(PENDING_DIR)
}

/// Saves the progress so `tally resume` can pick it up.
fn reconciliation(dir: &Path, progress: &CheckoutProgress, cause: String) -> AppError {
    let mut err = AppError::new(
        ErrorCode::ReconciliationRequired,
        format!(
            "Checkout {} stopped at stage {:?}: {}",
            progress.order_id, progress.stage, cause
        ),
    );
    match progress.save(dir) {
        Ok(path) => err.pending = Some(path),
        Err(e) => {
            error!(
                order_id = %progress.order_id,
                error = %e,
                "Could not save checkout progress; reconcile by hand"
            );
        }
    }
    err
}

fn render_receipt(receipt: &CheckoutReceipt) -> String {
    let mut out = format!(
        "Order {} for {} on {}",
        receipt.order_id, receipt.customer_id, receipt.date
    );
    for line in &receipt.lines {
        out.push_str(&format!(
            "\n  {:<20} {:>4} x {:>9} = {:>10}",
            line.name,
            line.qty,
            line.price.to_string(),
            line.subtotal().to_string()
        ));
    }
    out.push_str(&format!("\nTotal: {}", receipt.total));
    out.push_str(&format!("\nBill {}:", receipt.bill_id));
    out.push_str(&format!("\n  {}", receipt.bill_text_path.display()));
    out.push_str(&format!("\n  {}", receipt.bill_csv_path.display()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{Customer, Money, Product};
    use tally_store::{Store, StoreConfig};

    fn seeded(dir: &Path) -> Context {
        let store = Store::open(StoreConfig::rooted_at(dir));
        store
            .products()
            .add(Product::new("P001", "Pen", Money::from_cents(150), 10))
            .unwrap();
        store
            .customers()
            .register(&Customer::new("C1", "Ada", "secret"))
            .unwrap();
        Context::new(store, false)
    }

    fn args(items: &[(&str, i64)]) -> CheckoutArgs {
        CheckoutArgs {
            customer: "C1".to_string(),
            password: "secret".to_string(),
            items: items.iter().map(|(id, q)| (id.to_string(), *q)).collect(),
        }
    }

    #[test]
    fn test_parse_item() {
        assert_eq!(parse_item("P001=3").unwrap(), ("P001".to_string(), 3));
        assert_eq!(parse_item(" P001 = 2 ").unwrap(), ("P001".to_string(), 2));
        assert!(parse_item("P001").is_err());
        assert!(parse_item("=3").is_err());
        assert!(parse_item("P001=x").is_err());
    }

    #[test]
    fn test_checkout_decrements_stock() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = seeded(dir.path());

        run(&ctx, args(&[("P001", 2), ("P001", 1)])).unwrap();

        assert_eq!(ctx.store.products().find("P001").unwrap().stock, 7);
        assert_eq!(ctx.store.sales().entries().unwrap().len(), 1);
    }

    #[test]
    fn test_checkout_errors_map_to_codes() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = seeded(dir.path());

        let err = run(&ctx, args(&[("P001", 11)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = run(&ctx, args(&[("P404", 1)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let mut wrong = args(&[("P001", 1)]);
        wrong.password = "nope".to_string();
        assert_eq!(run(&ctx, wrong).unwrap_err().code, ErrorCode::AuthFailed);

        assert_eq!(ctx.store.products().find("P001").unwrap().stock, 10);
    }

    #[test]
    fn test_incomplete_checkout_is_saved_and_resumed() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = seeded(dir.path());

        // A directory where the ledger file should be makes the ledger append fail.
        let ledger = ctx.store.config().sales_log_path();
        fs::create_dir_all(&ledger).unwrap();

        let err = run(&ctx, args(&[("P001", 3)])).unwrap_err();
        assert_eq!(err.code, ErrorCode::ReconciliationRequired);
        let pending = err.pending.expect("progress file");
        assert!(pending.starts_with(pending_dir(&ctx)));
        assert_eq!(ctx.store.products().find("P001").unwrap().stock, 10);

        fs::remove_dir_all(&ledger).unwrap();
        resume(&ctx, &pending).unwrap();

        assert!(!pending.exists());
        assert_eq!(ctx.store.products().find("P001").unwrap().stock, 7);
        assert_eq!(ctx.store.sales().entries().unwrap().len(), 1);
    }
}
