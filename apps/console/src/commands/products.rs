//! # Product Commands
//!
//! Catalog listing for everyone, catalog changes for admins.
//!
//! ```text
//! tally products list
//! tally products show P001
//! tally products add --id P001 --name "Pen" --price 1.50 --stock 10 --user admin --password ...
//! tally products update P001 --price 1.75 --user admin --password ...
//! tally products set-stock P001 25 --user admin --password ...
//! tally products delete P001 --user admin --password ...
//! ```

use clap::Subcommand;
use tally_core::validation::{parse_price, parse_stock};
use tally_core::{Product, ProductPatch};
use tally_store::ProductCatalog;

use super::{AdminAuth, Context};
use crate::error::{AppError, AppResult};

#[derive(Debug, Subcommand)]
pub enum ProductAction {
    /// List every readable product
    List,
    /// Show one product
    Show {
        /// Product id
        id: String,
    },
    /// Add a new product (admin)
    Add {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        /// Unit price, e.g. 10 or 10.50
        #[arg(long)]
        price: String,
        #[arg(long)]
        stock: String,
        #[command(flatten)]
        auth: AdminAuth,
    },
    /// Change name, price or stock of a product (admin)
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<String>,
        #[arg(long)]
        stock: Option<String>,
        #[command(flatten)]
        auth: AdminAuth,
    },
    /// Remove a product (admin)
    Delete {
        id: String,
        #[command(flatten)]
        auth: AdminAuth,
    },
    /// Overwrite the stock count of a product (admin)
    SetStock {
        id: String,
        stock: String,
        #[command(flatten)]
        auth: AdminAuth,
    },
}

pub fn run(ctx: &Context, action: ProductAction) -> AppResult<()> {
    match action {
        ProductAction::List => list(ctx),
        ProductAction::Show { id } => show(ctx, &id),
        ProductAction::Add {
            id,
            name,
            price,
            stock,
            auth,
        } => {
            ctx.require_admin(&auth)?;
            add(ctx, &id, &name, &price, &stock)
        }
        ProductAction::Update {
            id,
            name,
            price,
            stock,
            auth,
        } => {
            ctx.require_admin(&auth)?;
            let patch = build_patch(name, price.as_deref(), stock.as_deref())?;
            update(ctx, &id, &patch)
        }
        ProductAction::Delete { id, auth } => {
            ctx.require_admin(&auth)?;
            delete(ctx, &id)
        }
        ProductAction::SetStock { id, stock, auth } => {
            ctx.require_admin(&auth)?;
            set_stock(ctx, &id, &stock)
        }
    }
}

// =============================================================================
// Read Commands
// =============================================================================

fn list(ctx: &Context) -> AppResult<()> {
    // Unreadable rows are already logged by the scan.
    let scan = ctx.store.products().scan()?;
    ctx.emit(&scan.products, |products| {
        if products.is_empty() {
            return "No products in catalog".to_string();
        }
        let mut out = format!("{:<10} {:<24} {:>10} {:>7}", "ID", "Name", "Price", "Stock");
        for p in products {
            out.push_str(&format!(
                "\n{:<10} {:<24} {:>10} {:>7}",
                p.product_id,
                p.name,
                p.price.to_string(),
                p.stock
            ));
        }
        out
    })
}

fn show(ctx: &Context, id: &str) -> AppResult<()> {
    let product = ctx.store.products().find(id)?;
    ctx.emit(&product, describe)
}

fn describe(p: &Product) -> String {
    format!(
        "{} {}\n  price: {}\n  stock: {}",
        p.product_id, p.name, p.price, p.stock
    )
}

// =============================================================================
// Admin Commands
// =============================================================================

fn add(ctx: &Context, id: &str, name: &str, price: &str, stock: &str) -> AppResult<()> {
    let product = Product::new(id.trim(), name.trim(), parse_price(price)?, parse_stock(stock)?);
    ctx.store.products().add(product.clone())?;
    ctx.emit(&product, |p| format!("Added {}", describe(p)))
}

/// Turns raw flag values into a patch; at least one field must be given.
fn build_patch(
    name: Option<String>,
    price: Option<&str>,
    stock: Option<&str>,
) -> AppResult<ProductPatch> {
    let patch = ProductPatch {
        name: name.map(|n| n.trim().to_string()),
        price: price.map(parse_price).transpose()?,
        stock: stock.map(parse_stock).transpose()?,
    };
    if patch.is_empty() {
        return Err(AppError::validation(
            "Nothing to update: pass --name, --price or --stock",
        ));
    }
    Ok(patch)
}

fn update(ctx: &Context, id: &str, patch: &ProductPatch) -> AppResult<()> {
    let products = ctx.store.products();
    products.update(id, patch)?;
    let product = products.find(id)?;
    ctx.emit(&product, |p| format!("Updated {}", describe(p)))
}

fn delete(ctx: &Context, id: &str) -> AppResult<()> {
    ctx.store.products().remove(id)?;
    ctx.emit(&serde_json::json!({ "removed": id }), |_| format!("Removed {}", id))
}

fn set_stock(ctx: &Context, id: &str, stock: &str) -> AppResult<()> {
    let stock = parse_stock(stock)?;
    let products = ctx.store.products();
    products.set_stock(id, stock)?;
    let product = products.find(id)?;
    ctx.emit(&product, |p| format!("Stock of {} is now {}", p.product_id, p.stock))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_core::Money;
    use tally_store::{Store, StoreConfig};

    fn context(dir: &std::path::Path) -> Context {
        Context::new(Store::open(StoreConfig::rooted_at(dir)), false)
    }

    #[test]
    fn test_add_then_set_stock() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        add(&ctx, "P001", "Pen", "1.50", "10").unwrap();
        set_stock(&ctx, "P001", "4").unwrap();

        let pen = ctx.store.products().find("P001").unwrap();
        assert_eq!(pen.price, Money::from_cents(150));
        assert_eq!(pen.stock, 4);
    }

    #[test]
    fn test_add_rejects_bad_price() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        let err = add(&ctx, "P001", "Pen", "abc", "10").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(ctx.store.products().count().unwrap(), 0);
    }

    #[test]
    fn test_empty_patch_is_rejected() {
        let err = build_patch(None, None, None).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let patch = build_patch(None, Some("2.25"), None).unwrap();
        assert_eq!(patch.price, Some(Money::from_cents(225)));
        assert!(patch.name.is_none());
    }

    #[test]
    fn test_missing_product_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());

        assert_eq!(show(&ctx, "P404").unwrap_err().code, ErrorCode::NotFound);
        assert_eq!(delete(&ctx, "P404").unwrap_err().code, ErrorCode::NotFound);
    }
}
