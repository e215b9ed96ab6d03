//! # Bill Rendering
//!
//! Turns a finalized [`Order`] into the two bill artifacts. Rendering is
//! pure: this module builds strings and rows, `tally-store` writes them.
//!
//! ## Artifacts
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Order ──► Bill { bill_id, issued_at, ... }                            │
//! │              │                                                          │
//! │              ├──► render_text()    fixed-width invoice  (.txt)          │
//! │              │                                                          │
//! │              └──► tabular_rows()   rows with header, blank separator,   │
//! │                                    TOTAL summary row   (.csv)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::cart::CartLine;
use crate::money::Money;
use crate::types::Order;

/// Width of the text invoice in characters.
pub const BILL_WIDTH: usize = 45;

/// Number of columns in every tabular bill row.
pub const TABULAR_COLUMNS: usize = 4;

const NAME_WIDTH: usize = 20;
const COLUMN_WIDTH: usize = 10;

/// Everything printed on a bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub bill_id: String,
    pub order_id: String,
    pub customer_id: String,
    pub issued_at: NaiveDateTime,
    pub lines: Vec<CartLine>,
    pub total: Money,
}

impl Bill {
    /// Creates the bill for an order.
    pub fn for_order(order: &Order, bill_id: impl Into<String>, issued_at: NaiveDateTime) -> Self {
        Bill {
            bill_id: bill_id.into(),
            order_id: order.order_id.clone(),
            customer_id: order.customer_id.clone(),
            issued_at,
            lines: order.lines.clone(),
            total: order.total,
        }
    }

    /// Issue time as printed on both artifacts, e.g. `12-10-2025 10:45:00`.
    pub fn issued_at_display(&self) -> String {
        self.issued_at.format("%d-%m-%Y %H:%M:%S").to_string()
    }

    /// Renders the fixed-width text invoice.
    ///
    /// ```text
    /// =============================================
    ///          INVENTORY MANAGEMENT SYSTEM
    /// =============================================
    /// Bill ID     : INV20251012104500AB12
    /// ...
    /// Item                Qty       Price     Subtotal
    /// ---------------------------------------------
    /// Pen                 3         10.00     30.00
    /// ---------------------------------------------
    /// TOTAL                                   30.00
    /// ```
    pub fn render_text(&self, title: &str) -> String {
        let heavy = "=".repeat(BILL_WIDTH);
        let light = "-".repeat(BILL_WIDTH);

        let mut out: Vec<String> = vec![
            heavy.clone(),
            format!("{:^width$}", title, width = BILL_WIDTH),
            heavy.clone(),
            format!("Bill ID     : {}", self.bill_id),
            format!("Customer ID : {}", self.customer_id),
            format!("Order ID    : {}", self.order_id),
            format!("Date        : {}", self.issued_at_display()),
            light.clone(),
            table_row("Item", "Qty", "Price", "Subtotal"),
            light.clone(),
        ];

        for line in &self.lines {
            out.push(table_row(
                &fit(&line.name, NAME_WIDTH - 1),
                &line.qty.to_string(),
                &line.price.to_plain_string(),
                &line.subtotal().to_plain_string(),
            ));
        }

        out.push(light);
        out.push(table_row("TOTAL", "", "", &self.total.to_plain_string()));
        out.push(heavy.clone());
        out.push(format!("{:^width$}", "THANK YOU FOR YOUR PURCHASE!", width = BILL_WIDTH));
        out.push(heavy);

        let mut text = out
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        text.push('\n');
        text
    }

    /// Builds the tabular bill: metadata rows, a blank row, a header row,
    /// one row per line, a blank separator, and the `TOTAL` row.
    ///
    /// Every row has exactly [`TABULAR_COLUMNS`] fields; blank rows are all
    /// empty fields.
    pub fn tabular_rows(&self) -> Vec<Vec<String>> {
        let mut rows = vec![
            padded(&["Bill ID", &self.bill_id]),
            padded(&["Customer ID", &self.customer_id]),
            padded(&["Order ID", &self.order_id]),
            padded(&["Date", &self.issued_at_display()]),
            padded(&[]),
            padded(&["Item Name", "Quantity", "Price", "Subtotal"]),
        ];

        for line in &self.lines {
            rows.push(vec![
                line.name.clone(),
                line.qty.to_string(),
                line.price.to_plain_string(),
                line.subtotal().to_plain_string(),
            ]);
        }

        rows.push(padded(&[]));
        rows.push(padded(&["", "", "TOTAL", &self.total.to_plain_string()]));
        rows.push(padded(&[]));
        rows.push(padded(&["Thank you for your purchase!"]));
        rows
    }
}

fn table_row(name: &str, qty: &str, price: &str, subtotal: &str) -> String {
    format!(
        "{:<nw$}{:<cw$}{:<cw$}{:<cw$}",
        name,
        qty,
        price,
        subtotal,
        nw = NAME_WIDTH,
        cw = COLUMN_WIDTH
    )
}

/// Cuts `text` to at most `max` characters so columns stay aligned.
fn fit(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

fn padded(fields: &[&str]) -> Vec<String> {
    let mut row: Vec<String> = fields.iter().map(|f| f.to_string()).collect();
    row.resize(TABULAR_COLUMNS, String::new());
    row
}
