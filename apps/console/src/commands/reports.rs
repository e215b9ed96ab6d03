//! # Report Commands
//!
//! ```text
//! tally reports sales --from 2025-10-01 --to 2025-10-31 --user admin --password ...
//! tally reports low-stock --threshold 10 --user admin --password ...
//! ```
//!
//! Both commands print the report and write a CSV copy under `reports_dir`
//! when it has at least one row.

use chrono::{Local, NaiveDate};
use clap::Subcommand;

use super::{AdminAuth, Context};
use crate::error::{AppError, AppResult};
use tally_store::{LowStockReport, SalesReport};

#[derive(Debug, Subcommand)]
pub enum ReportAction {
    /// Sales between two dates, inclusive
    Sales {
        /// First day (YYYY-MM-DD); defaults to `--to`, so a bare call covers today
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD); defaults to today
        #[arg(long)]
        to: Option<NaiveDate>,
        #[command(flatten)]
        auth: AdminAuth,
    },
    /// Products with stock below a threshold
    LowStock {
        /// Defaults to TALLY_LOW_STOCK_THRESHOLD or 5
        #[arg(long)]
        threshold: Option<i64>,
        #[command(flatten)]
        auth: AdminAuth,
    },
}

pub fn run(ctx: &Context, action: ReportAction) -> AppResult<()> {
    match action {
        ReportAction::Sales { from, to, auth } => {
            ctx.require_admin(&auth)?;
            let today = Local::now().date_naive();
            let (from, to) = date_range(from, to, today)?;
            sales(ctx, from, to)
        }
        ReportAction::LowStock { threshold, auth } => {
            ctx.require_admin(&auth)?;
            let threshold = threshold.unwrap_or(ctx.store.config().low_stock_threshold);
            low_stock(ctx, threshold)
        }
    }
}

/// Fills in missing ends of the range and checks `from <= to`.
fn date_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<(NaiveDate, NaiveDate)> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or(to);
    if from > to {
        return Err(AppError::validation(format!(
            "Start date {} is after end date {}",
            from, to
        )));
    }
    Ok((from, to))
}

fn sales(ctx: &Context, from: NaiveDate, to: NaiveDate) -> AppResult<()> {
    let now = Local::now().naive_local();
    let report = ctx.store.reports().sales_report(from, to, now)?;
    ctx.emit(&report, render_sales)
}

fn low_stock(ctx: &Context, threshold: i64) -> AppResult<()> {
    let now = Local::now().naive_local();
    let report = ctx.store.reports().low_stock_report(threshold, now)?;
    ctx.emit(&report, render_low_stock)
}

fn render_sales(report: &SalesReport) -> String {
    if report.rows.is_empty() {
        return format!("No sales between {} and {}", report.from, report.to);
    }
    let mut out = format!("Sales {} .. {}", report.from, report.to);
    out.push_str(&format!(
        "\n{:<16} {:<12} {:<10} {:>10}",
        "Order", "Customer", "Date", "Total"
    ));
    for row in &report.rows {
        out.push_str(&format!(
            "\n{:<16} {:<12} {:<10} {:>10}",
            row.order_id,
            row.customer_id,
            row.date.to_string(),
            row.total.to_string()
        ));
    }
    out.push_str(&format!("\nTOTAL SALES: {}", report.total));
    if report.skipped > 0 {
        out.push_str(&format!("\n({} unreadable ledger rows skipped)", report.skipped));
    }
    if let Some(path) = &report.path {
        out.push_str(&format!("\nSaved to {}", path.display()));
    }
    out
}

fn render_low_stock(report: &LowStockReport) -> String {
    let mut out = if report.products.is_empty() {
        format!("No products below {} units", report.threshold)
    } else {
        let mut out = format!("Stock below {}:", report.threshold);
        for p in &report.products {
            out.push_str(&format!("\n  {:<10} {:<24} {:>5}", p.product_id, p.name, p.stock));
        }
        out.push_str(&format!("\nTOTAL LOW STOCK: {}", report.products.len()));
        out
    };
    for flag in &report.flagged {
        out.push_str(&format!("\n  ! {}", flag));
    }
    if let Some(path) = &report.path {
        out.push_str(&format!("\nSaved to {}", path.display()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_date_range_defaults() {
        let today = day(2025, 10, 12);
        assert_eq!(date_range(None, None, today).unwrap(), (today, today));
        assert_eq!(
            date_range(None, Some(day(2025, 9, 20)), today).unwrap(),
            (day(2025, 9, 20), day(2025, 9, 20))
        );
        assert_eq!(
            date_range(Some(day(2025, 10, 1)), None, today).unwrap(),
            (day(2025, 10, 1), today)
        );
    }

    #[test]
    fn test_date_range_rejects_reversed() {
        let err = date_range(Some(day(2025, 10, 5)), Some(day(2025, 10, 1)), day(2025, 10, 12))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_render_empty_sales() {
        let report = SalesReport {
            from: day(2025, 10, 1),
            to: day(2025, 10, 2),
            rows: Vec::new(),
            total: tally_core::Money::zero(),
            skipped: 0,
            path: None,
        };
        assert_eq!(render_sales(&report), "No sales between 2025-10-01 and 2025-10-02");
    }
}
