//! # Tally Console
//!
//! Command line front end for the Tally inventory and billing store.
//!
//! ## Usage
//!
//! ```bash
//! # Browse the catalog
//! tally products list
//!
//! # Register and buy
//! tally customers register --id C1 --name "Ada" --password secret
//! tally checkout --customer C1 --password secret --item P001=3 --item P002=1
//!
//! # Finish a checkout that stopped part way
//! tally resume data/pending/pending_ORD1760265900.json
//!
//! # Admin reports (credentials from flags or TALLY_ADMIN_USER / TALLY_ADMIN_PASSWORD)
//! tally reports low-stock --threshold 10
//!
//! # Machine-readable output
//! tally --json products show P001
//! ```
//!
//! ## Environment
//!
//! - `TALLY_DATA_DIR`, `TALLY_BILLS_DIR`, `TALLY_REPORTS_DIR` - storage locations
//! - `TALLY_STORE_TITLE`, `TALLY_LOW_STOCK_THRESHOLD` - bill header and report default
//! - `RUST_LOG` - log filter (logs go to stderr)

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tally_store::{Store, StoreConfig};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;

use commands::checkout::CheckoutArgs;
use commands::customers::CustomerAction;
use commands::products::ProductAction;
use commands::reports::ReportAction;
use commands::Context;
use error::{AppError, AppResult};

#[derive(Parser)]
#[command(name = "tally")]
#[command(author, version, about = "Tally inventory and billing")]
struct Cli {
    /// Directory holding products.csv, customers.csv, sales_log.csv and admin.csv
    #[arg(long, global = true, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Directory for bill files
    #[arg(long, global = true, env = "TALLY_BILLS_DIR")]
    bills_dir: Option<PathBuf>,

    /// Directory for report files
    #[arg(long, global = true, env = "TALLY_REPORTS_DIR")]
    reports_dir: Option<PathBuf>,

    /// Print results and errors as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse and manage the product catalog
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Customer accounts
    Customers {
        #[command(subcommand)]
        action: CustomerAction,
    },
    /// Buy items and write the bill
    Checkout(CheckoutArgs),
    /// Finish a checkout from its saved progress file
    Resume {
        /// Path printed by the failed checkout
        file: PathBuf,
    },
    /// Sales and low-stock reports
    Reports {
        #[command(subcommand)]
        action: ReportAction,
    },
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err, json);
            ExitCode::from(err.code.exit_status())
        }
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - Default: `warn` overall, `info` for the Tally crates
/// - Override with `RUST_LOG` (e.g. `RUST_LOG=tally_store=debug`)
///
/// Logs go to stderr so that stdout only carries command output.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tally_store=info,tally_console=info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Flags win over `TALLY_*` variables, which win over defaults.
fn config_from(cli: &Cli) -> StoreConfig {
    let mut config = StoreConfig::from_env();
    if let Some(dir) = &cli.data_dir {
        config = config.data_dir(dir);
    }
    if let Some(dir) = &cli.bills_dir {
        config = config.bills_dir(dir);
    }
    if let Some(dir) = &cli.reports_dir {
        config = config.reports_dir(dir);
    }
    config
}

fn run(cli: Cli) -> AppResult<()> {
    let ctx = Context::new(Store::open(config_from(&cli)), cli.json);

    match cli.command {
        Commands::Products { action } => commands::products::run(&ctx, action),
        Commands::Customers { action } => commands::customers::run(&ctx, action),
        Commands::Checkout(args) => commands::checkout::run(&ctx, args),
        Commands::Resume { file } => commands::checkout::resume(&ctx, &file),
        Commands::Reports { action } => commands::reports::run(&ctx, action),
    }
}

fn report(err: &AppError, json: bool) {
    if json {
        match serde_json::to_string_pretty(err) {
            Ok(body) => {
                println!("{}", body);
                return;
            }
            Err(e) => tracing::error!(error = %e, "Could not encode error as JSON"),
        }
    }

    eprintln!("error: {}", err);
    if let Some(path) = &err.pending {
        eprintln!("progress saved to {}", path.display());
        eprintln!("finish it with: tally resume {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_checkout() {
        let cli = Cli::try_parse_from([
            "tally", "--data-dir", "/tmp/shop", "checkout", "--customer", "C1", "--password",
            "pw", "--item", "P001=2", "--item", "P002=1",
        ])
        .unwrap();

        assert_eq!(config_from(&cli).data_dir, PathBuf::from("/tmp/shop"));
        match cli.command {
            Commands::Checkout(args) => {
                assert_eq!(args.customer, "C1");
                assert_eq!(
                    args.items,
                    vec![("P001".to_string(), 2), ("P002".to_string(), 1)]
                );
            }
            _ => panic!("expected checkout"),
        }
    }

    #[test]
    fn test_checkout_needs_an_item() {
        let parsed = Cli::try_parse_from([
            "tally", "checkout", "--customer", "C1", "--password", "pw",
        ]);
        assert!(parsed.is_err());
    }
}
