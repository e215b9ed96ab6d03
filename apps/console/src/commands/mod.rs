//! # Console Commands Module
//!
//! One module per command group of the `tally` binary.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (Context, admin auth, output)
//! ├── products.rs   ◄─── Catalog listing and administration
//! ├── customers.rs  ◄─── Registration and login
//! ├── checkout.rs   ◄─── Checkout and resume of partial checkouts
//! └── reports.rs    ◄─── Sales and low-stock reports
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Console Command Flow                                 │
//! │                                                                         │
//! │  $ tally --json products show P001                                     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  main.rs: clap parses Cli, builds StoreConfig, opens Store             │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  products::show(&ctx, "P001") -> AppResult<()>                         │
//! │         │                                                               │
//! │         ├── Ok:  ctx.emit(&product, text) ──► stdout                   │
//! │         │         (JSON with --json, plain text otherwise)              │
//! │         │                                                               │
//! │         └── Err: AppError ──► stderr / JSON, exit status by code       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod checkout;
pub mod customers;
pub mod products;
pub mod reports;

use clap::Args;
use serde::Serialize;
use tally_store::Store;

use crate::error::{AppError, AppResult};

/// Credentials for commands that change the catalog or read reports.
#[derive(Debug, Clone, Args)]
pub struct AdminAuth {
    /// Admin username
    #[arg(long = "user", env = "TALLY_ADMIN_USER")]
    pub user: String,

    /// Admin password
    #[arg(long = "password", env = "TALLY_ADMIN_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Everything a command needs: the opened store and the output mode.
#[derive(Debug)]
pub struct Context {
    pub store: Store,
    pub json: bool,
}

impl Context {
    pub fn new(store: Store, json: bool) -> Self {
        Context { store, json }
    }

    /// Prints `value` as pretty JSON, or the text produced by `text`.
    pub fn emit<T, F>(&self, value: &T, text: F) -> AppResult<()>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        println!("{}", self.render(value, text)?);
        Ok(())
    }

    fn render<T, F>(&self, value: &T, text: F) -> AppResult<String>
    where
        T: Serialize,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            Ok(serde_json::to_string_pretty(value)?)
        } else {
            Ok(text(value))
        }
    }

    /// Fails with `AUTH_FAILED` unless `auth` matches a row of `admin.csv`.
    pub fn require_admin(&self, auth: &AdminAuth) -> AppResult<()> {
        if self.store.admins().authenticate(&auth.user, &auth.password)? {
            Ok(())
        } else {
            Err(AppError::auth_failed())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_store::repository::admin::ADMIN_FIELDS;
    use tally_store::table::record;
    use tally_store::StoreConfig;

    fn context(dir: &std::path::Path, json: bool) -> Context {
        Context::new(Store::open(StoreConfig::rooted_at(dir)), json)
    }

    fn auth(user: &str, password: &str) -> AdminAuth {
        AdminAuth {
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_render_switches_on_json_flag() {
        let dir = tempfile::tempdir().unwrap();
        let value = serde_json::json!({ "id": "P001" });

        let text = context(dir.path(), false)
            .render(&value, |v| format!("id={}", v["id"].as_str().unwrap_or("")))
            .unwrap();
        assert_eq!(text, "id=P001");

        let json = context(dir.path(), true).render(&value, |_| String::new()).unwrap();
        let back: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back["id"], "P001");
    }

    #[test]
    fn test_require_admin() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path(), false);

        // No admin file yet
        let err = ctx.require_admin(&auth("admin", "admin123")).unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);

        ctx.store
            .records()
            .append_record(
                &ctx.store.config().admin_path(),
                &ADMIN_FIELDS,
                &record([("username", "admin"), ("password", "admin123")]),
            )
            .unwrap();

        assert!(ctx.require_admin(&auth("admin", "admin123")).is_ok());
        assert!(ctx.require_admin(&auth("admin", "wrong")).is_err());
    }
}
