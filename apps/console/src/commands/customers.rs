//! # Customer Commands
//!
//! ```text
//! tally customers register --id C1 --name "Ada" --password secret
//! tally customers login --id C1 --password secret
//! ```

use clap::Subcommand;
use tally_core::Customer;

use super::Context;
use crate::error::AppResult;

#[derive(Debug, Subcommand)]
pub enum CustomerAction {
    /// Create a customer account
    Register {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, env = "TALLY_CUSTOMER_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Check customer credentials
    Login {
        #[arg(long)]
        id: String,
        #[arg(long, env = "TALLY_CUSTOMER_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

pub fn run(ctx: &Context, action: CustomerAction) -> AppResult<()> {
    match action {
        CustomerAction::Register { id, name, password } => register(ctx, &id, &name, &password),
        CustomerAction::Login { id, password } => login(ctx, &id, &password),
    }
}

fn register(ctx: &Context, id: &str, name: &str, password: &str) -> AppResult<()> {
    let customer = Customer::new(id.trim(), name.trim(), password);
    ctx.store.customers().register(&customer)?;
    ctx.emit(&customer, |c| format!("Registered {} ({})", c.customer_id, c.name))
}

fn login(ctx: &Context, id: &str, password: &str) -> AppResult<()> {
    let customer = ctx.store.customers().authenticate(id, password)?;
    ctx.emit(&customer, |c| format!("Welcome, {}!", c.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use tally_store::{Store, StoreConfig};

    #[test]
    fn test_register_then_login() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(Store::open(StoreConfig::rooted_at(dir.path())), false);

        register(&ctx, "C1", "Ada", "secret").unwrap();
        login(&ctx, "C1", "secret").unwrap();

        let err = login(&ctx, "C1", "wrong").unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthFailed);

        let err = register(&ctx, "C1", "Someone Else", "pw").unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
