//! # Console Error Type
//!
//! Unified error type for `tally` commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally                                  │
//! │                                                                         │
//! │  Command Function                                                       │
//! │  Result<(), AppError>                                                   │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Store Error?     ─── StoreError::NotFound {..} ──────┐                │
//! │         │                                              │                │
//! │         ▼                                              ▼                │
//! │  Business Error?  ─── CoreError::EmptyCart ───────► AppError            │
//! │         │                                              │                │
//! │         ▼                                              ▼                │
//! │  Partial checkout ─── CheckoutError::Incomplete ──► RECONCILIATION_     │
//! │                                                     REQUIRED + file    │
//! │                                                        │                │
//! │                                                        ▼                │
//! │  stderr: "error: Product not found: P404"      exit status by code     │
//! │  --json: {"code": "NOT_FOUND", "message": "..."} on stdout             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use serde::Serialize;
use tally_core::{CoreError, ValidationError};
use tally_store::{CheckoutError, StoreError};
use thiserror::Error;

/// Error returned from console commands.
///
/// ## Serialization
/// With `--json`, this is what a failing command prints:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: P404"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[error("{message}")]
pub struct AppError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Saved progress of a partial checkout, for `tally resume`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending: Option<PathBuf>,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Product, customer or cart line missing
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Not enough stock for a requested quantity
    InsufficientStock,

    /// Checkout with nothing in the cart
    EmptyCart,

    /// File read/write failed, or a table is locked
    StorageError,

    /// Wrong customer or admin credentials
    AuthFailed,

    /// A checkout stopped part way; finish it with `tally resume`
    ReconciliationRequired,
}

impl ErrorCode {
    /// Process exit status for this code.
    pub fn exit_status(self) -> u8 {
        match self {
            ErrorCode::ValidationError => 2,
            ErrorCode::NotFound => 3,
            ErrorCode::InsufficientStock => 4,
            ErrorCode::EmptyCart => 5,
            ErrorCode::AuthFailed => 6,
            ErrorCode::StorageError => 10,
            ErrorCode::ReconciliationRequired => 11,
        }
    }
}

impl AppError {
    /// Creates a new error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError {
            code,
            message: message.into(),
            pending: None,
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        AppError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an authentication error.
    pub fn auth_failed() -> Self {
        AppError::new(ErrorCode::AuthFailed, "Invalid credentials")
    }

    /// Creates a storage error.
    pub fn storage(message: impl Into<String>) -> Self {
        AppError::new(ErrorCode::StorageError, message)
    }
}

/// Converts storage errors to console errors.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => AppError::not_found(&entity, &id),
            StoreError::Duplicate { field, value } => {
                AppError::validation(format!("{} '{}' already exists", field, value))
            }
            StoreError::InvalidCredentials => AppError::auth_failed(),
            StoreError::Core(e) => e.into(),
            StoreError::Validation(e) => e.into(),
            StoreError::Locked { .. } => AppError::storage(err.to_string()),
            other => {
                // Keep the detail in the log; paths help when fixing files by hand.
                tracing::error!(error = %other, "Storage operation failed");
                AppError::storage(other.to_string())
            }
        }
    }
}

/// Converts core errors to console errors.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(id) => AppError::not_found("Product", &id),
            CoreError::LineNotFound(id) => AppError::not_found("Cart line", &id),
            e @ CoreError::InsufficientStock { .. } => {
                AppError::new(ErrorCode::InsufficientStock, e.to_string())
            }
            CoreError::EmptyCart => AppError::new(ErrorCode::EmptyCart, "Cart is empty"),
            CoreError::CartTooLarge { max } => {
                AppError::validation(format!("Cart cannot have more than {} items", max))
            }
            CoreError::QuantityTooLarge { requested, max } => AppError::validation(format!(
                "Quantity {} exceeds maximum allowed ({})",
                requested, max
            )),
            CoreError::Validation(e) => e.into(),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::validation(err.to_string())
    }
}

/// A rejected checkout maps like any storage error. An incomplete one
/// needs the saved progress path, which the checkout command attaches.
impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rejected(e) => e.into(),
            incomplete @ CheckoutError::Incomplete { .. } => {
                AppError::new(ErrorCode::ReconciliationRequired, incomplete.to_string())
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::storage(format!("Could not encode output: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err: AppError = StoreError::not_found("Product", "P404").into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Product not found: P404");
    }

    #[test]
    fn test_nested_core_error_keeps_its_code() {
        let err: AppError = StoreError::Core(CoreError::EmptyCart).into();
        assert_eq!(err.code, ErrorCode::EmptyCart);

        let err: AppError = CheckoutError::Rejected(StoreError::Core(
            CoreError::InsufficientStock {
                product_id: "P001".to_string(),
                available: 2,
                requested: 5,
            },
        ))
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.code.exit_status(), 4);
    }

    #[test]
    fn test_credentials_map_to_auth_failed() {
        let err: AppError = StoreError::InvalidCredentials.into();
        assert_eq!(err.code, ErrorCode::AuthFailed);
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(AppError::not_found("Product", "P404")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Product not found: P404");
        assert!(json.get("pending").is_none());
    }
}
