//! # Session Error Types
//!
//! Everything a register operation can fail with, and the serializable
//! report the UI receives.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tally POS                              │
//! │                                                                         │
//! │  CartError ─────────┐                                                   │
//! │  CheckoutError ─────┼──► SessionError ──► ErrorReport { code, message } │
//! │  GatewayError ──────┘         │                     │                   │
//! │                               │                     ▼                   │
//! │                               │              UI switches on `code`      │
//! │                               ▼                                         │
//! │                   session state unchanged                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every variant is recoverable. None of them leave the cart or checkout
//! parameters half-modified.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use tally_core::{CartError, CheckoutError};

use crate::config::ConfigError;
use crate::gateway::GatewayError;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    /// A cart mutation was rejected.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A checkout precondition failed before anything was sent.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The sale service's stock check failed at commit time.
    #[error("Insufficient stock for product {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: f64,
        requested: f64,
    },

    /// The sale service failed or refused the sale.
    #[error("Commit failed: {reason}")]
    CommitFailed { reason: String, retryable: bool },

    /// A commit is already in flight for this session.
    #[error("A checkout is already in progress")]
    CommitInProgress,

    /// The cart can't change while its commit is in flight.
    #[error("Cart is locked while a checkout is in progress")]
    CommitPending,
}

impl SessionError {
    /// Whether the user can retry the same action without changing anything.
    pub fn is_retryable(&self) -> bool {
        match self {
            SessionError::InsufficientStock { .. } => true,
            SessionError::CommitFailed { retryable, .. } => *retryable,
            SessionError::CommitInProgress | SessionError::CommitPending => true,
            SessionError::Cart(_) | SessionError::Checkout(_) => false,
        }
    }
}

impl From<GatewayError> for SessionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::StockConflict {
                product_id,
                available,
                requested,
            } => SessionError::InsufficientStock {
                product_id,
                available,
                requested,
            },
            GatewayError::Rejected(reason) => SessionError::CommitFailed {
                reason,
                retryable: false,
            },
            GatewayError::Unavailable(reason) => SessionError::CommitFailed {
                reason,
                retryable: true,
            },
        }
    }
}

// =============================================================================
// Error Report
// =============================================================================

/// Machine-readable error codes.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (report.code) {
///   case 'INSUFFICIENT_STOCK':
///     showStockWarning(report.message);
///     break;
///   case 'CUSTOMER_INFO_REQUIRED':
///     focusCustomerFields();
///     break;
///   default:
///     showError(report.message);
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidQuantity,
    InsufficientStock,
    /// Unknown unit, or a unit the product can't be sold in.
    UnitError,
    LineNotFound,
    ProductNotFound,
    EmptyCart,
    CustomerInfoRequired,
    /// Received amount doesn't fit the payment status.
    PaymentError,
    CommitFailed,
    CommitInProgress,
    /// The product snapshot has a price or stock that can't be sold from.
    InvalidProduct,
    /// register.toml could not be read or failed validation.
    Config,
}

/// What the UI receives when an operation fails.
///
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for OIL-5L: available 5 l, requested 6 l",
///   "retryable": false
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ErrorReport {
            code,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn product_not_found(product_id: &str) -> Self {
        ErrorReport::new(
            ErrorCode::ProductNotFound,
            format!("Product not found: {}", product_id),
        )
    }

}

impl From<&ConfigError> for ErrorReport {
    fn from(err: &ConfigError) -> Self {
        ErrorReport::new(ErrorCode::Config, err.to_string())
    }
}

impl From<&SessionError> for ErrorReport {
    fn from(err: &SessionError) -> Self {
        let code = match err {
            SessionError::Cart(cart) => match cart {
                CartError::InvalidQuantity(_) => ErrorCode::InvalidQuantity,
                CartError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CartError::UnknownUnit(_) | CartError::IncompatibleUnit { .. } => ErrorCode::UnitError,
                CartError::LineNotFound { .. } => ErrorCode::LineNotFound,
                CartError::InvalidProduct { .. } => ErrorCode::InvalidProduct,
            },
            SessionError::Checkout(checkout) => match checkout {
                CheckoutError::EmptyCart => ErrorCode::EmptyCart,
                CheckoutError::CustomerInfoRequired => ErrorCode::CustomerInfoRequired,
                CheckoutError::InvalidReceivedAmount
                | CheckoutError::OverpaymentOnPartial { .. }
                | CheckoutError::InsufficientPayment { .. }
                | CheckoutError::InvalidTotal(_) => ErrorCode::PaymentError,
            },
            SessionError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            SessionError::CommitFailed { .. } => ErrorCode::CommitFailed,
            SessionError::CommitInProgress | SessionError::CommitPending => ErrorCode::CommitInProgress,
        };

        ErrorReport {
            code,
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<SessionError> for ErrorReport {
    fn from(err: SessionError) -> Self {
        ErrorReport::from(&err)
    }
}

impl std::fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorReport {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_errors_map_to_session_errors() {
        let err: SessionError = GatewayError::StockConflict {
            product_id: "p1".into(),
            available: 1.0,
            requested: 2.0,
        }
        .into();
        assert!(matches!(err, SessionError::InsufficientStock { .. }));
        assert!(err.is_retryable());

        let err: SessionError = GatewayError::Unavailable("timeout".into()).into();
        assert_eq!(
            err,
            SessionError::CommitFailed {
                reason: "timeout".into(),
                retryable: true
            }
        );

        let err: SessionError = GatewayError::Rejected("register closed".into()).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_report_codes() {
        let report = ErrorReport::from(SessionError::from(CheckoutError::CustomerInfoRequired));
        assert_eq!(report.code, ErrorCode::CustomerInfoRequired);
        assert!(!report.retryable);

        let report = ErrorReport::from(SessionError::from(CartError::UnknownUnit("bushel".into())));
        assert_eq!(report.code, ErrorCode::UnitError);
        assert_eq!(report.message, "Unknown unit: bushel");
    }

    #[test]
    fn test_snapshot_and_config_reports() {
        let report = ErrorReport::from(SessionError::from(CartError::InvalidProduct {
            sku: "RICE".into(),
            field: "selling price",
            value: f64::NAN,
        }));
        assert_eq!(report.code, ErrorCode::InvalidProduct);
        assert_eq!(report.message, "Product RICE has invalid selling price: NaN");

        let report = ErrorReport::from(SessionError::from(CheckoutError::InvalidTotal(f64::INFINITY)));
        assert_eq!(report.code, ErrorCode::PaymentError);

        let report = ErrorReport::from(&ConfigError::Invalid("currency_decimals must be at most 4, got 6".into()));
        assert_eq!(report.code, ErrorCode::Config);
        assert!(report.message.contains("currency_decimals"));
        assert!(!report.retryable);
    }

    #[test]
    fn test_report_serialization() {
        let report = ErrorReport::from(SessionError::from(CheckoutError::EmptyCart));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["code"], "EMPTY_CART");
        assert_eq!(json["message"], "Cart is empty");
        assert_eq!(json["retryable"], false);
    }
}
