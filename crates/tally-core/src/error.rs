//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── UnitError        - Custom unit catalog construction failures      │
//! │  ├── CartError        - Rejected cart mutations                        │
//! │  ├── CheckoutError    - Failed checkout preconditions                  │
//! │  └── ParseVariantError - Unknown enum name in config/tickets           │
//! │                                                                         │
//! │  tally-checkout errors (separate crate)                                │
//! │  └── SessionError     - Wraps the above + commit outcomes              │
//! │                                                                         │
//! │  Flow: CartError/CheckoutError → SessionError → ErrorReport → UI       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, unit, amounts)
//! 3. Errors are enum variants, never String
//! 4. Every variant is recoverable: a rejected operation leaves state unchanged

use thiserror::Error;

// =============================================================================
// Cart Error
// =============================================================================

/// A cart mutation was rejected. The cart is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CartError {
    /// Quantity is zero, negative, not a number, or not a whole number for a
    /// unit that only sells whole quantities.
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(f64),

    /// The requested quantity, converted into the product's own unit,
    /// exceeds the known stock.
    ///
    /// ## User Workflow
    /// ```text
    /// Add 6 l of oil (stock: 5 l)
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "OIL-5L", available: 5, requested: 6, unit: "l" }
    ///      │
    ///      ▼
    /// UI warns: "Only 5 l of OIL-5L in stock"
    /// ```
    #[error("Insufficient stock for {sku}: available {available} {unit}, requested {requested} {unit}")]
    InsufficientStock {
        sku: String,
        available: f64,
        requested: f64,
        unit: String,
    },

    /// The unit is not registered in the catalog.
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    /// The sale unit cannot be converted into the product's unit.
    #[error("Cannot sell in {from}: product is stocked in {to}")]
    IncompatibleUnit { from: String, to: String },

    /// No line exists for the product in that sale unit.
    #[error("Product {product_id} is not in the cart as {sale_unit}")]
    LineNotFound {
        product_id: String,
        sale_unit: String,
    },

    /// The product snapshot carries a price or stock that can't be sold from.
    #[error("Product {sku} has invalid {field}: {value}")]
    InvalidProduct {
        sku: String,
        field: &'static str,
        value: f64,
    },
}

// =============================================================================
// Checkout Error
// =============================================================================

/// A checkout precondition failed. Detected before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    /// Partial payments create a due balance, so the customer must be known.
    #[error("Customer name and phone are required for partial payment")]
    CustomerInfoRequired,

    #[error("Received amount must be greater than zero for partial payment")]
    InvalidReceivedAmount,

    #[error("Received {received} exceeds total {total}; this is not a partial payment")]
    OverpaymentOnPartial { received: f64, total: f64 },

    #[error("Received {received} is less than total {total}")]
    InsufficientPayment { received: f64, total: f64 },

    /// The priced total is not a finite amount.
    #[error("Sale total {0} is not a valid amount")]
    InvalidTotal(f64),
}

// =============================================================================
// Unit Error
// =============================================================================

/// Building a custom unit catalog failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("Unit '{0}' is registered twice")]
    DuplicateUnit(String),

    #[error("Unit '{short_name}' has invalid conversion factor {factor}")]
    InvalidFactor { short_name: String, factor: f64 },

    #[error("Unit short name is required")]
    MissingShortName,
}

// =============================================================================
// Parse Error
// =============================================================================

/// A string did not name any variant of a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseVariantError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        ParseVariantError {
            kind,
            value: value.into(),
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for cart operations.
pub type CartResult<T> = Result<T, CartError>;

/// Convenience type alias for checkout validation.
pub type CheckoutResult<T> = Result<T, CheckoutError>;

// =============================================================================
// Unit Tests
// =============================================================================
