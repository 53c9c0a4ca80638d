//! # Validation Module
//!
//! Input checks shared by the cart, the pricing calculator and the checkout
//! validator.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Dashboard UI                                                 │
//! │  ├── min/max on inputs, immediate feedback                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE (engine)                                         │
//! │  ├── Quantities: finite, positive, whole for count units               │
//! │  ├── Product snapshots: finite, non-negative price and stock          │
//! │  ├── Rates & amounts: bounded before arithmetic                        │
//! │  └── Customer fields: non-blank for partial payment                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Sale collaborator (authoritative stock check)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CartError, CartResult};
use crate::types::Product;
use crate::units::Unit;

// =============================================================================
// Quantity Validators
// =============================================================================

/// Validates a quantity entered for a cart line.
///
/// ## Rules
/// - Must be a finite number
/// - Must be positive (> 0)
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_sale_quantity;
///
/// assert!(validate_sale_quantity(0.25).is_ok());
/// assert!(validate_sale_quantity(0.0).is_err());
/// assert!(validate_sale_quantity(f64::NAN).is_err());
/// ```
pub fn validate_sale_quantity(quantity: f64) -> CartResult<f64> {
    if !quantity.is_finite() || quantity <= 0.0 {
        return Err(CartError::InvalidQuantity(quantity));
    }

    Ok(quantity)
}

/// Validates a quantity against the step rules of its sale unit.
///
/// Units that don't allow fractions only accept whole quantities.
pub fn validate_quantity_for_unit(quantity: f64, unit: &Unit) -> CartResult<f64> {
    let quantity = validate_sale_quantity(quantity)?;

    if !unit.accepts_quantity(quantity) {
        return Err(CartError::InvalidQuantity(quantity));
    }

    Ok(quantity)
}

/// Validates a quantity delta (may be negative, must be finite).
pub fn validate_delta(delta: f64) -> CartResult<f64> {
    if !delta.is_finite() {
        return Err(CartError::InvalidQuantity(delta));
    }

    Ok(delta)
}

/// Rejects product snapshots whose price or stock would poison the totals.
pub fn validate_product_snapshot(product: &Product) -> CartResult<()> {
    let fields = [
        ("selling price", product.selling_price),
        ("stock quantity", product.stock_quantity),
    ];

    for (field, value) in fields {
        if !value.is_finite() || value < 0.0 {
            return Err(CartError::InvalidProduct {
                sku: product.sku.clone(),
                field,
                value,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Numeric Bounding
// =============================================================================

/// Treats NaN, infinities and negatives as zero.
///
/// ## Example
/// ```rust
/// use tally_core::validation::non_negative;
///
/// assert_eq!(non_negative(12.5), 12.5);
/// assert_eq!(non_negative(-3.0), 0.0);
/// assert_eq!(non_negative(f64::NAN), 0.0);
/// ```
#[inline]
pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Bounds a percentage to `[0, 100]`.
#[inline]
pub fn bounded_percentage(value: f64) -> f64 {
    non_negative(value).min(100.0)
}

// =============================================================================
// String Validators
// =============================================================================

/// True when the field is absent or only whitespace.
#[inline]
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// Trims a free-text field, dropping it when nothing is left.
pub fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================
