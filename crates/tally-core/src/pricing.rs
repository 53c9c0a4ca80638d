//! # Pricing Calculator
//!
//! Discount, tax, total, change and due balance as a pure function of
//! explicit inputs.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Pricing Pipeline                                   │
//! │                                                                         │
//! │  Σ line.subtotal ──────────────────────────────────► subtotal          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount_amount(subtotal, value, type) ───────────► discount          │
//! │       │   Percentage:   subtotal × value / 100                         │
//! │       │   FixedAmount:  value, capped at subtotal                      │
//! │       │   SpecialOffer: min(value, subtotal)                           │
//! │       ▼                                                                 │
//! │  (subtotal - discount) × tax_rate / 100 ───────────► tax               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  subtotal - discount + tax ────────────────────────► total             │
//! │       │                                                                 │
//! │       ├── Completed: change = max(0, received - total), due = 0        │
//! │       └── Partial:   due = max(0, total - received),   change = 0      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Input Bounding
//! The calculator does not trust its inputs. Non-finite or negative discount
//! values, tax rates and received amounts count as zero, percentages are
//! clamped to `[0, 100]` and absolute discounts never exceed the subtotal, so
//! `total >= 0` holds in every discount mode.
//!
//! ## Rounding
//! Every output is unrounded. Validation compares unrounded values; use
//! [`PricingSummary::rounded`] for display.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::display::round_money;
use crate::types::{CheckoutParameters, DiscountType, PaymentStatus};
use crate::validation::{bounded_percentage, non_negative};

// =============================================================================
// Input / Output
// =============================================================================

/// Everything the calculator depends on, and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PricingInput {
    pub subtotal: f64,
    pub discount_value: f64,
    pub discount_type: DiscountType,
    pub tax_rate_percent: f64,
    pub payment_status: PaymentStatus,
    pub received_amount: f64,
}

impl PricingInput {
    /// Collects the calculator inputs from a cart and the checkout dialog.
    pub fn new(cart: &Cart, params: &CheckoutParameters) -> Self {
        PricingInput {
            subtotal: cart.subtotal(),
            discount_value: params.discount_value,
            discount_type: params.discount_type,
            tax_rate_percent: params.tax_rate_percent,
            payment_status: params.payment_status,
            received_amount: params.received_amount,
        }
    }
}

/// Calculator output.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingSummary {
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub change_amount: f64,
    pub due_amount: f64,
}

impl PricingSummary {
    /// Amount tax is charged on.
    pub fn pre_tax_amount(&self) -> f64 {
        self.subtotal - self.discount_amount
    }

    /// Display copy with every field rounded to 2 decimal places.
    pub fn rounded(&self) -> Self {
        PricingSummary {
            subtotal: round_money(self.subtotal),
            discount_amount: round_money(self.discount_amount),
            tax_amount: round_money(self.tax_amount),
            total: round_money(self.total),
            change_amount: round_money(self.change_amount),
            due_amount: round_money(self.due_amount),
        }
    }
}

// =============================================================================
// Calculation
// =============================================================================

/// Discount for a subtotal under the given mode.
///
/// ## Example
/// ```rust
/// use tally_core::pricing::discount_amount;
/// use tally_core::types::DiscountType;
///
/// assert_eq!(discount_amount(1000.0, 10.0, DiscountType::Percentage), 100.0);
/// assert_eq!(discount_amount(500.0, 800.0, DiscountType::SpecialOffer), 500.0);
/// assert_eq!(discount_amount(500.0, -20.0, DiscountType::FixedAmount), 0.0);
/// ```
pub fn discount_amount(subtotal: f64, value: f64, discount_type: DiscountType) -> f64 {
    let subtotal = non_negative(subtotal);

    match discount_type {
        DiscountType::Percentage => subtotal * bounded_percentage(value) / 100.0,
        DiscountType::FixedAmount | DiscountType::SpecialOffer => non_negative(value).min(subtotal),
    }
}

/// Runs the full pricing pipeline.
pub fn calculate(input: &PricingInput) -> PricingSummary {
    let subtotal = input.subtotal;
    let discount = discount_amount(subtotal, input.discount_value, input.discount_type);
    let tax = (subtotal - discount) * non_negative(input.tax_rate_percent) / 100.0;
    let total = subtotal - discount + tax;
    let received = non_negative(input.received_amount);

    let (change_amount, due_amount) = match input.payment_status {
        PaymentStatus::Completed => ((received - total).max(0.0), 0.0),
        PaymentStatus::Partial => (0.0, (total - received).max(0.0)),
    };

    PricingSummary {
        subtotal,
        discount_amount: discount,
        tax_amount: tax,
        total,
        change_amount,
        due_amount,
    }
}

/// Prices a cart against the checkout dialog's current values.
pub fn price_checkout(cart: &Cart, params: &CheckoutParameters) -> PricingSummary {
    calculate(&PricingInput::new(cart, params))
}

// =============================================================================
// Unit Tests
// =============================================================================
