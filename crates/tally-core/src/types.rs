//! # Domain Types
//!
//! Data the transaction engine consumes and produces.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────┐   │
//! │  │    Product      │   │ CheckoutParameters  │   │  FinalizedSale  │   │
//! │  │  (consumed)     │   │  (checkout input)   │   │  (produced)     │   │
//! │  │  ─────────────  │   │  ─────────────────  │   │  ─────────────  │   │
//! │  │  id, sku, name  │   │  discount value/type│   │  items          │   │
//! │  │  unit           │   │  tax rate %         │   │  money fields   │   │
//! │  │  selling_price  │   │  payment method     │   │  payment fields │   │
//! │  │  stock_quantity │   │  payment status     │   │  customer       │   │
//! │  └─────────────────┘   │  received amount    │   │  idempotency key│   │
//! │                        └─────────────────────┘   └─────────────────┘   │
//! │                                                                         │
//! │  Closed enums: DiscountType, PaymentMethod, PaymentStatus              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Semantics
//! Products are owned by the external catalog service. The engine only reads
//! point-in-time snapshots and never writes stock back.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ParseVariantError;

// =============================================================================
// Product
// =============================================================================

/// Point-in-time snapshot of a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Short name of the unit stock and price are expressed in.
    pub unit: String,

    /// Price of one `unit`.
    pub selling_price: f64,

    /// Stock on hand, expressed in `unit`.
    pub stock_quantity: f64,

    #[serde(default)]
    pub low_stock_threshold: f64,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        sku: impl Into<String>,
        unit: impl Into<String>,
        selling_price: f64,
        stock_quantity: f64,
    ) -> Self {
        Product {
            id: id.into(),
            name: name.into(),
            sku: sku.into(),
            unit: unit.into(),
            selling_price,
            stock_quantity,
            low_stock_threshold: 0.0,
        }
    }

    /// True when stock is at or below the product's threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.low_stock_threshold
    }
}

// =============================================================================
// Discount Type
// =============================================================================

/// How `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountType {
    /// `subtotal × value / 100`.
    #[default]
    Percentage,
    /// An absolute amount off the subtotal.
    FixedAmount,
    /// An absolute amount that can never exceed the subtotal.
    SpecialOffer,
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::FixedAmount => write!(f, "fixed_amount"),
            DiscountType::SpecialOffer => write!(f, "special_offer"),
        }
    }
}

impl FromStr for DiscountType {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "percentage" | "percent" => Ok(DiscountType::Percentage),
            "fixed_amount" | "fixed" => Ok(DiscountType::FixedAmount),
            "special_offer" | "offer" => Ok(DiscountType::SpecialOffer),
            _ => Err(ParseVariantError::new("discount type", s)),
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    MobileBanking,
    BankTransfer,
    DigitalWallet,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::MobileBanking => write!(f, "mobile_banking"),
            PaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            PaymentMethod::DigitalWallet => write!(f, "digital_wallet"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" | "credit" | "debit" => Ok(PaymentMethod::Card),
            "mobile_banking" | "mobile" => Ok(PaymentMethod::MobileBanking),
            "bank_transfer" | "transfer" => Ok(PaymentMethod::BankTransfer),
            "digital_wallet" | "wallet" => Ok(PaymentMethod::DigitalWallet),
            _ => Err(ParseVariantError::new("payment method", s)),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Whether the customer pays in full now or leaves a due balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[default]
    Completed,
    Partial,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Partial => write!(f, "partial"),
        }
    }
}

// =============================================================================
// Checkout Parameters
// =============================================================================

/// Everything the cashier enters in the checkout dialog.
///
/// Not persisted by the engine; it feeds the pricing calculator and the
/// checkout validator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutParameters {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub discount_value: f64,
    pub discount_type: DiscountType,
    pub tax_rate_percent: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub received_amount: f64,
    pub notes: Option<String>,
}

// =============================================================================
// Finalized Sale
// =============================================================================

/// One line of the sale payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineItem {
    pub product_id: String,
    /// Quantity in the product's own unit (what stock is decremented by).
    pub quantity: f64,
    pub unit_price: f64,
    /// Name at time of sale (frozen).
    pub product_name: String,
    /// SKU at time of sale (frozen).
    pub sku: String,
    /// What the customer asked for, for the receipt.
    pub sale_unit: String,
    pub sale_quantity: f64,
    /// `quantity × unit_price`.
    pub line_total: f64,
}

/// The payload handed to the sale-persistence collaborator.
///
/// The engine never assigns an identity or invoice number; those come back
/// on the collaborator's confirmation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FinalizedSale {
    pub items: Vec<SaleLineItem>,
    pub subtotal: f64,
    pub discount_type: DiscountType,
    pub discount_amount: f64,
    pub tax_rate_percent: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub received_amount: f64,
    pub change_amount: f64,
    pub due_amount: f64,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub notes: Option<String>,
    /// Client-generated key letting the collaborator detect retried commits.
    pub idempotency_key: String,
}

// =============================================================================
// Unit Tests
// =============================================================================
