//! # tally-core: Pure Transaction Engine for Tally POS
//!
//! This crate is the **heart** of Tally POS. It contains the transaction
//! engine as pure functions and plain data with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tally POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Dashboard UI                                 │   │
//! │  │    Product grid ──► Cart panel ──► Checkout dialog ──► Receipt  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               tally-checkout (session + commit)                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   units   │  │   cart    │  │  pricing  │  │ checkout  │  │   │
//! │  │   │  Catalog  │  │   Cart    │  │ discount  │  │ validate  │  │   │
//! │  │   │  convert  │  │ CartLine  │  │ tax/total │  │ finalize  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO ASYNC • NO CLOCKS • PURE FUNCTIONS               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`units`] - Unit catalog and converter
//! - [`cart`] - Cart store (lines keyed by product and sale unit)
//! - [`pricing`] - Discount, tax, total, change and due balance
//! - [`checkout`] - Checkout preconditions and sale payload assembly
//! - [`types`] - Product snapshots, checkout parameters, sale payload
//! - [`validation`] - Input checks and bounding helpers
//! - [`display`] - Presentation rounding and formatting
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input = same output, always
//! 2. **No I/O**: the sale collaborator lives in `tally-checkout`
//! 3. **Unrounded Arithmetic**: quantities and money are `f64` and are only
//!    rounded at presentation boundaries (see [`display`])
//! 4. **Explicit Errors**: every rejection is a typed enum variant
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::cart::Cart;
//! use tally_core::pricing::price_checkout;
//! use tally_core::types::{CheckoutParameters, Product};
//! use tally_core::units::UnitCatalog;
//!
//! let catalog = UnitCatalog::standard();
//! let oil = Product::new("p-oil", "Sunflower Oil", "OIL-5L", "l", 100.0, 5.0);
//!
//! let mut cart = Cart::new();
//! cart.add_or_merge_line(&catalog, &oil, "ml", 200.0).unwrap();
//!
//! let pricing = price_checkout(&cart, &CheckoutParameters::default());
//! assert!((pricing.total - 20.0).abs() < 1e-9);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod display;
pub mod error;
pub mod pricing;
pub mod types;
pub mod units;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine};
pub use error::{CartError, CheckoutError, ParseVariantError, UnitError};
pub use pricing::{PricingInput, PricingSummary};
pub use types::*;
pub use units::{ConversionClass, Unit, UnitCatalog};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Smallest quantity a fractional sale unit can be decremented to.
pub const MIN_FRACTIONAL_QUANTITY: f64 = 0.01;

/// Smallest quantity a whole-number sale unit can be decremented to.
pub const MIN_WHOLE_QUANTITY: f64 = 1.0;

/// Decimal places used when quantities are displayed.
pub const QUANTITY_DISPLAY_DECIMALS: u32 = 4;

/// Decimal places used when money is displayed.
pub const MONEY_DISPLAY_DECIMALS: u32 = 2;

/// Customer name recorded when a completed sale has no customer.
pub const DEFAULT_WALK_IN_CUSTOMER: &str = "Walk-in Customer";
