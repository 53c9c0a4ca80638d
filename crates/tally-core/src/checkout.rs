//! # Checkout
//!
//! Precondition checks and sale payload assembly. Dispatching the payload is
//! the caller's job (see `tally-checkout`); nothing here performs I/O.
//!
//! ## Validation Order
//! ```text
//! validate_checkout()  ── first failure wins ──
//!
//!   1. cart.is_empty()                        → EmptyCart
//!   2. total not finite                       → InvalidTotal
//!   3. Partial:
//!        blank name or phone                  → CustomerInfoRequired
//!        received <= 0 or not finite          → InvalidReceivedAmount
//!        received > total                     → OverpaymentOnPartial
//!   4. Completed:
//!        received < total or not finite       → InsufficientPayment
//! ```

use crate::cart::Cart;
use crate::error::{CheckoutError, CheckoutResult};
use crate::pricing::{price_checkout, PricingSummary};
use crate::types::{CheckoutParameters, FinalizedSale, PaymentStatus, SaleLineItem};
use crate::validation::{is_blank, trimmed};

/// Checks every checkout precondition against unrounded pricing.
pub fn validate_checkout(
    cart: &Cart,
    params: &CheckoutParameters,
    pricing: &PricingSummary,
) -> CheckoutResult<()> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let received = params.received_amount;
    let total = pricing.total;

    if !total.is_finite() {
        return Err(CheckoutError::InvalidTotal(total));
    }

    match params.payment_status {
        PaymentStatus::Partial => {
            if is_blank(params.customer_name.as_deref()) || is_blank(params.customer_phone.as_deref()) {
                return Err(CheckoutError::CustomerInfoRequired);
            }
            if !received.is_finite() || received <= 0.0 {
                return Err(CheckoutError::InvalidReceivedAmount);
            }
            if received > total {
                return Err(CheckoutError::OverpaymentOnPartial { received, total });
            }
        }
        PaymentStatus::Completed => {
            if !received.is_finite() || received < total {
                return Err(CheckoutError::InsufficientPayment { received, total });
            }
        }
    }

    Ok(())
}

/// Builds the payload for the sale collaborator.
///
/// Assumes [`validate_checkout`] has passed. For completed sales the received
/// amount is normalized to at least the total, so change is never negative.
pub fn build_finalized_sale(
    cart: &Cart,
    params: &CheckoutParameters,
    pricing: &PricingSummary,
    walk_in_customer: &str,
    idempotency_key: &str,
) -> FinalizedSale {
    let items = cart
        .lines()
        .iter()
        .map(|line| SaleLineItem {
            product_id: line.product_id.clone(),
            quantity: line.base_quantity,
            unit_price: line.unit_price,
            product_name: line.product_name.clone(),
            sku: line.sku.clone(),
            sale_unit: line.sale_unit.clone(),
            sale_quantity: line.sale_quantity,
            line_total: line.subtotal,
        })
        .collect();

    let received_amount = match params.payment_status {
        PaymentStatus::Completed => params.received_amount.max(pricing.total),
        PaymentStatus::Partial => params.received_amount,
    };

    let customer_name =
        trimmed(params.customer_name.as_deref()).unwrap_or_else(|| walk_in_customer.to_string());

    FinalizedSale {
        items,
        subtotal: pricing.subtotal,
        discount_type: params.discount_type,
        discount_amount: pricing.discount_amount,
        tax_rate_percent: params.tax_rate_percent,
        tax_amount: pricing.tax_amount,
        total: pricing.total,
        payment_method: params.payment_method,
        payment_status: params.payment_status,
        received_amount,
        change_amount: pricing.change_amount,
        due_amount: pricing.due_amount,
        customer_name,
        customer_phone: trimmed(params.customer_phone.as_deref()),
        notes: trimmed(params.notes.as_deref()),
        idempotency_key: idempotency_key.to_string(),
    }
}

/// Prices, validates and builds the sale payload in one step.
///
/// ## Example
/// ```rust
/// use tally_core::checkout::finalize_checkout;
/// use tally_core::{Cart, CheckoutParameters, Product, UnitCatalog};
/// use tally_core::error::CheckoutError;
///
/// let catalog = UnitCatalog::standard();
/// let soap = Product::new("p1", "Soap", "SOAP", "pcs", 2.0, 10.0);
/// let mut cart = Cart::new();
///
/// let params = CheckoutParameters { received_amount: 10.0, ..Default::default() };
/// assert_eq!(
///     finalize_checkout(&cart, &params, "Walk-in Customer", "key-1").unwrap_err(),
///     CheckoutError::EmptyCart
/// );
///
/// cart.add_or_merge_line(&catalog, &soap, "pcs", 3.0).unwrap();
/// let sale = finalize_checkout(&cart, &params, "Walk-in Customer", "key-1").unwrap();
/// assert_eq!(sale.total, 6.0);
/// assert_eq!(sale.change_amount, 4.0);
/// assert_eq!(sale.customer_name, "Walk-in Customer");
/// ```
pub fn finalize_checkout(
    cart: &Cart,
    params: &CheckoutParameters,
    walk_in_customer: &str,
    idempotency_key: &str,
) -> CheckoutResult<FinalizedSale> {
    let pricing = price_checkout(cart, params);
    validate_checkout(cart, params, &pricing)?;
    Ok(build_finalized_sale(cart, params, &pricing, walk_in_customer, idempotency_key))
}

// =============================================================================
// Unit Tests
// =============================================================================
