//! # Cart Store
//!
//! The in-memory cart: an ordered list of lines keyed by
//! `(product_id, sale_unit)`.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  UI Action               Operation                 State Change         │
//! │  ─────────               ─────────                 ────────────         │
//! │                                                                         │
//! │  Click Product ────────► add_or_merge_line() ────► push / merge line   │
//! │                                                                         │
//! │  +/- Buttons ──────────► update_quantity() ──────► line.qty += delta   │
//! │                                                                         │
//! │  Type Quantity ────────► set_quantity() ─────────► line.qty = n        │
//! │                                                                         │
//! │  Click Remove ─────────► remove_line() ──────────► lines.remove(i)     │
//! │                                                                         │
//! │  Cancel Sale ──────────► clear() ────────────────► lines.clear()       │
//! │                                                                         │
//! │  Every rejected operation leaves the cart exactly as it was.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Units
//! A line is priced and stocked in the product's own unit but bought in a
//! sale unit: 200 ml of a product stocked in liters is a line with
//! `sale_quantity = 200`, `sale_unit = "ml"`, `base_quantity = 0.2`.
//!
//! ## Stock Checks
//! Stock checks here are advisory: they give the cashier fast feedback from
//! the product snapshot. The sale collaborator performs the authoritative
//! check-and-decrement when the sale is committed.
//!
//! Each line is checked against the snapshot on its own. The same product in
//! two sale units (4 l plus 1500 ml against 5 l) is accepted here and refused
//! by the collaborator; [`Cart::reserved_base_quantity`] reports the combined
//! amount so callers can warn before committing.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CartError, CartResult};
use crate::types::Product;
use crate::units::UnitCatalog;
use crate::validation::{
    validate_delta, validate_product_snapshot, validate_quantity_for_unit, validate_sale_quantity,
};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart.
///
/// ## Snapshot Fields
/// `product_name`, `sku`, `unit_price`, `stock_unit` and `stock_quantity` are
/// frozen from the product when the line is added (and refreshed when the
/// same product is added again), so quantity updates can re-check stock
/// without another catalog read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,

    /// Unit the customer is buying in.
    pub sale_unit: String,

    /// Quantity the customer is buying, in `sale_unit`.
    pub sale_quantity: f64,

    /// `sale_quantity` converted into `stock_unit`.
    pub base_quantity: f64,

    /// Product selling price per `stock_unit`.
    pub unit_price: f64,

    /// `base_quantity × unit_price`.
    pub subtotal: f64,

    /// The product's own unit.
    pub stock_unit: String,

    /// Product stock when the line was last added to.
    pub stock_quantity: f64,
}

impl CartLine {
    fn from_product(product: &Product, sale_unit: &str, sale_quantity: f64, base_quantity: f64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            sku: product.sku.clone(),
            sale_unit: sale_unit.to_string(),
            sale_quantity,
            base_quantity,
            unit_price: product.selling_price,
            subtotal: base_quantity * product.selling_price,
            stock_unit: product.unit.clone(),
            stock_quantity: product.stock_quantity,
        }
    }

    /// Whether this line is the one for `(product_id, sale_unit)`.
    #[inline]
    pub fn matches(&self, product_id: &str, sale_unit: &str) -> bool {
        self.product_id == product_id && self.sale_unit == sale_unit
    }

    /// Stock left after this line, in `stock_unit`.
    pub fn remaining_stock(&self) -> f64 {
        self.stock_quantity - self.base_quantity
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The shopping cart.
///
/// ## Invariants
/// - At most one line per `(product_id, sale_unit)`
/// - Every line has `sale_quantity > 0`
/// - Every line has `base_quantity <= stock_quantity`
/// - Lines keep insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { lines: Vec::new() }
    }

    /// Adds a product in a sale unit, or merges into the existing line.
    ///
    /// ## Behavior
    /// - Line for `(product, sale_unit)` exists: quantities are summed first,
    ///   then the combined quantity is stock-checked
    /// - No line yet: the fresh quantity is stock-checked and a line appended
    /// - Any failure leaves the cart unchanged (no partial merge)
    ///
    /// ## User Workflow
    /// ```text
    /// Product: Sunflower Oil, stocked in l, 5 l on hand, 100 per l
    ///
    /// add 200 ml ──► 200 ml = 0.2 l ≤ 5 l ──► line { 200 ml, 0.2 l, 20 }
    /// add 300 ml ──► 500 ml = 0.5 l ≤ 5 l ──► line { 500 ml, 0.5 l, 50 }
    /// add 6 l    ──► 6 l > 5 l ─────────────► InsufficientStock
    /// ```
    ///
    /// ## Errors
    /// - `InvalidProduct`: snapshot price or stock is negative or not finite
    /// - `InvalidQuantity`: not positive, or not whole for a count unit
    /// - `UnknownUnit` / `IncompatibleUnit`: sale unit can't become stock unit
    /// - `InsufficientStock`: converted quantity exceeds product stock
    pub fn add_or_merge_line(
        &mut self,
        catalog: &UnitCatalog,
        product: &Product,
        sale_unit: &str,
        sale_quantity: f64,
    ) -> CartResult<()> {
        validate_product_snapshot(product)?;
        validate_sale_quantity(sale_quantity)?;
        let unit = catalog
            .get(sale_unit)
            .ok_or_else(|| CartError::UnknownUnit(sale_unit.to_string()))?;
        validate_quantity_for_unit(sale_quantity, unit)?;

        let position = self.position(&product.id, sale_unit);
        let combined = match position {
            Some(i) => self.lines[i].sale_quantity + sale_quantity,
            None => sale_quantity,
        };

        let base_quantity = to_stock_quantity(catalog, combined, sale_unit, &product.unit)?;
        ensure_in_stock(&product.sku, product.stock_quantity, base_quantity, &product.unit)?;

        let line = CartLine::from_product(product, sale_unit, combined, base_quantity);
        match position {
            Some(i) => self.lines[i] = line,
            None => self.lines.push(line),
        }

        Ok(())
    }

    /// Changes a line's quantity by `delta` (the +/- buttons).
    ///
    /// ## Behavior
    /// - Whole-number units: result rounded, never below 1
    /// - Fractional units: result never below 0.01
    /// - Decrementing never removes the line; use [`Cart::remove_line`]
    /// - Result above stock: rejected, line keeps its prior quantity
    pub fn update_quantity(
        &mut self,
        catalog: &UnitCatalog,
        product_id: &str,
        sale_unit: &str,
        delta: f64,
    ) -> CartResult<()> {
        validate_delta(delta)?;
        let index = self.require_position(product_id, sale_unit)?;
        let requested = self.lines[index].sale_quantity + delta;
        self.apply_quantity(catalog, index, requested)
    }

    /// Sets a line's quantity directly (typed into the quantity field).
    ///
    /// Same clamping and stock rules as [`Cart::update_quantity`].
    pub fn set_quantity(
        &mut self,
        catalog: &UnitCatalog,
        product_id: &str,
        sale_unit: &str,
        quantity: f64,
    ) -> CartResult<()> {
        validate_sale_quantity(quantity)?;
        let index = self.require_position(product_id, sale_unit)?;
        self.apply_quantity(catalog, index, quantity)
    }

    fn apply_quantity(&mut self, catalog: &UnitCatalog, index: usize, requested: f64) -> CartResult<()> {
        let line = &self.lines[index];
        let unit = catalog
            .get(&line.sale_unit)
            .ok_or_else(|| CartError::UnknownUnit(line.sale_unit.clone()))?;

        let sale_quantity = unit.clamp_quantity(requested);
        let base_quantity = to_stock_quantity(catalog, sale_quantity, &line.sale_unit, &line.stock_unit)?;
        ensure_in_stock(&line.sku, line.stock_quantity, base_quantity, &line.stock_unit)?;

        let line = &mut self.lines[index];
        line.sale_quantity = sale_quantity;
        line.base_quantity = base_quantity;
        line.subtotal = base_quantity * line.unit_price;
        Ok(())
    }

    /// Removes the line for `(product_id, sale_unit)`.
    ///
    /// Returns whether a line was removed; removing a missing line is a no-op.
    pub fn remove_line(&mut self, product_id: &str, sale_unit: &str) -> bool {
        let initial_len = self.lines.len();
        self.lines.retain(|l| !l.matches(product_id, sale_unit));
        self.lines.len() != initial_len
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: &str, sale_unit: &str) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(product_id, sale_unit))
    }

    /// Returns the number of lines in the cart.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Sum of line subtotals (before discount and tax).
    pub fn subtotal(&self) -> f64 {
        self.lines.iter().map(|l| l.subtotal).sum()
    }

    /// Total quantity of a product across all its sale units, in its own unit.
    pub fn reserved_base_quantity(&self, product_id: &str) -> f64 {
        self.lines
            .iter()
            .filter(|l| l.product_id == product_id)
            .map(|l| l.base_quantity)
            .sum()
    }

    fn position(&self, product_id: &str, sale_unit: &str) -> Option<usize> {
        self.lines.iter().position(|l| l.matches(product_id, sale_unit))
    }

    fn require_position(&self, product_id: &str, sale_unit: &str) -> CartResult<usize> {
        self.position(product_id, sale_unit)
            .ok_or_else(|| CartError::LineNotFound {
                product_id: product_id.to_string(),
                sale_unit: sale_unit.to_string(),
            })
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Converts a sale quantity into the product's unit, naming what went wrong.
fn to_stock_quantity(
    catalog: &UnitCatalog,
    quantity: f64,
    sale_unit: &str,
    stock_unit: &str,
) -> CartResult<f64> {
    if catalog.get(sale_unit).is_none() {
        return Err(CartError::UnknownUnit(sale_unit.to_string()));
    }
    if catalog.get(stock_unit).is_none() {
        return Err(CartError::UnknownUnit(stock_unit.to_string()));
    }

    catalog
        .convert(quantity, sale_unit, stock_unit)
        .ok_or_else(|| CartError::IncompatibleUnit {
            from: sale_unit.to_string(),
            to: stock_unit.to_string(),
        })
}

fn ensure_in_stock(sku: &str, available: f64, requested: f64, unit: &str) -> CartResult<()> {
    if requested > available {
        return Err(CartError::InsufficientStock {
            sku: sku.to_string(),
            available,
            requested,
            unit: unit.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn catalog() -> Arc<UnitCatalog> {
        UnitCatalog::standard()
    }

    fn test_product(id: &str, unit: &str, price: f64, stock: f64) -> Product {
        Product::new(id, format!("Product {}", id), format!("SKU-{}", id), unit, price, stock)
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
    }

    #[test]
    fn test_add_in_sale_unit_and_merge() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let oil = test_product("oil", "l", 100.0, 5.0);

        cart.add_or_merge_line(&catalog, &oil, "ml", 200.0).unwrap();
        let line = cart.line("oil", "ml").unwrap();
        assert_eq!(line.sale_quantity, 200.0);
        assert_close(line.base_quantity, 0.2);
        assert_close(line.subtotal, 20.0);

        cart.add_or_merge_line(&catalog, &oil, "ml", 300.0).unwrap();
        assert_eq!(cart.line_count(), 1);
        let line = cart.line("oil", "ml").unwrap();
        assert_eq!(line.sale_quantity, 500.0);
        assert_close(line.base_quantity, 0.5);
        assert_close(line.subtotal, 50.0);
    }

    #[test]
    fn test_merge_equals_single_add() {
        let catalog = catalog();
        let rice = test_product("rice", "kg", 2.5, 50.0);

        let mut split = Cart::new();
        split.add_or_merge_line(&catalog, &rice, "g", 750.0).unwrap();
        split.add_or_merge_line(&catalog, &rice, "g", 1250.0).unwrap();

        let mut once = Cart::new();
        once.add_or_merge_line(&catalog, &rice, "g", 2000.0).unwrap();

        assert_eq!(split, once);
    }

    #[test]
    fn test_distinct_sale_units_get_distinct_lines() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let oil = test_product("oil", "l", 100.0, 5.0);

        cart.add_or_merge_line(&catalog, &oil, "l", 1.0).unwrap();
        cart.add_or_merge_line(&catalog, &oil, "ml", 500.0).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_eq!(cart.lines()[0].sale_unit, "l");
        assert_eq!(cart.lines()[1].sale_unit, "ml");
        assert_close(cart.reserved_base_quantity("oil"), 1.5);
        assert_close(cart.subtotal(), 150.0);
    }

    #[test]
    fn test_add_rejects_over_stock_without_partial_merge() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let oil = test_product("oil", "l", 100.0, 5.0);

        cart.add_or_merge_line(&catalog, &oil, "l", 4.0).unwrap();
        let before = cart.clone();

        let err = cart.add_or_merge_line(&catalog, &oil, "l", 2.0).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                sku: "SKU-oil".to_string(),
                available: 5.0,
                requested: 6.0,
                unit: "l".to_string(),
            }
        );
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_rejects_invalid_quantities() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let soap = test_product("soap", "pcs", 1.5, 10.0);

        assert_eq!(
            cart.add_or_merge_line(&catalog, &soap, "pcs", 0.0),
            Err(CartError::InvalidQuantity(0.0))
        );
        assert!(cart.add_or_merge_line(&catalog, &soap, "pcs", -2.0).is_err());
        assert!(cart.add_or_merge_line(&catalog, &soap, "pcs", f64::NAN).is_err());
        assert_eq!(
            cart.add_or_merge_line(&catalog, &soap, "pcs", 1.5),
            Err(CartError::InvalidQuantity(1.5))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_rejects_broken_snapshots() {
        let catalog = catalog();
        let mut cart = Cart::new();

        let mut soap = test_product("soap", "pcs", f64::NAN, 10.0);
        assert!(matches!(
            cart.add_or_merge_line(&catalog, &soap, "pcs", 1.0),
            Err(CartError::InvalidProduct { field: "selling price", .. })
        ));

        soap.selling_price = 1.5;
        soap.stock_quantity = f64::INFINITY;
        assert!(matches!(
            cart.add_or_merge_line(&catalog, &soap, "pcs", 1.0),
            Err(CartError::InvalidProduct { field: "stock quantity", .. })
        ));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_stock_checked_per_line() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let oil = test_product("oil", "l", 100.0, 5.0);

        cart.add_or_merge_line(&catalog, &oil, "l", 4.0).unwrap();
        cart.add_or_merge_line(&catalog, &oil, "ml", 1500.0).unwrap();

        assert_eq!(cart.line_count(), 2);
        assert_close(cart.reserved_base_quantity("oil"), 5.5);
        assert!(cart.reserved_base_quantity("oil") > oil.stock_quantity);
    }

    #[test]
    fn test_add_rejects_unconvertible_units() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let oil = test_product("oil", "l", 100.0, 5.0);

        assert_eq!(
            cart.add_or_merge_line(&catalog, &oil, "kg", 1.0),
            Err(CartError::IncompatibleUnit {
                from: "kg".to_string(),
                to: "l".to_string()
            })
        );
        assert_eq!(
            cart.add_or_merge_line(&catalog, &oil, "bushel", 1.0),
            Err(CartError::UnknownUnit("bushel".to_string()))
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_whole_units_clamp_at_one() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let soap = test_product("soap", "pcs", 1.5, 10.0);

        cart.add_or_merge_line(&catalog, &soap, "pcs", 2.0).unwrap();
        cart.update_quantity(&catalog, "soap", "pcs", -5.0).unwrap();

        let line = cart.line("soap", "pcs").unwrap();
        assert_eq!(line.sale_quantity, 1.0);
        assert_eq!(line.subtotal, 1.5);

        cart.update_quantity(&catalog, "soap", "pcs", 1.6).unwrap();
        assert_eq!(cart.line("soap", "pcs").unwrap().sale_quantity, 3.0);
    }

    #[test]
    fn test_update_quantity_fractional_units_clamp_at_hundredth() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let rice = test_product("rice", "kg", 2.0, 10.0);

        cart.add_or_merge_line(&catalog, &rice, "kg", 0.5).unwrap();
        cart.update_quantity(&catalog, "rice", "kg", -1.0).unwrap();

        let line = cart.line("rice", "kg").unwrap();
        assert_eq!(line.sale_quantity, 0.01);
        assert_close(line.subtotal, 0.02);
    }

    #[test]
    fn test_update_quantity_over_stock_keeps_prior_quantity() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let eggs = test_product("eggs", "pcs", 0.2, 30.0);

        cart.add_or_merge_line(&catalog, &eggs, "dozen", 2.0).unwrap();
        assert_eq!(cart.line("eggs", "dozen").unwrap().base_quantity, 24.0);

        let err = cart.update_quantity(&catalog, "eggs", "dozen", 1.0).unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { requested, .. } if requested == 36.0));

        let line = cart.line("eggs", "dozen").unwrap();
        assert_eq!(line.sale_quantity, 2.0);
        assert_eq!(line.base_quantity, 24.0);
    }

    #[test]
    fn test_update_missing_line() {
        let catalog = catalog();
        let mut cart = Cart::new();
        assert!(matches!(
            cart.update_quantity(&catalog, "ghost", "pcs", 1.0),
            Err(CartError::LineNotFound { .. })
        ));
    }

    #[test]
    fn test_set_quantity() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let cable = test_product("cable", "m", 3.0, 20.0);

        cart.add_or_merge_line(&catalog, &cable, "cm", 150.0).unwrap();
        cart.set_quantity(&catalog, "cable", "cm", 250.0).unwrap();
        let line = cart.line("cable", "cm").unwrap();
        assert_close(line.base_quantity, 2.5);
        assert_close(line.subtotal, 7.5);

        assert!(cart.set_quantity(&catalog, "cable", "cm", 0.0).is_err());
        assert!(cart.set_quantity(&catalog, "cable", "cm", 2500.0).is_err());
        assert_eq!(cart.line("cable", "cm").unwrap().sale_quantity, 250.0);
    }

    #[test]
    fn test_stock_invariant_holds_across_operations() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let sugar = test_product("sugar", "kg", 1.2, 3.0);

        let adds = [500.0, 800.0, 1200.0, 700.0, 300.0, 50.0];
        let deltas = [250.0, -100.0, 900.0, 10.0, -3000.0, 2999.0];

        for (&add, &delta) in adds.iter().zip(deltas.iter()) {
            let _ = cart.add_or_merge_line(&catalog, &sugar, "g", add);
            let _ = cart.update_quantity(&catalog, "sugar", "g", delta);
            for line in cart.lines() {
                assert!(line.base_quantity <= sugar.stock_quantity);
                assert!(line.sale_quantity > 0.0);
            }
        }
    }

    #[test]
    fn test_remove_and_clear() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let soap = test_product("soap", "pcs", 1.5, 10.0);
        let oil = test_product("oil", "l", 100.0, 5.0);

        cart.add_or_merge_line(&catalog, &soap, "pcs", 1.0).unwrap();
        cart.add_or_merge_line(&catalog, &oil, "l", 1.0).unwrap();

        assert!(cart.remove_line("soap", "pcs"));
        assert!(!cart.remove_line("soap", "pcs"));
        assert!(!cart.remove_line("oil", "ml"));
        assert_eq!(cart.line_count(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), 0.0);
    }

    #[test]
    fn test_readd_refreshes_snapshot() {
        let catalog = catalog();
        let mut cart = Cart::new();
        let mut soap = test_product("soap", "pcs", 1.5, 2.0);

        cart.add_or_merge_line(&catalog, &soap, "pcs", 2.0).unwrap();
        soap.stock_quantity = 10.0;
        cart.add_or_merge_line(&catalog, &soap, "pcs", 3.0).unwrap();

        let line = cart.line("soap", "pcs").unwrap();
        assert_eq!(line.sale_quantity, 5.0);
        assert_eq!(line.stock_quantity, 10.0);
        assert_eq!(line.remaining_stock(), 5.0);
    }
}
