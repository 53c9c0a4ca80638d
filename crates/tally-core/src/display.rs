//! # Display Rounding
//!
//! Quantities and money stay unrounded inside the engine. These helpers are
//! used only where values leave it: receipts, logs and UI projections.
//!
//! ```text
//! cart arithmetic ── f64, unrounded ──► validation (unrounded)
//!                                   └─► round_money / round_quantity ──► display
//! ```

use crate::{MONEY_DISPLAY_DECIMALS, QUANTITY_DISPLAY_DECIMALS};

/// Rounds half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Rounds a monetary value to 2 decimal places.
///
/// ## Example
/// ```rust
/// use tally_core::display::round_money;
///
/// assert_eq!(round_money(44.996), 45.0);
/// assert_eq!(round_money(0.125), 0.13);
/// ```
#[inline]
pub fn round_money(value: f64) -> f64 {
    round_to(value, MONEY_DISPLAY_DECIMALS)
}

/// Rounds a quantity to 4 decimal places.
#[inline]
pub fn round_quantity(value: f64) -> f64 {
    round_to(value, QUANTITY_DISPLAY_DECIMALS)
}

/// Formats an amount with a currency symbol.
///
/// ## Example
/// ```rust
/// use tally_core::display::format_money;
///
/// assert_eq!(format_money(1234.5, "$", 2), "$1234.50");
/// assert_eq!(format_money(-12.5, "৳", 2), "-৳12.50");
/// ```
pub fn format_money(amount: f64, symbol: &str, decimals: u32) -> String {
    let rounded = round_to(amount, decimals);
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!(
        "{}{}{:.*}",
        sign,
        symbol,
        decimals as usize,
        rounded.abs()
    )
}

/// Formats a quantity with its unit, trimming trailing zeros.
///
/// ## Example
/// ```rust
/// use tally_core::display::format_quantity;
///
/// assert_eq!(format_quantity(0.2, "l"), "0.2 l");
/// assert_eq!(format_quantity(1.0 / 3.0, "kg"), "0.3333 kg");
/// assert_eq!(format_quantity(3.0, "pcs"), "3 pcs");
/// ```
pub fn format_quantity(quantity: f64, unit: &str) -> String {
    let fixed = format!(
        "{:.*}",
        QUANTITY_DISPLAY_DECIMALS as usize,
        round_quantity(quantity)
    );
    let trimmed = if fixed.contains('.') {
        fixed.trim_end_matches('0').trim_end_matches('.')
    } else {
        fixed.as_str()
    };
    format!("{} {}", trimmed, unit)
}
