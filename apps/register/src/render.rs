//! # Output
//!
//! What the headless register prints for a replayed ticket:
//!
//! - [`write_outcome_json`]: the whole [`TicketOutcome`] (receipt, warnings,
//!   error) as pretty JSON, for piping into other tools.
//! - [`TextReceiptRenderer`]: a till-roll style plain text receipt, used by
//!   [`write_outcome_text`] together with warning and error lines.
//!
//! ```text
//! Tally Store
//! Invoice INV-000001
//! ----------------------------------------
//! Sunflower Oil (OIL-5L)
//!   500 ml                          $50.00
//! ----------------------------------------
//! Subtotal                          $50.00
//! Total                             $50.00
//! Received (cash)                  $100.00
//! Change                            $50.00
//! ```

use std::io::Write;

use tally_checkout::{Receipt, ReceiptError, ReceiptRenderer};
use tally_core::display::format_money;

use crate::ticket::TicketOutcome;

const RECEIPT_WIDTH: usize = 40;

pub fn write_outcome_json<W: Write>(mut out: W, outcome: &TicketOutcome) -> Result<(), ReceiptError> {
    serde_json::to_writer_pretty(&mut out, outcome)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_outcome_text<W: Write>(
    mut out: W,
    outcome: &TicketOutcome,
    currency_decimals: u32,
) -> Result<(), ReceiptError> {
    if let Some(receipt) = &outcome.receipt {
        TextReceiptRenderer::new(&mut out, currency_decimals).render(receipt)?;
    }
    for warning in &outcome.warnings {
        writeln!(out, "Warning: {}", warning.message)?;
    }
    if let Some(error) = &outcome.error {
        writeln!(out, "Sale refused: {}", error.message)?;
    }
    Ok(())
}

/// Plain text receipt in the receipt's own currency.
pub struct TextReceiptRenderer<W: Write> {
    out: W,
    currency_decimals: u32,
}

impl<W: Write> TextReceiptRenderer<W> {
    pub fn new(out: W, currency_decimals: u32) -> Self {
        TextReceiptRenderer {
            out,
            currency_decimals,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Label on the left, amount right-aligned to the receipt width.
    fn row(&mut self, symbol: &str, label: &str, amount: f64) -> std::io::Result<()> {
        let value = format_money(amount, symbol, self.currency_decimals);
        let pad = RECEIPT_WIDTH.saturating_sub(label.chars().count());
        writeln!(self.out, "{}{:>pad$}", label, value, pad = pad)
    }

    fn rule(&mut self) -> std::io::Result<()> {
        writeln!(self.out, "{}", "-".repeat(RECEIPT_WIDTH))
    }
}

impl<W: Write> ReceiptRenderer for TextReceiptRenderer<W> {
    fn render(&mut self, receipt: &Receipt) -> Result<(), ReceiptError> {
        let symbol = receipt.currency_symbol.as_str();

        writeln!(self.out, "{}", receipt.store_name)?;
        writeln!(self.out, "Invoice {}", receipt.invoice_number)?;
        writeln!(self.out, "{}", receipt.created_at.format("%Y-%m-%d %H:%M"))?;
        writeln!(self.out, "Customer: {}", receipt.customer_name)?;
        if let Some(phone) = &receipt.customer_phone {
            writeln!(self.out, "Phone: {}", phone)?;
        }
        self.rule()?;

        for line in &receipt.lines {
            writeln!(self.out, "{} ({})", line.product_name, line.sku)?;
            self.row(symbol, &format!("  {}", line.quantity), line.line_total)?;
        }
        self.rule()?;

        self.row(symbol, "Subtotal", receipt.subtotal)?;
        if receipt.discount_amount > 0.0 {
            self.row(symbol, "Discount", -receipt.discount_amount)?;
        }
        if receipt.tax_amount > 0.0 {
            self.row(
                symbol,
                &format!("Tax ({}%)", receipt.tax_rate_percent),
                receipt.tax_amount,
            )?;
        }
        self.row(symbol, "Total", receipt.total)?;
        self.row(
            symbol,
            &format!("Received ({})", receipt.payment_method),
            receipt.received_amount,
        )?;

        if receipt.due_amount > 0.0 {
            self.row(symbol, "Due", receipt.due_amount)?;
        } else {
            self.row(symbol, "Change", receipt.change_amount)?;
        }

        if let Some(notes) = &receipt.notes {
            writeln!(self.out, "Note: {}", notes)?;
        }
        Ok(())
    }
}
