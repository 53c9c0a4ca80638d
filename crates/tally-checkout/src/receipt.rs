//! # Receipts
//!
//! A committed sale is the finalized payload plus the service's confirmation.
//! [`CommittedSale::receipt`] projects it into display values; rendering
//! (print, PDF, HTML) is left to a [`ReceiptRenderer`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use tally_core::display::{format_quantity, round_money};
use tally_core::{FinalizedSale, PaymentMethod, PaymentStatus};

use crate::config::StoreSettings;
use crate::gateway::SaleConfirmation;

/// What a successful commit hands back to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommittedSale {
    pub sale: FinalizedSale,
    pub confirmation: SaleConfirmation,
}

impl CommittedSale {
    pub fn invoice_number(&self) -> &str {
        &self.confirmation.invoice_number
    }

    /// Display projection; money rounded to 2 places, quantities to 4.
    pub fn receipt(&self, store: &StoreSettings) -> Receipt {
        let sale = &self.sale;

        let lines = sale
            .items
            .iter()
            .map(|item| ReceiptLine {
                product_name: item.product_name.clone(),
                sku: item.sku.clone(),
                quantity: format_quantity(item.sale_quantity, &item.sale_unit),
                unit_price: round_money(item.unit_price),
                line_total: round_money(item.line_total),
            })
            .collect();

        Receipt {
            store_name: store.name.clone(),
            currency_symbol: store.currency_symbol.clone(),
            invoice_number: self.confirmation.invoice_number.clone(),
            sale_id: self.confirmation.sale_id.clone(),
            created_at: self.confirmation.created_at,
            customer_name: sale.customer_name.clone(),
            customer_phone: sale.customer_phone.clone(),
            lines,
            subtotal: round_money(sale.subtotal),
            discount_amount: round_money(sale.discount_amount),
            tax_rate_percent: sale.tax_rate_percent,
            tax_amount: round_money(sale.tax_amount),
            total: round_money(sale.total),
            payment_method: sale.payment_method,
            payment_status: sale.payment_status,
            received_amount: round_money(sale.received_amount),
            change_amount: round_money(sale.change_amount),
            due_amount: round_money(sale.due_amount),
            notes: sale.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_name: String,
    pub sku: String,
    /// Sale quantity with its unit, e.g. `"500 ml"`.
    pub quantity: String,
    /// Per stock unit.
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub store_name: String,
    pub currency_symbol: String,
    pub invoice_number: String,
    pub sale_id: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub lines: Vec<ReceiptLine>,
    pub subtotal: f64,
    pub discount_amount: f64,
    pub tax_rate_percent: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub received_amount: f64,
    pub change_amount: f64,
    pub due_amount: f64,
    pub notes: Option<String>,
}

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("Failed to write receipt: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode receipt: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Presentation collaborator for finished sales.
pub trait ReceiptRenderer {
    fn render(&mut self, receipt: &Receipt) -> Result<(), ReceiptError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::checkout::finalize_checkout;
    use tally_core::{Cart, CheckoutParameters, Product, UnitCatalog};

    fn committed() -> CommittedSale {
        let catalog = UnitCatalog::standard();
        let oil = Product::new("oil", "Sunflower Oil", "OIL-5L", "l", 100.0, 5.0);
        let mut cart = Cart::new();
        cart.add_or_merge_line(&catalog, &oil, "ml", 333.0).unwrap();

        let params = CheckoutParameters {
            tax_rate_percent: 7.0,
            received_amount: 50.0,
            ..Default::default()
        };
        let sale = finalize_checkout(&cart, &params, "Walk-in Customer", "k").unwrap();
        let confirmation = SaleConfirmation {
            sale_id: "sale-1".into(),
            invoice_number: "INV-000001".into(),
            created_at: Utc::now(),
            total: sale.total,
            received_amount: sale.received_amount,
            due_amount: sale.due_amount,
        };
        CommittedSale { sale, confirmation }
    }

    #[test]
    fn test_receipt_rounds_for_display() {
        let committed = committed();
        // 0.333 l × 100 = 33.3, +7% tax = 35.631
        assert!((committed.sale.total - 35.631).abs() < 1e-9);

        let receipt = committed.receipt(&StoreSettings::default());
        assert_eq!(receipt.invoice_number, "INV-000001");
        assert_eq!(receipt.store_name, "Tally Store");
        assert_eq!(receipt.lines[0].quantity, "333 ml");
        assert_eq!(receipt.subtotal, 33.3);
        assert_eq!(receipt.tax_amount, 2.33);
        assert_eq!(receipt.total, 35.63);
        assert_eq!(receipt.change_amount, 14.37);
    }

    struct Collecting(Vec<Receipt>);

    impl ReceiptRenderer for Collecting {
        fn render(&mut self, receipt: &Receipt) -> Result<(), ReceiptError> {
            self.0.push(receipt.clone());
            Ok(())
        }
    }

    #[test]
    fn test_renderer_receives_receipt() {
        let mut renderer = Collecting(Vec::new());
        let receipt = committed().receipt(&StoreSettings::default());
        renderer.render(&receipt).unwrap();
        assert_eq!(renderer.0.len(), 1);
        assert_eq!(renderer.0[0].customer_name, "Walk-in Customer");
    }
}
