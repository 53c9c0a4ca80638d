//! # Tickets
//!
//! A ticket is a recorded register session: the product snapshots the
//! cashier saw, the cart actions they took, and what they typed into the
//! checkout dialog.
//!
//! ```json
//! {
//!   "products": [
//!     { "id": "p-oil", "name": "Sunflower Oil", "sku": "OIL-5L",
//!       "unit": "l", "sellingPrice": 100, "stockQuantity": 5 }
//!   ],
//!   "actions": [
//!     { "type": "add", "product": "OIL-5L", "unit": "ml", "quantity": 200 },
//!     { "type": "update", "product": "p-oil", "unit": "ml", "delta": 300 }
//!   ],
//!   "checkout": { "discountValue": 10, "receivedAmount": 100 },
//!   "serverStock": { "p-oil": 5 }
//! }
//! ```
//!
//! Rejected actions are recorded as warnings and the replay continues, the
//! way a cashier would see a toast and carry on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use tally_checkout::{
    CheckoutSession, ErrorCode, ErrorReport, InMemorySaleGateway, Receipt, SaleGateway,
    SessionResult, StoreSettings,
};
use tally_core::{CheckoutParameters, DiscountType, PaymentMethod, PaymentStatus, Product};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub products: Vec<Product>,

    #[serde(default)]
    pub actions: Vec<CartAction>,

    #[serde(default)]
    pub checkout: CheckoutOverrides,

    /// Stock the sale service holds, when it differs from the snapshots.
    #[serde(default)]
    pub server_stock: HashMap<String, f64>,
}

impl Ticket {
    /// Finds a product by id, then by SKU.
    pub fn product(&self, key: &str) -> Option<&Product> {
        self.products
            .iter()
            .find(|p| p.id == key)
            .or_else(|| self.products.iter().find(|p| p.sku == key))
    }

    /// A sale service seeded from this ticket's stock.
    pub async fn gateway(&self) -> InMemorySaleGateway {
        let gateway = InMemorySaleGateway::with_products(&self.products);
        for (product_id, &quantity) in &self.server_stock {
            gateway.set_stock(product_id, quantity).await;
        }
        gateway
    }
}

/// One cashier action. `unit` defaults to the product's own unit.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartAction {
    Add {
        product: String,
        unit: Option<String>,
        quantity: f64,
    },
    Update {
        product: String,
        unit: Option<String>,
        delta: f64,
    },
    Set {
        product: String,
        unit: Option<String>,
        quantity: f64,
    },
    Remove {
        product: String,
        unit: Option<String>,
    },
    Clear,
}

/// Checkout dialog fields the cashier changed from their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOverrides {
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub discount_value: Option<f64>,
    pub discount_type: Option<DiscountType>,
    pub tax_rate_percent: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: Option<PaymentStatus>,
    pub received_amount: Option<f64>,
    pub notes: Option<String>,
}

impl CheckoutOverrides {
    pub fn apply(&self, params: &mut CheckoutParameters) {
        if self.customer_name.is_some() {
            params.customer_name = self.customer_name.clone();
        }
        if self.customer_phone.is_some() {
            params.customer_phone = self.customer_phone.clone();
        }
        if let Some(value) = self.discount_value {
            params.discount_value = value;
        }
        if let Some(discount_type) = self.discount_type {
            params.discount_type = discount_type;
        }
        if let Some(rate) = self.tax_rate_percent {
            params.tax_rate_percent = rate;
        }
        if let Some(method) = self.payment_method {
            params.payment_method = method;
        }
        if let Some(status) = self.payment_status {
            params.payment_status = status;
        }
        if let Some(received) = self.received_amount {
            params.received_amount = received;
        }
        if self.notes.is_some() {
            params.notes = self.notes.clone();
        }
    }
}

/// What replaying a ticket produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketOutcome {
    pub receipt: Option<Receipt>,
    pub warnings: Vec<ErrorReport>,
    pub error: Option<ErrorReport>,
}

/// Applies every action, then commits.
pub async fn replay(
    ticket: &Ticket,
    session: &mut CheckoutSession,
    gateway: &dyn SaleGateway,
    store: &StoreSettings,
) -> TicketOutcome {
    let mut warnings = Vec::new();

    for action in &ticket.actions {
        if let Err(report) = apply_action(ticket, session, action) {
            warn!(code = ?report.code, "{}", report.message);
            warnings.push(report);
        }
    }

    for product in &ticket.products {
        if let Some((reserved, available)) = session.over_reserved(&product.id) {
            warnings.push(ErrorReport::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Cart holds {} {} of {} across sale units; only {} in stock",
                    reserved, product.unit, product.sku, available
                ),
            ));
        }
    }

    session.update_parameters(|p| ticket.checkout.apply(p));

    match session.commit(gateway).await {
        Ok(committed) => {
            info!(invoice = committed.invoice_number(), "Ticket committed");
            TicketOutcome {
                receipt: Some(committed.receipt(store)),
                warnings,
                error: None,
            }
        }
        Err(e) => TicketOutcome {
            receipt: None,
            warnings,
            error: Some(ErrorReport::from(e)),
        },
    }
}

fn apply_action(
    ticket: &Ticket,
    session: &mut CheckoutSession,
    action: &CartAction,
) -> Result<(), ErrorReport> {
    let lookup = |key: &str| {
        ticket
            .product(key)
            .ok_or_else(|| ErrorReport::product_not_found(key))
    };
    let unit_of = |product: &Product, unit: &Option<String>| {
        unit.clone().unwrap_or_else(|| product.unit.clone())
    };

    let result: SessionResult<()> = match action {
        CartAction::Add {
            product,
            unit,
            quantity,
        } => {
            let product = lookup(product)?;
            session.add_product(product, &unit_of(product, unit), *quantity)
        }
        CartAction::Update {
            product,
            unit,
            delta,
        } => {
            let product = lookup(product)?;
            session.update_quantity(&product.id, &unit_of(product, unit), *delta)
        }
        CartAction::Set {
            product,
            unit,
            quantity,
        } => {
            let product = lookup(product)?;
            session.set_quantity(&product.id, &unit_of(product, unit), *quantity)
        }
        CartAction::Remove { product, unit } => {
            let product = lookup(product)?;
            session.remove_line(&product.id, &unit_of(product, unit));
            Ok(())
        }
        CartAction::Clear => {
            session.clear_cart();
            Ok(())
        }
    };

    result.map_err(ErrorReport::from)
}
