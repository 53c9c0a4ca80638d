//! # In-Memory Sale Gateway
//!
//! Reference collaborator holding stock and sales in memory. Backs the
//! register binary and the tests.
//!
//! ## create_sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  online? ──── no ───► Unavailable                                      │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  lock ledger                                                            │
//! │     │                                                                   │
//! │  idempotency key seen? ── yes ──► original confirmation (no decrement) │
//! │     │                                                                   │
//! │  Σ quantity per product (all sale units together)                      │
//! │     │                                                                   │
//! │  any product over stock? ── yes ──► StockConflict (nothing changed)    │
//! │     │                                                                   │
//! │  decrement all, record sale, assign INV-000001, INV-000002, ...        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check and the decrement happen under one lock, so two registers can't
//! both sell the last unit.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::{FinalizedSale, Product};

use crate::gateway::{GatewayError, SaleConfirmation, SaleGateway};

/// A created sale as the service stores it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedSale {
    pub sale: FinalizedSale,
    pub confirmation: SaleConfirmation,
}

#[derive(Debug, Default)]
struct Ledger {
    stock: HashMap<String, f64>,
    sales: Vec<RecordedSale>,
    by_idempotency_key: HashMap<String, usize>,
}

pub struct InMemorySaleGateway {
    ledger: Mutex<Ledger>,
    online: AtomicBool,
    create_calls: AtomicU64,
}

impl Default for InMemorySaleGateway {
    fn default() -> Self {
        Self {
            ledger: Mutex::new(Ledger::default()),
            online: AtomicBool::new(true),
            create_calls: AtomicU64::new(0),
        }
    }
}

impl InMemorySaleGateway {
    /// Seeds the stock ledger from product snapshots.
    pub fn with_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let stock = products
            .into_iter()
            .map(|p| (p.id.clone(), p.stock_quantity))
            .collect();

        Self {
            ledger: Mutex::new(Ledger {
                stock,
                ..Ledger::default()
            }),
            ..Self::default()
        }
    }

    /// Overwrites a product's stock, as another register selling would.
    pub async fn set_stock(&self, product_id: &str, quantity: f64) {
        self.ledger
            .lock()
            .await
            .stock
            .insert(product_id.to_string(), quantity);
    }

    pub async fn stock_of(&self, product_id: &str) -> Option<f64> {
        self.ledger.lock().await.stock.get(product_id).copied()
    }

    /// Every sale created so far, oldest first.
    pub async fn sales(&self) -> Vec<RecordedSale> {
        self.ledger.lock().await.sales.clone()
    }

    /// Simulates the service going away (or coming back).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of `create_sale` calls received, including failed ones.
    pub fn create_calls(&self) -> u64 {
        self.create_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SaleGateway for InMemorySaleGateway {
    async fn create_sale(&self, sale: &FinalizedSale) -> Result<SaleConfirmation, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::Relaxed);

        if !self.online.load(Ordering::SeqCst) {
            warn!("Sale service offline");
            return Err(GatewayError::Unavailable("sale service offline".to_string()));
        }

        let mut ledger = self.ledger.lock().await;

        if let Some(&index) = ledger.by_idempotency_key.get(&sale.idempotency_key) {
            let existing = &ledger.sales[index].confirmation;
            info!(invoice = %existing.invoice_number, "Replaying sale for repeated idempotency key");
            return Ok(existing.clone());
        }

        if sale.items.is_empty() {
            return Err(GatewayError::Rejected("sale has no items".to_string()));
        }

        let mut requested: BTreeMap<&str, f64> = BTreeMap::new();
        for item in &sale.items {
            *requested.entry(item.product_id.as_str()).or_insert(0.0) += item.quantity;
        }

        for (&product_id, &quantity) in &requested {
            let available = ledger
                .stock
                .get(product_id)
                .copied()
                .ok_or_else(|| GatewayError::Rejected(format!("unknown product {}", product_id)))?;

            if quantity > available {
                debug!(product_id, available, requested = quantity, "Stock conflict");
                return Err(GatewayError::StockConflict {
                    product_id: product_id.to_string(),
                    available,
                    requested: quantity,
                });
            }
        }

        for (product_id, quantity) in requested {
            if let Some(stock) = ledger.stock.get_mut(product_id) {
                *stock -= quantity;
            }
        }

        let index = ledger.sales.len();
        let confirmation = SaleConfirmation {
            sale_id: Uuid::new_v4().to_string(),
            invoice_number: format!("INV-{:06}", index + 1),
            created_at: Utc::now(),
            total: sale.total,
            received_amount: sale.received_amount,
            due_amount: sale.due_amount,
        };

        if !sale.idempotency_key.is_empty() {
            ledger
                .by_idempotency_key
                .insert(sale.idempotency_key.clone(), index);
        }
        ledger.sales.push(RecordedSale {
            sale: sale.clone(),
            confirmation: confirmation.clone(),
        });

        info!(
            invoice = %confirmation.invoice_number,
            total = sale.total,
            items = sale.items.len(),
            "Sale created"
        );
        Ok(confirmation)
    }
}
