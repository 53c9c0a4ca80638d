//! # Sale Gateway
//!
//! The boundary with the service that owns durable storage. It accepts a
//! finalized sale and either creates it (decrementing stock in the same
//! transaction) or refuses it.
//!
//! ```text
//! CheckoutSession ── create_sale(&FinalizedSale) ──► SaleGateway
//!                 ◄── SaleConfirmation ─────────────  (invoice number, timestamp)
//!                 ◄── GatewayError ─────────────────  (stock conflict / rejected / unavailable)
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

use tally_core::FinalizedSale;

/// What the collaborator returns for a created sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleConfirmation {
    pub sale_id: String,
    /// Server-assigned, human-facing invoice number.
    pub invoice_number: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    pub total: f64,
    pub received_amount: f64,
    pub due_amount: f64,
}

/// Why the collaborator did not create the sale.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The authoritative stock check failed. Normal outcome when the
    /// snapshot the cart was built from is stale.
    #[error("Stock conflict for product {product_id}: available {available}, requested {requested}")]
    StockConflict {
        product_id: String,
        available: f64,
        requested: f64,
    },

    /// The service understood the request and refused it.
    #[error("Sale rejected: {0}")]
    Rejected(String),

    /// Transport or server failure; the sale may be retried.
    #[error("Sale service unavailable: {0}")]
    Unavailable(String),
}

impl GatewayError {
    /// Whether retrying the same payload can succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, GatewayError::Rejected(_))
    }
}

/// The sale-creation collaborator.
///
/// Implementations must be atomic: stock decrement and sale record are
/// created together or not at all.
#[async_trait]
pub trait SaleGateway: Send + Sync {
    async fn create_sale(&self, sale: &FinalizedSale) -> Result<SaleConfirmation, GatewayError>;
}
