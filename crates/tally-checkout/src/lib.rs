//! # tally-checkout: Checkout Session for Tally POS
//!
//! Owns the cart for one register, prices it, and runs the commit protocol
//! against the external sale-creation service.
//!
//! ## Commit Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Checkout Commit                                   │
//! │                                                                         │
//! │   CheckoutSession                         SaleGateway                   │
//! │   ───────────────                         ───────────                   │
//! │                                                                         │
//! │   price + validate (sync) ──── fail ──► CheckoutError (nothing sent)   │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   build FinalizedSale                                                   │
//! │          │                                                              │
//! │          ▼                                                              │
//! │   create_sale().await ──────────────────► atomic stock decrement       │
//! │          │                                + invoice number             │
//! │          │                                                              │
//! │          ├── Ok  ──► clear cart, reset parameters, rotate key          │
//! │          │           return CommittedSale (for the receipt)            │
//! │          │                                                              │
//! │          └── Err ──► cart & parameters untouched, key kept for retry   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`session`] - `CheckoutSession`, the single-owner cart session
//! - [`shared`] - `SharedSession`, a lockable handle that reports pending commits
//! - [`gateway`] - The `SaleGateway` collaborator trait
//! - [`memory`] - `InMemorySaleGateway`, the reference collaborator
//! - [`receipt`] - Receipt projection and the `ReceiptRenderer` trait
//! - [`config`] - Register configuration (TOML + environment)
//! - [`error`] - Session errors and their UI projection

pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod receipt;
pub mod session;
pub mod shared;

pub use config::{CheckoutDefaults, ConfigError, RegisterConfig, StoreSettings};
pub use error::{ErrorCode, ErrorReport, SessionError, SessionResult};
pub use gateway::{GatewayError, SaleConfirmation, SaleGateway};
pub use memory::InMemorySaleGateway;
pub use receipt::{CommittedSale, Receipt, ReceiptError, ReceiptLine, ReceiptRenderer};
pub use session::CheckoutSession;
pub use shared::{CommitStatus, SharedSession};
