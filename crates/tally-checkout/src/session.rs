//! # Checkout Session
//!
//! One register's cart, checkout parameters and commit protocol.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Session Lifecycle                                    │
//! │                                                                         │
//! │  ┌──────────┐     ┌──────────┐     ┌──────────┐     ┌──────────┐       │
//! │  │  Empty   │────►│ In Cart  │────►│ Checkout │────►│Committed │       │
//! │  │  Cart    │     │          │     │  Dialog  │     │   Sale   │       │
//! │  └──────────┘     └──────────┘     └──────────┘     └────┬─────┘       │
//! │       ▲                │                 │                │             │
//! │       │           add_product      update_parameters      │             │
//! │       │           update_quantity  commit()               │             │
//! │       │           remove_line           │                 │             │
//! │       │                │           fails: nothing         │             │
//! │       │                ▼           changes, retry         │             │
//! │       └─────────── clear_cart ◄─────────────────────────────┘           │
//! │                                   (success clears cart + resets        │
//! │                                    parameters to defaults)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idempotency Key
//! Each session carries a key that identifies "this cart with these
//! parameters". A failed commit keeps it, so a retry after a timeout sends
//! the same key and the service can recognise the duplicate. Any successful
//! change to the cart or parameters, or a successful commit, rotates it.
//!
//! ## At Most One Commit
//! [`CheckoutSession::commit`] borrows the session mutably across its only
//! await, so a second commit (or any cart change) can't start until the
//! first resolves. UIs that need to observe the pending state use
//! [`crate::SharedSession`].

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use tally_core::checkout::finalize_checkout;
use tally_core::pricing::price_checkout;
use tally_core::{Cart, CheckoutParameters, FinalizedSale, PricingSummary, Product, UnitCatalog};

use crate::config::CheckoutDefaults;
use crate::error::{SessionError, SessionResult};
use crate::gateway::{GatewayError, SaleConfirmation, SaleGateway};
use crate::receipt::CommittedSale;

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    catalog: Arc<UnitCatalog>,
    defaults: CheckoutDefaults,
    cart: Cart,
    params: CheckoutParameters,
    idempotency_key: Uuid,
}

impl CheckoutSession {
    /// Creates a session over the standard unit catalog.
    pub fn new(defaults: CheckoutDefaults) -> Self {
        Self::with_catalog(UnitCatalog::standard(), defaults)
    }

    /// Creates a session over a store-specific unit catalog.
    pub fn with_catalog(catalog: Arc<UnitCatalog>, defaults: CheckoutDefaults) -> Self {
        let params = defaults.parameters();
        CheckoutSession {
            catalog,
            defaults,
            cart: Cart::new(),
            params,
            idempotency_key: Uuid::new_v4(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn parameters(&self) -> &CheckoutParameters {
        &self.params
    }

    pub fn defaults(&self) -> &CheckoutDefaults {
        &self.defaults
    }

    /// Key the next commit will be sent with.
    pub fn idempotency_key(&self) -> String {
        self.idempotency_key.to_string()
    }

    /// Live pricing for the checkout dialog (unrounded).
    pub fn pricing(&self) -> PricingSummary {
        price_checkout(&self.cart, &self.params)
    }

    // =========================================================================
    // Cart Operations
    // =========================================================================

    pub fn add_product(&mut self, product: &Product, sale_unit: &str, quantity: f64) -> SessionResult<()> {
        debug!(product_id = %product.id, sale_unit, quantity, "add_product");
        self.cart
            .add_or_merge_line(&self.catalog, product, sale_unit, quantity)?;
        self.rotate_key();
        self.warn_if_over_reserved(&product.id);
        Ok(())
    }

    pub fn update_quantity(&mut self, product_id: &str, sale_unit: &str, delta: f64) -> SessionResult<()> {
        debug!(product_id, sale_unit, delta, "update_quantity");
        self.cart
            .update_quantity(&self.catalog, product_id, sale_unit, delta)?;
        self.rotate_key();
        self.warn_if_over_reserved(product_id);
        Ok(())
    }

    pub fn set_quantity(&mut self, product_id: &str, sale_unit: &str, quantity: f64) -> SessionResult<()> {
        debug!(product_id, sale_unit, quantity, "set_quantity");
        self.cart
            .set_quantity(&self.catalog, product_id, sale_unit, quantity)?;
        self.rotate_key();
        self.warn_if_over_reserved(product_id);
        Ok(())
    }

    /// Returns whether a line was removed.
    pub fn remove_line(&mut self, product_id: &str, sale_unit: &str) -> bool {
        debug!(product_id, sale_unit, "remove_line");
        let removed = self.cart.remove_line(product_id, sale_unit);
        if removed {
            self.rotate_key();
        }
        removed
    }

    pub fn clear_cart(&mut self) {
        debug!("clear_cart");
        self.cart.clear();
        self.rotate_key();
    }

    // =========================================================================
    // Checkout Parameters
    // =========================================================================

    /// Edits the checkout parameters in place.
    ///
    /// ## Usage
    /// ```rust
    /// use tally_checkout::{CheckoutDefaults, CheckoutSession};
    /// use tally_core::PaymentStatus;
    ///
    /// let mut session = CheckoutSession::new(CheckoutDefaults::default());
    /// session.update_parameters(|p| {
    ///     p.payment_status = PaymentStatus::Partial;
    ///     p.received_amount = 200.0;
    /// });
    /// assert_eq!(session.parameters().received_amount, 200.0);
    /// ```
    pub fn update_parameters<F>(&mut self, f: F)
    where
        F: FnOnce(&mut CheckoutParameters),
    {
        let before = self.params.clone();
        f(&mut self.params);
        if self.params != before {
            debug!("checkout parameters updated");
            self.rotate_key();
        }
    }

    pub fn reset_parameters(&mut self) {
        self.params = self.defaults.parameters();
        self.rotate_key();
    }

    // =========================================================================
    // Commit
    // =========================================================================

    /// Prices and validates, then builds the payload. Nothing is sent and the
    /// session is unchanged.
    pub fn prepare_commit(&self) -> SessionResult<FinalizedSale> {
        let key = self.idempotency_key();
        finalize_checkout(
            &self.cart,
            &self.params,
            &self.defaults.walk_in_customer_name,
            &key,
        )
        .map_err(|e| {
            warn!(error = %e, "Checkout rejected before commit");
            SessionError::from(e)
        })
    }

    /// Applies the collaborator's answer for a payload from
    /// [`CheckoutSession::prepare_commit`].
    ///
    /// Success clears the cart, resets parameters and rotates the key.
    /// Failure leaves everything as it was.
    pub fn complete_commit(
        &mut self,
        sale: FinalizedSale,
        outcome: Result<SaleConfirmation, GatewayError>,
    ) -> SessionResult<CommittedSale> {
        match outcome {
            Ok(confirmation) => {
                info!(
                    invoice = %confirmation.invoice_number,
                    total = sale.total,
                    "Checkout committed"
                );
                self.cart.clear();
                self.params = self.defaults.parameters();
                self.rotate_key();
                Ok(CommittedSale { sale, confirmation })
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "Checkout commit failed");
                Err(SessionError::from(e))
            }
        }
    }

    /// Validates, sends the sale, and applies the outcome.
    ///
    /// Validation failures never reach the gateway.
    pub async fn commit(&mut self, gateway: &dyn SaleGateway) -> SessionResult<CommittedSale> {
        let sale = self.prepare_commit()?;
        debug!(items = sale.items.len(), total = sale.total, "Dispatching sale");
        let outcome = gateway.create_sale(&sale).await;
        self.complete_commit(sale, outcome)
    }

    /// `(reserved, available)` when a product's lines together exceed its
    /// snapshot stock. Each line passes on its own, but the sale service
    /// will refuse the combined quantity.
    pub fn over_reserved(&self, product_id: &str) -> Option<(f64, f64)> {
        let available = self
            .cart
            .lines()
            .iter()
            .find(|l| l.product_id == product_id)?
            .stock_quantity;
        let reserved = self.cart.reserved_base_quantity(product_id);
        (reserved > available).then_some((reserved, available))
    }

    fn warn_if_over_reserved(&self, product_id: &str) {
        if let Some((reserved, available)) = self.over_reserved(product_id) {
            warn!(product_id, reserved, available, "Cart lines together exceed stock");
        }
    }

    fn rotate_key(&mut self) {
        self.idempotency_key = Uuid::new_v4();
    }
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new(CheckoutDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySaleGateway;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tally_core::{CartError, CheckoutError, PaymentStatus};

    fn test_product(id: &str, unit: &str, price: f64, stock: f64) -> Product {
        Product::new(id, format!("Product {}", id), format!("SKU-{}", id), unit, price, stock)
    }

    /// Counts calls and never creates anything.
    #[derive(Default)]
    struct CountingGateway {
        calls: AtomicU64,
    }

    #[async_trait]
    impl SaleGateway for CountingGateway {
        async fn create_sale(&self, _sale: &FinalizedSale) -> Result<SaleConfirmation, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::Unavailable("counting only".into()))
        }
    }

    fn defaults_with_tax() -> CheckoutDefaults {
        CheckoutDefaults {
            default_tax_rate_percent: 5.0,
            ..CheckoutDefaults::default()
        }
    }

    #[tokio::test]
    async fn test_commit_success_clears_and_resets() {
        let oil = test_product("oil", "l", 100.0, 5.0);
        let gateway = InMemorySaleGateway::with_products([&oil]);
        let mut session = CheckoutSession::new(defaults_with_tax());

        session.add_product(&oil, "l", 2.0).unwrap();
        session.update_parameters(|p| {
            p.discount_value = 10.0;
            p.received_amount = 500.0;
            p.customer_name = Some("Ayesha".into());
        });
        let key = session.idempotency_key();

        let committed = session.commit(&gateway).await.unwrap();
        assert_eq!(committed.invoice_number(), "INV-000001");
        assert_eq!(committed.sale.total, 189.0);
        assert_eq!(committed.sale.change_amount, 311.0);
        assert_eq!(committed.sale.idempotency_key, key);

        assert!(session.cart().is_empty());
        assert_eq!(session.parameters(), &defaults_with_tax().parameters());
        assert_ne!(session.idempotency_key(), key);
        assert_eq!(gateway.stock_of("oil").await, Some(3.0));
    }

    #[tokio::test]
    async fn test_validation_failure_never_dispatches() {
        let soap = test_product("soap", "pcs", 2.0, 10.0);
        let gateway = CountingGateway::default();
        let mut session = CheckoutSession::default();

        assert_eq!(
            session.commit(&gateway).await.unwrap_err(),
            SessionError::Checkout(CheckoutError::EmptyCart)
        );

        session.add_product(&soap, "pcs", 3.0).unwrap();
        session.update_parameters(|p| {
            p.payment_status = PaymentStatus::Partial;
            p.customer_name = Some("Ayesha".into());
            p.customer_phone = Some("  ".into());
            p.received_amount = 1.0;
        });
        assert_eq!(
            session.commit(&gateway).await.unwrap_err(),
            SessionError::Checkout(CheckoutError::CustomerInfoRequired)
        );

        session.update_parameters(|p| {
            p.customer_phone = Some("017-555-0100".into());
            p.received_amount = 1100.0;
        });
        assert!(matches!(
            session.commit(&gateway).await,
            Err(SessionError::Checkout(CheckoutError::OverpaymentOnPartial { .. }))
        ));

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
        assert_eq!(session.cart().line_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_commit_preserves_state_and_key() {
        let oil = test_product("oil", "l", 100.0, 5.0);
        let gateway = InMemorySaleGateway::with_products([&oil]);
        let mut session = CheckoutSession::default();

        session.add_product(&oil, "ml", 500.0).unwrap();
        session.update_parameters(|p| p.received_amount = 50.0);
        let cart_before = session.cart().clone();
        let params_before = session.parameters().clone();
        let key = session.idempotency_key();

        gateway.set_online(false);
        let err = session.commit(&gateway).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(session.cart(), &cart_before);
        assert_eq!(session.parameters(), &params_before);
        assert_eq!(session.idempotency_key(), key);

        gateway.set_online(true);
        let committed = session.commit(&gateway).await.unwrap();
        assert_eq!(committed.sale.idempotency_key, key);
        assert_eq!(gateway.create_calls(), 2);
    }

    #[tokio::test]
    async fn test_server_stock_conflict_is_insufficient_stock() {
        let oil = test_product("oil", "l", 100.0, 5.0);
        let gateway = InMemorySaleGateway::with_products([&oil]);
        let mut session = CheckoutSession::default();

        session.add_product(&oil, "l", 4.0).unwrap();
        session.update_parameters(|p| p.received_amount = 400.0);

        // Another register sold most of it
        gateway.set_stock("oil", 1.0).await;

        let err = session.commit(&gateway).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::InsufficientStock {
                product_id: "oil".into(),
                available: 1.0,
                requested: 4.0
            }
        );
        assert!(err.is_retryable());
        assert_eq!(session.cart().line_count(), 1);
    }

    #[tokio::test]
    async fn test_over_reserved_across_sale_units() {
        let oil = test_product("oil", "l", 100.0, 5.0);
        let gateway = InMemorySaleGateway::with_products([&oil]);
        let mut session = CheckoutSession::default();

        session.add_product(&oil, "l", 4.0).unwrap();
        assert_eq!(session.over_reserved("oil"), None);

        session.add_product(&oil, "ml", 1500.0).unwrap();
        assert_eq!(session.over_reserved("oil"), Some((5.5, 5.0)));
        assert_eq!(session.over_reserved("ghost"), None);

        session.update_parameters(|p| p.received_amount = 550.0);
        assert!(matches!(
            session.commit(&gateway).await,
            Err(SessionError::InsufficientStock { .. })
        ));

        session.set_quantity("oil", "ml", 1000.0).unwrap();
        assert_eq!(session.over_reserved("oil"), None);
    }

    #[test]
    fn test_mutations_rotate_key() {
        let soap = test_product("soap", "pcs", 2.0, 10.0);
        let mut session = CheckoutSession::default();

        let k0 = session.idempotency_key();
        session.add_product(&soap, "pcs", 1.0).unwrap();
        let k1 = session.idempotency_key();
        assert_ne!(k0, k1);

        // Rejected changes keep the key
        assert!(matches!(
            session.add_product(&soap, "pcs", 50.0),
            Err(SessionError::Cart(CartError::InsufficientStock { .. }))
        ));
        assert!(!session.remove_line("ghost", "pcs"));
        session.update_parameters(|_| {});
        assert_eq!(session.idempotency_key(), k1);

        session.update_quantity("soap", "pcs", 1.0).unwrap();
        assert_ne!(session.idempotency_key(), k1);
    }

    #[test]
    fn test_live_pricing() {
        let rice = test_product("rice", "kg", 80.0, 50.0);
        let mut session = CheckoutSession::new(defaults_with_tax());

        session.add_product(&rice, "g", 12_500.0).unwrap();
        session.update_parameters(|p| p.discount_value = 10.0);

        let pricing = session.pricing();
        assert_eq!(pricing.subtotal, 1000.0);
        assert_eq!(pricing.total, 945.0);
    }
}
