//! # Shared Session
//!
//! A cloneable handle to a [`CheckoutSession`] for UIs that render while a
//! commit is in flight.
//!
//! ## Thread Safety
//! Uses `Arc<Mutex<..>>` like any other piece of managed register state. The
//! lock is only held for synchronous work and is released before the sale is
//! sent, so the UI can keep reading the session (and see `Pending`) while the
//! service answers.
//!
//! ```text
//! commit() ──► lock: Idle? → Pending, build payload ──► unlock
//!                         │
//!                         └─ Pending? → CommitInProgress
//!          ──► create_sale().await            (no lock held)
//!          ──► lock: apply outcome → Succeeded / Failed ──► unlock
//!
//! add_product() / update_parameters() / ... while Pending → CommitPending
//! ```
//!
//! ## Cancellation
//! Dropping the `commit` future (a UI timeout, a `select!` branch) moves the
//! status from `Pending` to a retryable `Failed`. The cart and parameters are
//! untouched and the idempotency key is kept, so retrying cannot record the
//! sale twice even if the service saw the first attempt.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{debug, warn};
use ts_rs::TS;

use tally_core::{CheckoutParameters, Product};

use crate::error::{ErrorReport, SessionError, SessionResult};
use crate::gateway::SaleGateway;
use crate::receipt::CommittedSale;
use crate::session::CheckoutSession;

/// Where the most recent commit stands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, TS)]
#[ts(export)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitStatus {
    #[default]
    Idle,
    Pending,
    #[serde(rename_all = "camelCase")]
    Succeeded { invoice_number: String },
    Failed { report: ErrorReport },
}

impl CommitStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, CommitStatus::Pending)
    }
}

#[derive(Debug)]
struct Slot {
    session: CheckoutSession,
    status: CommitStatus,
}

#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Slot>>,
}

impl SharedSession {
    pub fn new(session: CheckoutSession) -> Self {
        SharedSession {
            inner: Arc::new(Mutex::new(Slot {
                session,
                status: CommitStatus::Idle,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        lock_slot(&self.inner)
    }

    pub fn status(&self) -> CommitStatus {
        self.lock().status.clone()
    }

    /// Executes a function with read access to the session.
    ///
    /// ## Usage
    /// ```rust
    /// use tally_checkout::{CheckoutSession, SharedSession};
    ///
    /// let shared = SharedSession::new(CheckoutSession::default());
    /// let lines = shared.with_session(|s| s.cart().line_count());
    /// assert_eq!(lines, 0);
    /// ```
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&CheckoutSession) -> R,
    {
        f(&self.lock().session)
    }

    /// Executes a function with write access, unless a commit is pending.
    pub fn with_session_mut<F, R>(&self, f: F) -> SessionResult<R>
    where
        F: FnOnce(&mut CheckoutSession) -> SessionResult<R>,
    {
        let mut slot = self.lock();
        if slot.status.is_pending() {
            return Err(SessionError::CommitPending);
        }
        f(&mut slot.session)
    }

    pub fn add_product(&self, product: &Product, sale_unit: &str, quantity: f64) -> SessionResult<()> {
        self.with_session_mut(|s| s.add_product(product, sale_unit, quantity))
    }

    pub fn update_quantity(&self, product_id: &str, sale_unit: &str, delta: f64) -> SessionResult<()> {
        self.with_session_mut(|s| s.update_quantity(product_id, sale_unit, delta))
    }

    pub fn set_quantity(&self, product_id: &str, sale_unit: &str, quantity: f64) -> SessionResult<()> {
        self.with_session_mut(|s| s.set_quantity(product_id, sale_unit, quantity))
    }

    pub fn remove_line(&self, product_id: &str, sale_unit: &str) -> SessionResult<bool> {
        self.with_session_mut(|s| Ok(s.remove_line(product_id, sale_unit)))
    }

    pub fn clear_cart(&self) -> SessionResult<()> {
        self.with_session_mut(|s| {
            s.clear_cart();
            Ok(())
        })
    }

    pub fn update_parameters<F>(&self, f: F) -> SessionResult<()>
    where
        F: FnOnce(&mut CheckoutParameters),
    {
        self.with_session_mut(|s| {
            s.update_parameters(f);
            Ok(())
        })
    }

    /// Commits the session's cart, refusing a second concurrent commit.
    pub async fn commit(&self, gateway: &dyn SaleGateway) -> SessionResult<CommittedSale> {
        let sale = {
            let mut slot = self.lock();
            if slot.status.is_pending() {
                debug!("Commit refused: another commit is pending");
                return Err(SessionError::CommitInProgress);
            }

            match slot.session.prepare_commit() {
                Ok(sale) => {
                    slot.status = CommitStatus::Pending;
                    sale
                }
                Err(e) => {
                    slot.status = CommitStatus::Failed {
                        report: ErrorReport::from(&e),
                    };
                    return Err(e);
                }
            }
        };

        let guard = PendingGuard {
            slot: &self.inner,
            armed: true,
        };
        let outcome = gateway.create_sale(&sale).await;
        guard.disarm();

        let mut slot = self.lock();
        let result = slot.session.complete_commit(sale, outcome);
        slot.status = match &result {
            Ok(committed) => CommitStatus::Succeeded {
                invoice_number: committed.invoice_number().to_string(),
            },
            Err(e) => CommitStatus::Failed {
                report: ErrorReport::from(e),
            },
        };
        result
    }
}

fn lock_slot(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    // session operations validate before writing, so a poisoned slot is still consistent
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears `Pending` if the commit future is dropped before the service answers.
struct PendingGuard<'a> {
    slot: &'a Mutex<Slot>,
    armed: bool,
}

impl PendingGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut slot = lock_slot(self.slot);
        if slot.status.is_pending() {
            warn!("Commit cancelled before the sale service answered");
            let err = SessionError::CommitFailed {
                reason: "commit was cancelled before the sale service answered".into(),
                retryable: true,
            };
            slot.status = CommitStatus::Failed {
                report: ErrorReport::from(&err),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{GatewayError, SaleConfirmation};
    use crate::memory::InMemorySaleGateway;
    use crate::ErrorCode;
    use async_trait::async_trait;
    use tally_core::FinalizedSale;
    use tokio::sync::Notify;

    /// Holds every sale until the test opens the gate.
    struct GatedGateway {
        inner: InMemorySaleGateway,
        entered: Notify,
        gate: Notify,
    }

    #[async_trait]
    impl SaleGateway for GatedGateway {
        async fn create_sale(&self, sale: &FinalizedSale) -> Result<SaleConfirmation, GatewayError> {
            self.entered.notify_one();
            self.gate.notified().await;
            self.inner.create_sale(sale).await
        }
    }

    fn soap() -> Product {
        Product::new("soap", "Soap", "SOAP-1", "pcs", 2.0, 10.0)
    }

    #[tokio::test]
    async fn test_second_commit_refused_while_pending() {
        let gateway = Arc::new(GatedGateway {
            inner: InMemorySaleGateway::with_products([&soap()]),
            entered: Notify::new(),
            gate: Notify::new(),
        });
        let shared = SharedSession::new(CheckoutSession::default());
        shared.add_product(&soap(), "pcs", 2.0).unwrap();
        shared.update_parameters(|p| p.received_amount = 10.0).unwrap();

        let task = {
            let shared = shared.clone();
            let gateway = gateway.clone();
            tokio::spawn(async move { shared.commit(gateway.as_ref()).await })
        };

        gateway.entered.notified().await;
        assert!(shared.status().is_pending());
        assert_eq!(
            shared.commit(gateway.as_ref()).await.unwrap_err(),
            SessionError::CommitInProgress
        );
        assert_eq!(
            shared.add_product(&soap(), "pcs", 1.0).unwrap_err(),
            SessionError::CommitPending
        );
        assert_eq!(shared.with_session(|s| s.cart().line_count()), 1);

        gateway.gate.notify_one();
        let committed = task.await.unwrap().unwrap();
        assert_eq!(committed.invoice_number(), "INV-000001");
        assert_eq!(
            shared.status(),
            CommitStatus::Succeeded {
                invoice_number: "INV-000001".into()
            }
        );
        assert!(shared.with_session(|s| s.cart().is_empty()));
        assert_eq!(gateway.inner.create_calls(), 1);

        shared.add_product(&soap(), "pcs", 1.0).unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_commit_releases_session() {
        let gateway = Arc::new(GatedGateway {
            inner: InMemorySaleGateway::with_products([&soap()]),
            entered: Notify::new(),
            gate: Notify::new(),
        });
        let shared = SharedSession::new(CheckoutSession::default());
        shared.add_product(&soap(), "pcs", 2.0).unwrap();
        shared.update_parameters(|p| p.received_amount = 4.0).unwrap();
        let key = shared.with_session(|s| s.idempotency_key());

        let task = {
            let shared = shared.clone();
            let gateway = gateway.clone();
            tokio::spawn(async move { shared.commit(gateway.as_ref()).await })
        };
        gateway.entered.notified().await;
        assert!(shared.status().is_pending());

        // the gate never opens; aborting drops the commit future mid-await
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        match shared.status() {
            CommitStatus::Failed { report } => {
                assert_eq!(report.code, ErrorCode::CommitFailed);
                assert!(report.retryable);
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(shared.with_session(|s| s.cart().line_count()), 1);
        assert_eq!(shared.with_session(|s| s.idempotency_key()), key);

        let committed = shared.commit(&gateway.inner).await.unwrap();
        assert_eq!(committed.sale.idempotency_key, key);
        assert_eq!(committed.invoice_number(), "INV-000001");
        assert!(shared.with_session(|s| s.cart().is_empty()));
        shared.clear_cart().unwrap();
    }

    #[tokio::test]
    async fn test_failed_commit_reported() {
        let gateway = InMemorySaleGateway::with_products([&soap()]);
        gateway.set_online(false);

        let shared = SharedSession::new(CheckoutSession::default());
        shared.add_product(&soap(), "pcs", 1.0).unwrap();
        shared.update_parameters(|p| p.received_amount = 2.0).unwrap();

        assert!(shared.commit(&gateway).await.is_err());
        match shared.status() {
            CommitStatus::Failed { report } => {
                assert_eq!(report.code, ErrorCode::CommitFailed);
                assert!(report.retryable);
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert_eq!(shared.with_session(|s| s.cart().line_count()), 1);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(CommitStatus::Succeeded {
            invoice_number: "INV-000007".into(),
        })
        .unwrap();
        assert_eq!(json["state"], "SUCCEEDED");
        assert_eq!(json["invoiceNumber"], "INV-000007");
    }
}
