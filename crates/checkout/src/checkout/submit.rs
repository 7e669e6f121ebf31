//! Order creation and payment handoff.
//!
//! [`OrderSubmissionCoordinator`] runs the one sequence in this engine
//! where ordering is unforgiving:
//!
//! 1. create the order server-side (the server reprices it),
//! 2. exchange the order for a one-time payment token,
//! 3. clear the local cart,
//! 4. hand the browser to the gateway via an auto-submitting form POST.
//!
//! The cart is cleared only after both server calls succeed and always
//! before the redirect, so a failure can never leave an emptied cart next
//! to an unpaid order. The coordinator latches after order creation:
//! confirming again produces an explicit "already created" error instead
//! of a duplicate order.

use std::sync::{Mutex, PoisonError};

use askama::Template;
use thiserror::Error;
use tracing::{info, instrument, warn};

use bazaar_core::{Money, OrderId};

use crate::api::types::Order;
use crate::api::{StoreApiClient, StoreApiError};
use crate::cart::CartStore;
use crate::checkout::shipping::ShippingInfo;
use crate::services::gateway::{GatewayError, PaymentGatewayClient, PaymentSession};

// =============================================================================
// Errors
// =============================================================================

/// Failures of the submission sequence.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// A submission is already running; the confirm control should have
    /// been disabled.
    #[error("an order submission is already in flight")]
    InFlight,

    /// An order was already created by this checkout session. Retrying
    /// would duplicate it; the user must be told, not silently retried.
    #[error("order {0} was already created for this checkout")]
    AlreadyCreated(OrderId),

    /// Order creation failed; the cart is intact and retry is safe.
    #[error("order creation failed: {0}")]
    CreateOrder(#[source] StoreApiError),

    /// The session token was rejected; session has been torn down.
    #[error("session is no longer valid; signed out")]
    Unauthorized,

    /// The order exists server-side but no payment token was obtained.
    /// Fatal to this attempt: the cart is intact and the error names the
    /// order so the failure is never invisible.
    #[error("payment token request failed for order {order_id}: {source}")]
    TokenRequest {
        /// The order that exists without a payment attempt.
        order_id: OrderId,
        /// Gateway failure.
        #[source]
        source: GatewayError,
    },
}

// =============================================================================
// Handoff
// =============================================================================

/// Same-origin auto-submitting form that carries the token to the gateway.
/// The gateway expects a browser navigation, not a JSON call.
#[derive(Template)]
#[template(
    source = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Redirecting to payment&hellip;</title>
</head>
<body onload="document.getElementById('gateway-handoff').submit()">
<p>Redirecting you to the payment page&hellip;</p>
<form id="gateway-handoff" method="post" action="{{ payment_url }}">
<input type="hidden" name="token" value="{{ token }}">
<noscript><button type="submit">Continue to payment</button></noscript>
</form>
</body>
</html>
"#,
    ext = "html"
)]
struct HandoffPage<'a> {
    payment_url: &'a str,
    token: &'a str,
}

/// The successful result of a submission: a created order, its payment
/// session, and the document that completes the redirect.
#[derive(Debug, Clone)]
pub struct PaymentHandoff {
    /// The created order with the server's financial summary.
    pub order: Order,
    /// One-time token and gateway URL.
    pub session: PaymentSession,
}

impl PaymentHandoff {
    /// Render the auto-submitting redirect document.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn redirect_html(&self) -> Result<String, askama::Error> {
        HandoffPage {
            payment_url: self.session.payment_url.as_str(),
            token: &self.session.token,
        }
        .render()
    }
}

// =============================================================================
// Coordinator
// =============================================================================

#[derive(Debug, Clone)]
enum SubmitPhase {
    Idle,
    InFlight,
    OrderCreated(OrderId),
}

/// Runs the create-order → token → clear-cart → redirect sequence exactly
/// once per checkout.
#[derive(Debug)]
pub struct OrderSubmissionCoordinator {
    api: StoreApiClient,
    gateway: PaymentGatewayClient,
    cart: CartStore,
    phase: Mutex<SubmitPhase>,
}

impl OrderSubmissionCoordinator {
    /// Create a coordinator for one checkout session.
    #[must_use]
    pub fn new(api: StoreApiClient, gateway: PaymentGatewayClient, cart: CartStore) -> Self {
        Self {
            api,
            gateway,
            cart,
            phase: Mutex::new(SubmitPhase::Idle),
        }
    }

    /// Run the submission sequence.
    ///
    /// `local_estimate` is the total the payment screen displayed; it is
    /// advisory only and a mismatch with the server's figure is logged,
    /// never enforced.
    ///
    /// # Errors
    ///
    /// See [`SubmitError`]. After [`SubmitError::CreateOrder`] the
    /// coordinator is reset and retry is safe; after
    /// [`SubmitError::TokenRequest`] it stays latched on the created order.
    #[instrument(skip(self, shipping, local_estimate))]
    pub async fn submit(
        &self,
        shipping: &ShippingInfo,
        local_estimate: Option<Money>,
    ) -> Result<PaymentHandoff, SubmitError> {
        self.latch_in_flight()?;

        let idempotency_key = uuid::Uuid::new_v4().to_string();
        let order = match self.api.create_order(shipping, &idempotency_key).await {
            Ok(order) => order,
            Err(e) => {
                // Nothing was created: unlatch so the user can retry.
                self.set_phase(SubmitPhase::Idle);
                return Err(match e {
                    StoreApiError::Unauthorized => {
                        self.cart.teardown();
                        SubmitError::Unauthorized
                    }
                    other => SubmitError::CreateOrder(other),
                });
            }
        };

        // From here on the order exists; never run step 1 again.
        self.set_phase(SubmitPhase::OrderCreated(order.id.clone()));
        info!(order_id = %order.id, total = %order.financial_summary.total, "order created");

        if let Some(estimate) = local_estimate
            && estimate != order.financial_summary.total
        {
            warn!(
                local = %estimate,
                server = %order.financial_summary.total,
                "displayed total drifts from server-confirmed total; server figure is charged"
            );
        }

        let session = self
            .gateway
            .request_token(&order.id, order.financial_summary.total, &shipping.phone)
            .await
            .map_err(|source| SubmitError::TokenRequest {
                order_id: order.id.clone(),
                source,
            })?;

        // Both server calls succeeded: the order owns the items now, so
        // the local cart must go before the browser leaves the page.
        self.cart.clear();

        Ok(PaymentHandoff { order, session })
    }

    /// The order created by this coordinator, if the sequence got that far.
    #[must_use]
    pub fn created_order(&self) -> Option<OrderId> {
        match &*self.lock_phase() {
            SubmitPhase::OrderCreated(id) => Some(id.clone()),
            _ => None,
        }
    }

    fn latch_in_flight(&self) -> Result<(), SubmitError> {
        let mut phase = self.lock_phase();
        match &*phase {
            SubmitPhase::Idle => {
                *phase = SubmitPhase::InFlight;
                Ok(())
            }
            SubmitPhase::InFlight => Err(SubmitError::InFlight),
            SubmitPhase::OrderCreated(id) => Err(SubmitError::AlreadyCreated(id.clone())),
        }
    }

    fn set_phase(&self, phase: SubmitPhase) {
        *self.lock_phase() = phase;
    }

    fn lock_phase(&self) -> std::sync::MutexGuard<'_, SubmitPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
