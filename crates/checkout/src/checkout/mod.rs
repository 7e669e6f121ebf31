//! Checkout orchestration.
//!
//! [`state`] holds the pure step machine; [`shipping`] the form; [`review`]
//! the pre-payment server round-trips; [`submit`] the order creation and
//! gateway handoff. [`CheckoutFlow`] wires them together for one buyer's
//! pass through `cart → shipping → payment`.

pub mod review;
pub mod shipping;
pub mod state;
pub mod submit;

pub use review::{CartValidationGateway, PaymentReview, QuoteOutcome, ShippingQuoteService};
pub use shipping::{SavedAddress, ShippingForm, ShippingFormErrors, ShippingInfo, ShippingMethod};
pub use state::{CheckoutError, CheckoutSession, CheckoutStep};
pub use submit::{OrderSubmissionCoordinator, PaymentHandoff, SubmitError};

use bazaar_core::Money;
use tracing::instrument;

use crate::api::StoreApiError;
use crate::cart::{CartState, CartStore};
use crate::error::Error;

/// One buyer's pass through checkout.
///
/// Owns the step machine and drives the validation, quoting, and
/// submission services at the right transitions. Abandoning the flow
/// mid-request is safe: responses to a dropped flow are simply never
/// applied anywhere.
pub struct CheckoutFlow {
    cart: CartStore,
    validation: CartValidationGateway,
    quotes: ShippingQuoteService,
    coordinator: OrderSubmissionCoordinator,
    session: CheckoutSession,
}

impl CheckoutFlow {
    pub(crate) fn new(
        cart: CartStore,
        validation: CartValidationGateway,
        quotes: ShippingQuoteService,
        coordinator: OrderSubmissionCoordinator,
    ) -> Self {
        Self {
            cart,
            validation,
            quotes,
            coordinator,
            session: CheckoutSession::new(),
        }
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.session.step()
    }

    /// The cart store the flow reads from.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The step machine, for rendering step-local data.
    #[must_use]
    pub const fn session(&self) -> &CheckoutSession {
        &self.session
    }

    /// `cart → shipping`: reload the cart from the server, then advance if
    /// it is non-empty. The reload guarantees the guard runs against live
    /// contents, not a stale view.
    ///
    /// # Errors
    ///
    /// Cart load failures and the empty-cart guard.
    #[instrument(skip(self))]
    pub async fn proceed_to_shipping(&mut self) -> Result<CartState, Error> {
        let state = self.cart.load().await?;
        self.session.proceed_to_shipping(&state)?;
        Ok(state)
    }

    /// `shipping → payment`: validate the form, store the shipping info,
    /// then run the pre-payment round-trips ([`Self::refresh_review`]).
    ///
    /// # Errors
    ///
    /// Form validation errors leave the flow at the shipping step. A
    /// failure of the review round-trips leaves the flow at the payment
    /// step with no review - payment stays blocked until
    /// [`Self::refresh_review`] succeeds.
    #[instrument(skip_all)]
    pub async fn submit_shipping(&mut self, form: &ShippingForm) -> Result<&PaymentReview, Error> {
        self.session.submit_shipping(form)?;
        self.refresh_review().await
    }

    /// Re-run cart validation and shipping quoting for the payment step.
    ///
    /// Called automatically on entering payment and explicitly as the
    /// user-triggered retry after a failure. The quote always uses the
    /// subtotal the validation round-trip returned.
    ///
    /// # Errors
    ///
    /// Transport and API failures; a 401 tears the session down first.
    #[instrument(skip(self))]
    pub async fn refresh_review(&mut self) -> Result<&PaymentReview, Error> {
        // Shipping info is necessarily present at the payment step.
        let shipping = match self.session.shipping() {
            Some(info) if self.session.step() == CheckoutStep::Payment => info.clone(),
            _ => {
                return Err(CheckoutError::WrongStep {
                    expected: CheckoutStep::Payment,
                    actual: self.session.step(),
                }
                .into());
            }
        };

        let validation = self
            .validation
            .validate()
            .await
            .map_err(|e| self.fail_store(e))?;

        let quote = self
            .quotes
            .quote_for(&shipping, validation.price_summary.subtotal)
            .await
            .map_err(|e| self.fail_store(e))?;

        self.session
            .store_review(PaymentReview { validation, quote })?;
        self.session
            .review()
            .ok_or_else(|| {
                CheckoutError::NotPayable { message: None }.into()
            })
    }

    /// Step backward (payment → shipping → cart). Always allowed.
    pub fn back(&mut self) {
        self.session.back();
    }

    /// Confirm payment: run the submission sequence once and return the
    /// gateway handoff.
    ///
    /// # Errors
    ///
    /// Blocked unless the flow is at the payment step with a valid review;
    /// otherwise see [`SubmitError`].
    #[instrument(skip(self))]
    pub async fn confirm(&mut self) -> Result<PaymentHandoff, Error> {
        let (review, shipping) = self.session.payable()?;
        let estimate: Money = review.display_total();
        let shipping = shipping.clone();

        let handoff = self.coordinator.submit(&shipping, Some(estimate)).await?;
        Ok(handoff)
    }

    /// Translate a store API failure, tearing the session down on a 401
    /// before it propagates.
    fn fail_store(&self, error: StoreApiError) -> Error {
        if matches!(error, StoreApiError::Unauthorized) {
            self.cart.teardown();
        }
        Error::Store(error)
    }
}

impl std::fmt::Debug for CheckoutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutFlow")
            .field("step", &self.session.step())
            .finish_non_exhaustive()
    }
}
