//! The checkout step state machine.
//!
//! `cart → shipping → payment`, strictly linear. The machine is synchronous
//! and owns only step-local data (the validated shipping info and the
//! payment review); all I/O around it is driven by
//! [`super::CheckoutFlow`]. Keeping it pure makes the reachable-sequence
//! properties directly testable: there is no method that moves from `Cart`
//! to `Payment`, so skipping a step is unrepresentable rather than checked.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cart::CartState;
use crate::checkout::review::PaymentReview;
use crate::checkout::shipping::{ShippingForm, ShippingFormErrors, ShippingInfo};

/// One of the three sequential checkout screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    /// Reviewing cart contents.
    Cart,
    /// Entering shipping details.
    Shipping,
    /// Final review and payment confirmation.
    Payment,
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Cart => "cart",
            Self::Shipping => "shipping",
            Self::Payment => "payment",
        };
        write!(f, "{name}")
    }
}

/// Guard failures for checkout transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// `cart → shipping` requires a non-empty cart.
    #[error("cannot start checkout with an empty cart")]
    EmptyCart,

    /// The operation does not apply to the current step.
    #[error("operation requires the {expected} step, but checkout is at {actual}")]
    WrongStep {
        /// Step the operation is valid at.
        expected: CheckoutStep,
        /// Step the session is actually at.
        actual: CheckoutStep,
    },

    /// The shipping form failed validation; progression is blocked.
    #[error(transparent)]
    InvalidShipping(#[from] ShippingFormErrors),

    /// The server declared the cart not purchasable, or no authoritative
    /// review exists yet; payment stays disabled.
    #[error("cart is not valid for payment{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    NotPayable {
        /// Server-provided reason, when it gave one.
        message: Option<String>,
    },
}

/// Ephemeral per-tab checkout state.
///
/// Nothing here is persisted server-side before order creation; abandoning
/// the session loses only form progress.
#[derive(Debug)]
pub struct CheckoutSession {
    step: CheckoutStep,
    shipping: Option<ShippingInfo>,
    review: Option<PaymentReview>,
}

impl Default for CheckoutSession {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckoutSession {
    /// Start a session at the cart step.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            step: CheckoutStep::Cart,
            shipping: None,
            review: None,
        }
    }

    /// Current step.
    #[must_use]
    pub const fn step(&self) -> CheckoutStep {
        self.step
    }

    /// Validated shipping info, once the shipping step has been passed.
    /// Survives backward navigation until resubmitted.
    #[must_use]
    pub fn shipping(&self) -> Option<&ShippingInfo> {
        self.shipping.as_ref()
    }

    /// The stored payment review, if one has been computed for the current
    /// entry into the payment step.
    #[must_use]
    pub fn review(&self) -> Option<&PaymentReview> {
        self.review.as_ref()
    }

    /// `cart → shipping`. Guard: the (freshly loaded) cart is non-empty.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] off the cart step,
    /// [`CheckoutError::EmptyCart`] when there is nothing to buy.
    pub fn proceed_to_shipping(&mut self, cart: &CartState) -> Result<(), CheckoutError> {
        self.require_step(CheckoutStep::Cart)?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.step = CheckoutStep::Shipping;
        Ok(())
    }

    /// `shipping → payment`. Guard: the form validates.
    ///
    /// Stores the validated info for the rest of the session and drops any
    /// previously computed review - every entry into payment starts without
    /// one, forcing validation and quoting to re-run.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] off the shipping step,
    /// [`CheckoutError::InvalidShipping`] with all field errors otherwise.
    pub fn submit_shipping(&mut self, form: &ShippingForm) -> Result<&ShippingInfo, CheckoutError> {
        self.require_step(CheckoutStep::Shipping)?;
        let info = form.validate()?;
        self.review = None;
        self.step = CheckoutStep::Payment;
        Ok(self.shipping.insert(info))
    }

    /// Step backward. Always permitted; a no-op at the cart step. Shipping
    /// info and the review are kept until recomputed.
    pub fn back(&mut self) {
        self.step = match self.step {
            CheckoutStep::Payment => CheckoutStep::Shipping,
            CheckoutStep::Shipping | CheckoutStep::Cart => CheckoutStep::Cart,
        };
    }

    /// Install the freshly computed review for the payment step.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] unless checkout is at payment.
    pub fn store_review(&mut self, review: PaymentReview) -> Result<(), CheckoutError> {
        self.require_step(CheckoutStep::Payment)?;
        self.review = Some(review);
        Ok(())
    }

    /// The review and shipping info needed to confirm payment.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::WrongStep`] off the payment step;
    /// [`CheckoutError::NotPayable`] when no review exists (validation
    /// still in flight or failed) or the server said the cart is invalid.
    pub fn payable(&self) -> Result<(&PaymentReview, &ShippingInfo), CheckoutError> {
        self.require_step(CheckoutStep::Payment)?;

        let review = self
            .review
            .as_ref()
            .ok_or(CheckoutError::NotPayable { message: None })?;
        if !review.payment_enabled() {
            return Err(CheckoutError::NotPayable {
                message: review.validation.message.clone(),
            });
        }

        let shipping = self.shipping.as_ref().ok_or(CheckoutError::WrongStep {
            expected: CheckoutStep::Shipping,
            actual: CheckoutStep::Payment,
        })?;
        Ok((review, shipping))
    }

    fn require_step(&self, expected: CheckoutStep) -> Result<(), CheckoutError> {
        let actual = self.step();
        if actual == expected {
            Ok(())
        } else {
            Err(CheckoutError::WrongStep { expected, actual })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::api::types::{CartValidation, PriceSummary};
    use crate::checkout::review::QuoteOutcome;
    use crate::checkout::shipping::ShippingMethod;
    use bazaar_core::Money;

    fn loaded_cart() -> CartState {
        CartState {
            items: vec![sample_item()],
            total: Money::from_units(100_000),
            count: 1,
            is_loading: false,
            refreshed_at: None,
        }
    }

    fn empty_cart() -> CartState {
        CartState {
            items: Vec::new(),
            total: Money::zero(),
            count: 0,
            is_loading: false,
            refreshed_at: None,
        }
    }

    fn sample_item() -> bazaar_core::CartItem {
        bazaar_core::CartItem {
            id: bazaar_core::CartItemId::new("ci_1"),
            product_id: bazaar_core::ProductId::new("p_1"),
            variant_id: None,
            quantity: 1,
            product: bazaar_core::ProductSnapshot {
                name: "Test".to_owned(),
                image: None,
                stock: 5,
                price: Some(Money::from_units(100_000)),
                discount: None,
            },
            variant: None,
        }
    }

    fn valid_form() -> ShippingForm {
        ShippingForm {
            first_name: "Sara".to_owned(),
            last_name: "Ahmadi".to_owned(),
            phone: "09123456789".to_owned(),
            province: "Tehran".to_owned(),
            city: "Tehran".to_owned(),
            address: "Valiasr St 12".to_owned(),
            postal_code: "1234567890".to_owned(),
            method: ShippingMethod::Standard,
        }
    }

    fn review(is_valid: bool, message: Option<&str>) -> PaymentReview {
        PaymentReview {
            validation: CartValidation {
                is_valid,
                message: message.map(str::to_owned),
                price_summary: PriceSummary {
                    subtotal: Money::from_units(100_000),
                    total: Money::from_units(100_000),
                },
                items_count: 1,
                products_count: 1,
            },
            quote: QuoteOutcome::Server(crate::api::types::ShippingQuote {
                cost: Money::from_units(45_000),
                is_free: false,
                estimated_delivery: None,
            }),
        }
    }

    #[test]
    fn test_happy_path_is_linear() {
        let mut session = CheckoutSession::new();
        assert_eq!(session.step(), CheckoutStep::Cart);

        session.proceed_to_shipping(&loaded_cart()).unwrap();
        assert_eq!(session.step(), CheckoutStep::Shipping);

        session.submit_shipping(&valid_form()).unwrap();
        assert_eq!(session.step(), CheckoutStep::Payment);
        assert!(session.shipping().is_some());
        assert!(session.review().is_none());
    }

    #[test]
    fn test_cannot_skip_to_payment() {
        let mut session = CheckoutSession::new();

        // The only forward move from `cart` is `proceed_to_shipping`;
        // payment-step operations all refuse.
        assert!(matches!(
            session.submit_shipping(&valid_form()),
            Err(CheckoutError::WrongStep { .. })
        ));
        assert!(matches!(
            session.store_review(review(true, None)),
            Err(CheckoutError::WrongStep { .. })
        ));
        assert!(matches!(
            session.payable(),
            Err(CheckoutError::WrongStep { .. })
        ));
        assert_eq!(session.step(), CheckoutStep::Cart);
    }

    #[test]
    fn test_empty_cart_blocks_checkout() {
        let mut session = CheckoutSession::new();
        assert_eq!(
            session.proceed_to_shipping(&empty_cart()),
            Err(CheckoutError::EmptyCart)
        );
        assert_eq!(session.step(), CheckoutStep::Cart);
    }

    #[test]
    fn test_invalid_form_blocks_payment_step() {
        let mut session = CheckoutSession::new();
        session.proceed_to_shipping(&loaded_cart()).unwrap();

        let err = session.submit_shipping(&ShippingForm::default()).unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidShipping(_)));
        assert_eq!(session.step(), CheckoutStep::Shipping);
        assert!(session.shipping().is_none());
    }

    #[test]
    fn test_back_keeps_later_step_data() {
        let mut session = CheckoutSession::new();
        session.proceed_to_shipping(&loaded_cart()).unwrap();
        session.submit_shipping(&valid_form()).unwrap();
        session.store_review(review(true, None)).unwrap();

        session.back();
        assert_eq!(session.step(), CheckoutStep::Shipping);
        // Data survives backward navigation...
        assert!(session.shipping().is_some());
        assert!(session.review().is_some());

        // ...but re-entering payment drops the review, forcing a re-run.
        session.submit_shipping(&valid_form()).unwrap();
        assert_eq!(session.step(), CheckoutStep::Payment);
        assert!(session.review().is_none());
    }

    #[test]
    fn test_back_from_cart_is_noop() {
        let mut session = CheckoutSession::new();
        session.back();
        assert_eq!(session.step(), CheckoutStep::Cart);
    }

    #[test]
    fn test_payable_requires_valid_review() {
        let mut session = CheckoutSession::new();
        session.proceed_to_shipping(&loaded_cart()).unwrap();
        session.submit_shipping(&valid_form()).unwrap();

        // No review yet (validation in flight): not payable.
        assert!(matches!(
            session.payable(),
            Err(CheckoutError::NotPayable { message: None })
        ));

        // Server says no: not payable, with the reason.
        session
            .store_review(review(false, Some("stock insufficient")))
            .unwrap();
        assert!(matches!(
            session.payable(),
            Err(CheckoutError::NotPayable { message: Some(m) }) if m == "stock insufficient"
        ));

        // Valid review: payable.
        session.store_review(review(true, None)).unwrap();
        let (stored, shipping) = session.payable().unwrap();
        assert!(stored.payment_enabled());
        assert_eq!(shipping.city, "Tehran");
    }

    #[test]
    fn test_step_display_and_serde() {
        assert_eq!(CheckoutStep::Payment.to_string(), "payment");
        let json = serde_json::to_string(&CheckoutStep::Shipping).unwrap();
        assert_eq!(json, "\"shipping\"");
    }
}
