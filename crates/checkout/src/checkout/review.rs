//! Pre-payment validation and shipping quoting.
//!
//! Entering the payment step runs both round-trips here: the server
//! re-checks the cart ([`CartValidationGateway`]) and prices delivery for
//! the validated subtotal ([`ShippingQuoteService`]). Their combined result
//! is the [`PaymentReview`] the payment screen renders and the confirm
//! button is gated on. The review is dropped and recomputed on every
//! re-entry into the payment step; nothing here is cached.

use tracing::{instrument, warn};

use bazaar_core::Money;

use crate::api::types::{CartValidation, ShippingQuote};
use crate::api::{StoreApiClient, StoreApiError};
use crate::checkout::shipping::{ShippingInfo, ShippingMethod};

// =============================================================================
// CartValidationGateway
// =============================================================================

/// Server round-trip re-checking stock, prices, and availability.
///
/// The server is the sole authority here. When the call itself fails there
/// is no answer - the error propagates and payment stays blocked. Locally
/// computed totals may still be *displayed* while blocked, but nothing in
/// this engine ever treats them as permission to proceed.
#[derive(Debug, Clone)]
pub struct CartValidationGateway {
    api: StoreApiClient,
}

impl CartValidationGateway {
    /// Create a gateway over the given store client.
    #[must_use]
    pub const fn new(api: StoreApiClient) -> Self {
        Self { api }
    }

    /// Ask the server whether the cart is still purchasable as priced.
    ///
    /// # Errors
    ///
    /// Returns the transport or API failure as-is; the caller must treat
    /// any error as "not validated", never as "valid".
    #[instrument(skip(self))]
    pub async fn validate(&self) -> Result<CartValidation, StoreApiError> {
        let validation = self.api.validate_cart().await?;
        if !validation.is_valid {
            warn!(
                message = validation.message.as_deref().unwrap_or("no reason given"),
                "server declared the cart invalid for payment"
            );
        }
        Ok(validation)
    }
}

// =============================================================================
// ShippingQuoteService
// =============================================================================

/// How a shipping figure was obtained.
///
/// The distinction is load-bearing: only a [`QuoteOutcome::Server`] figure
/// is authoritative for the subtotal it was quoted against. The fallback
/// exists so a flaky quote endpoint does not blank the payment screen, and
/// callers must render it as an estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuoteOutcome {
    /// The server quoted this destination and subtotal.
    Server(ShippingQuote),
    /// The quote endpoint failed; this is the configured flat-rate estimate.
    /// The server recomputes the real cost at order creation.
    FallbackFlatRate {
        /// Configured flat-rate estimate.
        cost: Money,
        /// Why the authoritative quote was unavailable.
        reason: String,
    },
}

impl QuoteOutcome {
    /// The shipping figure to display.
    #[must_use]
    pub const fn cost(&self) -> Money {
        match self {
            Self::Server(quote) => quote.cost,
            Self::FallbackFlatRate { cost, .. } => *cost,
        }
    }

    /// Whether the figure came from the server for these exact inputs.
    #[must_use]
    pub const fn is_authoritative(&self) -> bool {
        matches!(self, Self::Server(_))
    }

    /// Whether the order ships free (always false for a fallback estimate).
    #[must_use]
    pub const fn is_free(&self) -> bool {
        match self {
            Self::Server(quote) => quote.is_free,
            Self::FallbackFlatRate { .. } => false,
        }
    }
}

/// Server round-trip pricing delivery for a destination and subtotal.
#[derive(Debug, Clone)]
pub struct ShippingQuoteService {
    api: StoreApiClient,
    fallback_cost: Money,
}

impl ShippingQuoteService {
    /// Create a quote service with the configured flat-rate fallback.
    #[must_use]
    pub const fn new(api: StoreApiClient, fallback_cost: Money) -> Self {
        Self { api, fallback_cost }
    }

    /// Quote delivery. `subtotal` must be the validation gateway's figure,
    /// not a locally computed one, so the displayed total reconciles.
    ///
    /// # Errors
    ///
    /// Transport-level failures degrade to
    /// [`QuoteOutcome::FallbackFlatRate`]; only non-transport failures
    /// (session invalid, request rejected) propagate.
    #[instrument(skip(self, subtotal), fields(subtotal = %subtotal))]
    pub async fn quote(
        &self,
        province: &str,
        city: &str,
        subtotal: Money,
        method: ShippingMethod,
    ) -> Result<QuoteOutcome, StoreApiError> {
        match self.api.shipping_cost(province, city, subtotal, method).await {
            Ok(quote) => Ok(QuoteOutcome::Server(quote)),
            Err(e) if e.is_transport() => {
                warn!(
                    error = %e,
                    fallback = %self.fallback_cost,
                    "shipping quote unavailable; using flat-rate estimate"
                );
                Ok(QuoteOutcome::FallbackFlatRate {
                    cost: self.fallback_cost,
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Convenience wrapper quoting for a validated shipping destination.
    ///
    /// # Errors
    ///
    /// Same as [`Self::quote`].
    pub async fn quote_for(
        &self,
        shipping: &ShippingInfo,
        subtotal: Money,
    ) -> Result<QuoteOutcome, StoreApiError> {
        self.quote(&shipping.province, &shipping.city, subtotal, shipping.method)
            .await
    }
}

// =============================================================================
// PaymentReview
// =============================================================================

/// Everything the payment screen shows and the confirm button is gated on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReview {
    /// The server's authoritative re-check of the cart.
    pub validation: CartValidation,
    /// Shipping figure for the validated subtotal and chosen destination.
    pub quote: QuoteOutcome,
}

impl PaymentReview {
    /// Whether confirming payment is allowed. Gated on validation only:
    /// an unauthoritative shipping estimate does not block, because the
    /// server reprices the order at creation anyway.
    #[must_use]
    pub const fn payment_enabled(&self) -> bool {
        self.validation.is_valid
    }

    /// The total to display: validated cart total plus shipping figure.
    #[must_use]
    pub fn display_total(&self) -> Money {
        self.validation
            .price_summary
            .total
            .saturating_add(self.quote.cost())
    }

    /// Whether the displayed total contains an unauthoritative estimate
    /// and must be labelled as such.
    #[must_use]
    pub const fn is_estimate(&self) -> bool {
        !self.quote.is_authoritative()
    }
}
