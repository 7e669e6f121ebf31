//! Store REST API client implementation.
//!
//! Thin `reqwest` wrapper around the store's JSON endpoints. Reads the
//! bearer token from [`SessionContext`] per request, so sign-in/sign-out
//! takes effect immediately for every clone of the client.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use bazaar_core::{CartItemId, Money, ProductId, VariantId};

use crate::api::StoreApiError;
use crate::api::types::{Cart, CartValidation, Order, ShippingQuote};
use crate::api::wire::{
    AddItemRequest, ApiEnvelope, CartData, CreateOrderRequest, OrderData, ShippingCostRequest,
    ShippingQuoteData, UpdateItemRequest, ValidationData,
};
use crate::checkout::shipping::{ShippingInfo, ShippingMethod};
use crate::config::EngineConfig;
use crate::session::SessionContext;

// =============================================================================
// StoreApiClient
// =============================================================================

/// Client for the store REST API.
///
/// Carts, validation results, quotes, and orders are never cached: every
/// call is a fresh round-trip, because the server is the only source of
/// truth this engine trusts.
#[derive(Clone)]
pub struct StoreApiClient {
    inner: Arc<StoreApiClientInner>,
}

struct StoreApiClientInner {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl StoreApiClient {
    /// Create a new store API client.
    #[must_use]
    pub fn new(config: &EngineConfig, session: SessionContext) -> Self {
        let base_url = config.store_api_url.as_str().trim_end_matches('/').to_string();

        Self {
            inner: Arc::new(StoreApiClientInner {
                client: reqwest::Client::new(),
                base_url,
                session,
            }),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Attach the session bearer token, when one is installed.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.inner.session.token() {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Send a request and decode the `{success, message, data}` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, StoreApiError> {
        let response = self.authorize(request).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(StoreApiError::Unauthorized);
        }

        // Read the body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiEnvelope<serde_json::Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| body.chars().take(200).collect());
            tracing::error!(
                status = %status,
                message = %message,
                "Store API returned non-success status"
            );
            return Err(StoreApiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: ApiEnvelope<T> = serde_json::from_str(&body).inspect_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse store API response"
            );
        })?;

        if !envelope.success {
            return Err(StoreApiError::Rejected(
                envelope
                    .message
                    .unwrap_or_else(|| "request rejected".to_string()),
            ));
        }

        envelope.data.ok_or(StoreApiError::MissingData)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, StoreApiError> {
        let request = self.inner.client.post(self.endpoint(path)).json(body);
        self.send(request).await
    }

    // =========================================================================
    // Cart Methods
    // =========================================================================

    /// Fetch the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is invalid.
    #[instrument(skip(self))]
    pub async fn get_cart(&self) -> Result<Cart, StoreApiError> {
        let request = self.inner.client.get(self.endpoint("/api/cart"));
        let data: CartData = self.send(request).await?;
        Ok(data.into())
    }

    /// Add a purchasable to the cart; the server merges rows with the same
    /// product and variant.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the session is invalid, or
    /// the server rejects the add (e.g. insufficient stock).
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn add_item(
        &self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: u32,
    ) -> Result<Cart, StoreApiError> {
        let body = AddItemRequest {
            product_id: product_id.as_str(),
            variant_id: variant_id.map(VariantId::as_str),
            quantity,
        };
        let data: CartData = self.post_json("/api/cart/items", &body).await?;
        Ok(data.into())
    }

    /// Set the quantity of an existing row. Quantity must be >= 1; removal
    /// is its own call.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the session is invalid, or
    /// the server rejects the new quantity.
    #[instrument(skip(self), fields(item_id = %item_id, quantity))]
    pub async fn update_item(
        &self,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, StoreApiError> {
        let body = UpdateItemRequest { quantity };
        let request = self
            .inner
            .client
            .patch(self.endpoint(&format!("/api/cart/items/{item_id}")))
            .json(&body);
        let data: CartData = self.send(request).await?;
        Ok(data.into())
    }

    /// Remove a row from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is invalid.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<Cart, StoreApiError> {
        let request = self
            .inner
            .client
            .delete(self.endpoint(&format!("/api/cart/items/{item_id}")));
        let data: CartData = self.send(request).await?;
        Ok(data.into())
    }

    // =========================================================================
    // Checkout Methods
    // =========================================================================

    /// Re-check stock and prices for the whole cart before payment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is invalid.
    /// A *successful* call may still report `is_valid: false`; that is a
    /// result, not an error.
    #[instrument(skip(self))]
    pub async fn validate_cart(&self) -> Result<CartValidation, StoreApiError> {
        let request = self
            .inner
            .client
            .post(self.endpoint("/api/checkout/validate-cart"));
        let data: ValidationData = self.send(request).await?;
        Ok(data.into())
    }

    /// Price delivery for a destination and subtotal.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session is invalid.
    #[instrument(skip(self), fields(province = %province, city = %city))]
    pub async fn shipping_cost(
        &self,
        province: &str,
        city: &str,
        subtotal: Money,
        method: ShippingMethod,
    ) -> Result<ShippingQuote, StoreApiError> {
        let body = ShippingCostRequest {
            province,
            city,
            subtotal: subtotal.minor_units(),
            shipping_method: method.as_str(),
        };
        let data: ShippingQuoteData = self.post_json("/api/checkout/shipping-cost", &body).await?;
        Ok(data.into())
    }

    // =========================================================================
    // Order Methods
    // =========================================================================

    /// Create an order from the server-side cart and the given shipping
    /// info. The server prices the order itself; whatever the client showed
    /// is advisory.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the session is invalid, or
    /// the server refuses the order (validation failed server-side).
    #[instrument(skip(self, shipping), fields(idempotency_key = %idempotency_key))]
    pub async fn create_order(
        &self,
        shipping: &ShippingInfo,
        idempotency_key: &str,
    ) -> Result<Order, StoreApiError> {
        let body = CreateOrderRequest {
            first_name: &shipping.first_name,
            last_name: &shipping.last_name,
            phone: shipping.phone.as_str(),
            province: &shipping.province,
            city: &shipping.city,
            address: &shipping.address,
            postal_code: &shipping.postal_code,
        };
        let request = self
            .inner
            .client
            .post(self.endpoint("/api/orders"))
            .header("Idempotency-Key", idempotency_key)
            .json(&body);
        let data: OrderData = self.send(request).await?;
        Ok(data.into())
    }
}

impl std::fmt::Debug for StoreApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}
