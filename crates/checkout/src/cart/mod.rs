//! The authoritative in-memory cart.
//!
//! [`CartStore`] is the single source of truth for the active session's
//! cart. Every UI surface reads from it and none keeps its own copy: the
//! header badge, the cart page, and the product-page "already in cart"
//! indicator all render from [`CartStore::state`] snapshots and re-read
//! when poked on the [`sync::CartSyncBus`].
//!
//! Mutations are pessimistic: one server call, adopt the authoritative
//! response wholesale, then broadcast. No optimistic write ever reaches the
//! store, so a failed mutation needs no rollback - the prior state was
//! never touched. Concurrent mutations of the *same* row are rejected while
//! the first is in flight; different rows may race, and whichever server
//! response lands last wins.

pub mod sync;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{instrument, warn};

use bazaar_core::{CartItem, CartItemId, Money, ProductId, VariantId, cart_count, cart_subtotal};

use crate::api::types::Cart;
use crate::api::{StoreApiClient, StoreApiError};
use crate::session::SessionContext;

pub use sync::{CartEvent, CartSyncBus, CartWatcher};

// =============================================================================
// Errors
// =============================================================================

/// Failures surfaced by cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Another mutation of the same row is still in flight. Recoverable:
    /// wait for the running request, then retry.
    #[error("this item already has a request in flight")]
    MutationInFlight,

    /// The session token was rejected. The store has already torn the
    /// session down (token and cart cleared) by the time this is returned.
    #[error("session is no longer valid; signed out")]
    Unauthorized,

    /// The store API call failed; prior cart state is untouched.
    #[error(transparent)]
    Api(StoreApiError),
}

// =============================================================================
// State snapshot
// =============================================================================

/// A point-in-time view of the cart, handed to rendering code by value.
///
/// Totals are always re-derived through [`bazaar_core::pricing`] from the
/// current item snapshots, never carried over from an earlier render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartState {
    /// Cart rows with their read-time snapshots.
    pub items: Vec<CartItem>,
    /// Sum of line totals.
    pub total: Money,
    /// Sum of quantities (header badge figure).
    pub count: u32,
    /// Whether a `load` is currently in flight.
    pub is_loading: bool,
    /// When the store last adopted a server response.
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl CartState {
    fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Money::zero(),
            count: 0,
            is_loading: false,
            refreshed_at: None,
        }
    }

    /// Whether the cart has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// CartStore
// =============================================================================

/// Cloneable handle over the session's one authoritative cart.
///
/// All clones share state; mutating through any clone is observed by every
/// subscriber of the bus.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    api: StoreApiClient,
    bus: CartSyncBus,
    session: SessionContext,
    state: Mutex<CartState>,
    in_flight: Mutex<HashSet<String>>,
}

impl CartStore {
    /// Create a store starting from an empty cart; call [`Self::load`] to
    /// populate it.
    #[must_use]
    pub fn new(api: StoreApiClient, bus: CartSyncBus, session: SessionContext) -> Self {
        Self {
            inner: Arc::new(CartStoreInner {
                api,
                bus,
                session,
                state: Mutex::new(CartState::empty()),
                in_flight: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Current cart snapshot.
    #[must_use]
    pub fn state(&self) -> CartState {
        self.lock_state().clone()
    }

    /// Units of the given purchasable currently in the cart (0 if absent).
    /// Drives the product-page "already in cart" indicator.
    #[must_use]
    pub fn quantity_of(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> u32 {
        self.lock_state()
            .items
            .iter()
            .filter(|item| item.matches(product_id, variant_id))
            .fold(0, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Fetch the server cart and adopt it.
    ///
    /// # Errors
    ///
    /// On failure the prior state is left untouched - a populated cart is
    /// never wiped by a failed refresh. A 401 tears the session down first.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<CartState, CartError> {
        self.lock_state().is_loading = true;

        let result = self.inner.api.get_cart().await;
        self.lock_state().is_loading = false;

        match result {
            Ok(cart) => {
                // A read is not a mutation: adopt silently, no broadcast.
                self.adopt(cart);
                Ok(self.state())
            }
            Err(e) => Err(self.map_api_error(e)),
        }
    }

    /// Add a purchasable to the cart.
    ///
    /// # Errors
    ///
    /// Fails if the same purchasable already has an add in flight, the
    /// session is invalid, or the server rejects the add (e.g. stock).
    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    pub async fn add_item(
        &self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: u32,
    ) -> Result<CartState, CartError> {
        let key = match variant_id {
            Some(v) => format!("add:{product_id}:{v}"),
            None => format!("add:{product_id}"),
        };
        let _guard = self.begin_mutation(key)?;

        let cart = self
            .inner
            .api
            .add_item(product_id, variant_id, quantity.max(1))
            .await
            .map_err(|e| self.map_api_error(e))?;

        self.adopt_and_publish(cart);
        Ok(self.state())
    }

    /// Set a row's quantity. A quantity of zero degrades to
    /// [`Self::remove_item`] - zero-quantity rows do not exist.
    ///
    /// # Errors
    ///
    /// Fails if the row already has a mutation in flight, the session is
    /// invalid, or the server rejects the new quantity. The displayed
    /// state is unchanged on failure.
    #[instrument(skip(self), fields(item_id = %item_id, quantity))]
    pub async fn update_item_quantity(
        &self,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<CartState, CartError> {
        if quantity == 0 {
            return self.remove_item(item_id).await;
        }

        let _guard = self.begin_mutation(format!("item:{item_id}"))?;

        let cart = self
            .inner
            .api
            .update_item(item_id, quantity)
            .await
            .map_err(|e| self.map_api_error(e))?;

        self.adopt_and_publish(cart);
        Ok(self.state())
    }

    /// Remove a row from the cart.
    ///
    /// # Errors
    ///
    /// Fails if the row already has a mutation in flight or the call fails.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn remove_item(&self, item_id: &CartItemId) -> Result<CartState, CartError> {
        let _guard = self.begin_mutation(format!("item:{item_id}"))?;

        let cart = self
            .inner
            .api
            .remove_item(item_id)
            .await
            .map_err(|e| self.map_api_error(e))?;

        self.adopt_and_publish(cart);
        Ok(self.state())
    }

    /// Reset the local cart to empty and notify all surfaces.
    ///
    /// Local only - the server cart is consumed by order creation, not
    /// deleted by the client. Called after a successful order submission
    /// and on session teardown.
    pub fn clear(&self) {
        *self.lock_state() = CartState::empty();
        self.inner.bus.publish();
    }

    /// Tear the session down: drop the auth token and clear the cart, so
    /// one user's cart view never leaks into the next session.
    pub fn teardown(&self) {
        self.inner.session.clear_token();
        self.clear();
    }

    /// The bus this store publishes on.
    #[must_use]
    pub fn bus(&self) -> &CartSyncBus {
        &self.inner.bus
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn lock_state(&self) -> std::sync::MutexGuard<'_, CartState> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adopt a server response wholesale (last fetch wins), re-deriving
    /// totals through pricing so the store total can never drift from the
    /// sum of its lines.
    fn adopt(&self, cart: Cart) {
        let total = cart_subtotal(&cart.items);
        let count = cart_count(&cart.items);

        if total != cart.total || count != cart.count {
            warn!(
                server_total = %cart.total,
                derived_total = %total,
                server_count = cart.count,
                derived_count = count,
                "server cart totals drift from recomputed totals; keeping derived figures"
            );
        }

        let mut state = self.lock_state();
        state.items = cart.items;
        state.total = total;
        state.count = count;
        state.refreshed_at = Some(Utc::now());
    }

    fn adopt_and_publish(&self, cart: Cart) {
        self.adopt(cart);
        // Unconditionally on success: a missed update is a consistency bug,
        // a doubled refresh is just a second fetch.
        self.inner.bus.publish();
    }

    /// Map a store API failure, tearing the session down on a 401.
    fn map_api_error(&self, error: StoreApiError) -> CartError {
        match error {
            StoreApiError::Unauthorized => {
                warn!("store API rejected the session token; tearing session down");
                self.teardown();
                CartError::Unauthorized
            }
            other => CartError::Api(other),
        }
    }

    /// Claim the in-flight slot for a mutation key, released on drop.
    fn begin_mutation(&self, key: String) -> Result<InFlightGuard<'_>, CartError> {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if !in_flight.insert(key.clone()) {
            return Err(CartError::MutationInFlight);
        }

        Ok(InFlightGuard { store: self, key })
    }
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("CartStore")
            .field("count", &state.count)
            .field("total", &state.total)
            .field("is_loading", &state.is_loading)
            .finish_non_exhaustive()
    }
}

/// Releases a mutation key when the request finishes, success or not.
struct InFlightGuard<'a> {
    store: &'a CartStore,
    key: String,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.store
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}
