//! Engine wiring.
//!
//! [`Engine`] builds every collaborator from one [`EngineConfig`] and owns
//! the pieces with process-wide lifetime: the session context, the sync
//! bus, and the cart store. Checkout flows are created per buyer pass via
//! [`Engine::begin_checkout`]; each gets its own step machine and
//! submission latch but shares the cart, session, and clients.

use crate::api::StoreApiClient;
use crate::cart::{CartStore, CartSyncBus};
use crate::checkout::{
    CartValidationGateway, CheckoutFlow, OrderSubmissionCoordinator, ShippingQuoteService,
};
use crate::config::{ConfigError, EngineConfig};
use crate::services::gateway::PaymentGatewayClient;
use crate::session::SessionContext;

/// The assembled checkout engine for one logical user session.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    session: SessionContext,
    api: StoreApiClient,
    gateway: PaymentGatewayClient,
    cart: CartStore,
}

impl Engine {
    /// Wire up an engine from configuration. Reads the persisted auth
    /// token, if any, into the session context.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let session = SessionContext::new(config.auth_token.clone());
        let api = StoreApiClient::new(&config, session.clone());
        let gateway = PaymentGatewayClient::new(&config);
        let cart = CartStore::new(api.clone(), CartSyncBus::new(), session.clone());

        Self {
            config,
            session,
            api,
            gateway,
            cart,
        }
    }

    /// Wire up an engine from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when required variables are missing or
    /// malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(EngineConfig::from_env()?))
    }

    /// The shared cart store.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// The bus all cart surfaces subscribe to.
    #[must_use]
    pub fn bus(&self) -> &CartSyncBus {
        self.cart.bus()
    }

    /// The session context (for sign-in/sign-out integration).
    #[must_use]
    pub const fn session(&self) -> &SessionContext {
        &self.session
    }

    /// The store API client, for mutation paths that bypass the cart store
    /// (they must publish on the bus themselves after success).
    #[must_use]
    pub const fn store_api(&self) -> &StoreApiClient {
        &self.api
    }

    /// Start a checkout pass at the cart step.
    #[must_use]
    pub fn begin_checkout(&self) -> CheckoutFlow {
        let validation = CartValidationGateway::new(self.api.clone());
        let quotes =
            ShippingQuoteService::new(self.api.clone(), self.config.fallback_shipping_cost);
        let coordinator = OrderSubmissionCoordinator::new(
            self.api.clone(),
            self.gateway.clone(),
            self.cart.clone(),
        );
        CheckoutFlow::new(self.cart.clone(), validation, quotes, coordinator)
    }

    /// End the session: drop the auth token and clear the cart, notifying
    /// every surface. Used on sign-out; the 401 path runs the same teardown
    /// internally.
    pub fn teardown(&self) {
        self.cart.teardown();
    }
}
