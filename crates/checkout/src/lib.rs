//! Bazaar Checkout - cart consistency and checkout orchestration.
//!
//! The storefront's rendering layers are thin; this crate is where the
//! invariants live. It keeps one authoritative in-memory cart per session,
//! reprices everything from fresh snapshots on every read, walks buyers
//! through a guarded `cart → shipping → payment` sequence, and hands the
//! browser to the payment gateway exactly once per order.
//!
//! # Architecture
//!
//! - [`cart`] - the [`cart::CartStore`] (single source of truth, pessimistic
//!   mutations, last server response wins) and the [`cart::CartSyncBus`]
//!   every cart-rendering surface subscribes to
//! - [`checkout`] - the step machine, shipping form, pre-payment validation
//!   and quoting, and the order submission sequence
//! - [`api`] - the store REST client ([`api::StoreApiClient`])
//! - [`services`] - the payment gateway collaborator
//! - [`session`] - injectable auth-token context with explicit teardown
//! - [`engine`] - the wiring facade that assembles all of the above from
//!   [`config::EngineConfig`]
//!
//! Pricing itself lives in `bazaar-core`, pure and recomputable anywhere.
//!
//! # Example
//!
//! ```rust,no_run
//! use bazaar_checkout::{Engine, checkout::ShippingForm};
//!
//! # async fn run() -> bazaar_checkout::Result<()> {
//! let engine = Engine::from_env()?;
//!
//! let cart = engine.cart().load().await?;
//! println!("{} items, total {}", cart.count, cart.total);
//!
//! let mut flow = engine.begin_checkout();
//! flow.proceed_to_shipping().await?;
//!
//! let form = ShippingForm::default(); // bound to UI inputs in practice
//! let review = flow.submit_shipping(&form).await?;
//! if review.payment_enabled() {
//!     let handoff = flow.confirm().await?;
//!     let html = handoff.redirect_html()?;
//!     // serve `html`; the browser POSTs the token to the gateway
//!     # let _ = html;
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod engine;
pub mod error;
pub mod services;
pub mod session;

pub use cart::{CartError, CartEvent, CartState, CartStore, CartSyncBus, CartWatcher};
pub use checkout::{CheckoutFlow, CheckoutStep, PaymentHandoff, PaymentReview};
pub use config::{ConfigError, EngineConfig};
pub use engine::Engine;
pub use error::{Error, Recovery, Result};
pub use session::SessionContext;
