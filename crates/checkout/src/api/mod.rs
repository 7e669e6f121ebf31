//! Store REST API client.
//!
//! # Architecture
//!
//! - The remote store API is the sole authority on cart contents, stock,
//!   validation, shipping costs, and orders - NO local persistence, direct
//!   API calls only
//! - Every response is decoded from the `{success, message, data}` envelope
//!   into typed wire structs ([`wire`]) and converted to domain types
//!   ([`types`])
//! - Cart and checkout responses are never cached; staleness is the bug
//!   this engine exists to prevent
//!
//! # Example
//!
//! ```rust,ignore
//! use bazaar_checkout::api::StoreApiClient;
//!
//! let client = StoreApiClient::new(&config, session.clone());
//!
//! let cart = client.get_cart().await?;
//! let cart = client.add_item(&product_id, None, 1).await?;
//! ```

mod client;
pub mod types;
mod wire;

pub use client::StoreApiClient;
pub use types::{Cart, CartValidation, FinancialSummary, Order, PriceSummary, ShippingQuote};

use thiserror::Error;

/// Errors that can occur when talking to the store API.
#[derive(Debug, Error)]
pub enum StoreApiError {
    /// HTTP transport failed (DNS, connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or a body excerpt.
        message: String,
    },

    /// The session token was missing or no longer valid.
    #[error("Unauthorized: session is no longer valid")]
    Unauthorized,

    /// A well-formed `success: false` envelope (e.g. out-of-stock add).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// The response body did not match the expected shape.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A success envelope arrived without its `data` payload.
    #[error("Malformed response: success envelope with no data")]
    MissingData,
}

impl StoreApiError {
    /// Whether this failure is transport-level noise that a user-triggered
    /// retry can reasonably fix, as opposed to the server understanding the
    /// request and saying no.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Parse(_) | Self::MissingData | Self::Api { status: 500.., .. }
        )
    }
}
