//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_STORE_API_URL` - Base URL of the store REST API
//! - `BAZAAR_GATEWAY_TOKEN_URL` - Payment gateway token-request endpoint
//!
//! ## Optional
//! - `BAZAAR_AUTH_TOKEN` - Persisted session bearer token to start with
//! - `BAZAAR_FALLBACK_SHIPPING_COST` - Flat shipping estimate used when the
//!   quote endpoint is unreachable (default: 50000). This is only ever an
//!   estimate; the server recomputes the real cost at order creation.

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use bazaar_core::Money;

/// Flat shipping estimate when no authoritative quote is available.
const DEFAULT_FALLBACK_SHIPPING_COST: i64 = 50_000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Checkout engine configuration.
///
/// Implements `Debug` manually to redact the auth token.
#[derive(Clone)]
pub struct EngineConfig {
    /// Base URL of the store REST API.
    pub store_api_url: Url,
    /// Payment gateway token-request endpoint.
    pub gateway_token_url: Url,
    /// Persisted session bearer token, if the user was signed in.
    pub auth_token: Option<SecretString>,
    /// Flat shipping estimate used when the quote endpoint fails.
    pub fallback_shipping_cost: Money,
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("store_api_url", &self.store_api_url.as_str())
            .field("gateway_token_url", &self.gateway_token_url.as_str())
            .field("auth_token", &self.auth_token.as_ref().map(|_| "[REDACTED]"))
            .field("fallback_shipping_cost", &self.fallback_shipping_cost)
            .finish()
    }
}

impl EngineConfig {
    /// Build a configuration from explicit URLs, with no session token and
    /// the default fallback shipping estimate.
    #[must_use]
    pub fn new(store_api_url: Url, gateway_token_url: Url) -> Self {
        Self {
            store_api_url,
            gateway_token_url,
            auth_token: None,
            fallback_shipping_cost: Money::from_units(DEFAULT_FALLBACK_SHIPPING_COST),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid
    /// (non-URL endpoints, non-numeric or negative fallback cost).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let store_api_url = parse_base_url("BAZAAR_STORE_API_URL", &get_required_env("BAZAAR_STORE_API_URL")?)?;
        let gateway_token_url =
            parse_base_url("BAZAAR_GATEWAY_TOKEN_URL", &get_required_env("BAZAAR_GATEWAY_TOKEN_URL")?)?;
        let auth_token = get_optional_env("BAZAAR_AUTH_TOKEN").map(SecretString::from);
        let fallback_shipping_cost = parse_fallback_cost(&get_env_or_default(
            "BAZAAR_FALLBACK_SHIPPING_COST",
            &DEFAULT_FALLBACK_SHIPPING_COST.to_string(),
        ))?;

        Ok(Self {
            store_api_url,
            gateway_token_url,
            auth_token,
            fallback_shipping_cost,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse and sanity-check an endpoint URL.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }

    Ok(url)
}

/// Parse the fallback shipping cost (whole currency units, non-negative).
fn parse_fallback_cost(value: &str) -> Result<Money, ConfigError> {
    let units = value.parse::<i64>().map_err(|e| {
        ConfigError::InvalidEnvVar("BAZAAR_FALLBACK_SHIPPING_COST".to_string(), e.to_string())
    })?;

    if units < 0 {
        return Err(ConfigError::InvalidEnvVar(
            "BAZAAR_FALLBACK_SHIPPING_COST".to_string(),
            "must not be negative".to_string(),
        ));
    }

    Ok(Money::from_units(units))
}
