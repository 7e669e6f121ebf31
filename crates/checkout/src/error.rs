//! Unified error type and recovery classification.
//!
//! Each concern keeps its own `thiserror` enum close to the code that
//! produces it; this module folds them into one [`Error`] for callers and
//! classifies every failure by what the UI should do next ([`Recovery`]).
//! Expected failures travel as values across component boundaries - no
//! panics, no exceptions-as-control-flow.

use thiserror::Error;

use crate::api::StoreApiError;
use crate::cart::CartError;
use crate::checkout::state::CheckoutError;
use crate::checkout::submit::SubmitError;
use crate::config::ConfigError;
use crate::services::gateway::GatewayError;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure the checkout engine can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A store API call failed.
    #[error(transparent)]
    Store(#[from] StoreApiError),

    /// A payment gateway call failed outside the submission sequence.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A cart operation failed.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// A checkout transition was refused.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// The order submission sequence failed.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The gateway handoff document failed to render.
    #[error("failed to render gateway handoff document: {0}")]
    Template(#[from] askama::Error),
}

/// What the UI should offer the user after a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recovery {
    /// Transport-level failure; state untouched. Offer an explicit retry.
    Retry,
    /// The request was understood and refused (invalid cart, invalid form,
    /// guarded transition). Show the inline message; forward progress stays
    /// blocked until the cause is fixed.
    Block,
    /// The session is gone; token and cart are already cleared. Send the
    /// user to sign-in.
    Reauthenticate,
    /// The failure left server-side state behind (an order with no payment
    /// attempt) or needs operator attention. Tell the user exactly what
    /// happened; never retry silently.
    Manual,
}

impl Error {
    /// Classify this failure for the UI.
    #[must_use]
    pub fn recovery(&self) -> Recovery {
        match self {
            Self::Config(_) | Self::Template(_) => Recovery::Manual,
            Self::Store(e) => store_recovery(e),
            Self::Gateway(_) => Recovery::Retry,
            Self::Cart(e) => match e {
                CartError::MutationInFlight => Recovery::Block,
                CartError::Unauthorized => Recovery::Reauthenticate,
                CartError::Api(inner) => store_recovery(inner),
            },
            Self::Checkout(_) => Recovery::Block,
            Self::Submit(e) => match e {
                SubmitError::InFlight => Recovery::Block,
                SubmitError::CreateOrder(inner) => store_recovery(inner),
                SubmitError::Unauthorized => Recovery::Reauthenticate,
                SubmitError::AlreadyCreated(_) | SubmitError::TokenRequest { .. } => {
                    Recovery::Manual
                }
            },
        }
    }
}

fn store_recovery(error: &StoreApiError) -> Recovery {
    match error {
        StoreApiError::Unauthorized => Recovery::Reauthenticate,
        e if e.is_transport() => Recovery::Retry,
        _ => Recovery::Block,
    }
}
