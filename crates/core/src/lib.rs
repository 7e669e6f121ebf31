//! Bazaar Core - Shared domain types and pricing rules.
//!
//! This crate provides the common vocabulary used across the Bazaar checkout
//! engine: type-safe domain primitives and the pricing rules every surface
//! derives its money figures from.
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Pricing lives here precisely because it must be
//! recomputable anywhere (cart rows, order summaries, payment review) with
//! byte-identical results.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, discounts, phone
//!   numbers, and cart item snapshots
//! - [`pricing`] - Deterministic per-item and cart-level price derivation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod pricing;
pub mod types;

pub use pricing::{PriceBreakdown, cart_count, cart_subtotal, compute_item_price};
pub use types::*;
