//! Core types for the Bazaar checkout engine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod discount;
pub mod id;
pub mod money;
pub mod phone;

pub use cart::{CartItem, ProductSnapshot, VariantSnapshot};
pub use discount::{Discount, DiscountKind};
pub use id::*;
pub use money::Money;
pub use phone::{Phone, PhoneError};
