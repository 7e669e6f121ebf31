//! Domain types for store API results.
//!
//! These are the clean, already-converted shapes the rest of the engine
//! works with, separate from the raw wire structs in `wire`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use bazaar_core::{CartItem, Money, OrderId};

// =============================================================================
// Cart
// =============================================================================

/// The authoritative cart as returned by the store API.
///
/// `total` and `count` are the server's own figures; the cart store
/// re-derives both through pricing and logs if they drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    /// Cart rows with fresh snapshots.
    pub items: Vec<CartItem>,
    /// Server-computed order subtotal.
    pub total: Money,
    /// Server-computed sum of quantities.
    pub count: u32,
}

impl Cart {
    /// An empty cart (what an anonymous or fresh session starts with).
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: Money::zero(),
            count: 0,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Server-computed price summary from cart validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// Sum of line totals.
    pub subtotal: Money,
    /// Subtotal plus any server-side adjustments.
    pub total: Money,
}

/// Result of the server re-checking the cart before payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartValidation {
    /// Whether every row is still purchasable at the stated prices.
    pub is_valid: bool,
    /// Human-readable reason when invalid.
    pub message: Option<String>,
    /// Authoritative totals computed alongside validation.
    pub price_summary: PriceSummary,
    /// Sum of quantities across rows.
    pub items_count: u32,
    /// Number of distinct products.
    pub products_count: u32,
}

// =============================================================================
// Shipping
// =============================================================================

/// A shipping cost quote for a specific destination and subtotal.
///
/// Valid only for the exact inputs it was computed from; any cart change
/// invalidates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    /// Delivery cost (zero when `is_free`).
    pub cost: Money,
    /// Whether the order qualified for free shipping.
    pub is_free: bool,
    /// Server's delivery estimate, when it gives one.
    pub estimated_delivery: Option<NaiveDate>,
}

// =============================================================================
// Orders
// =============================================================================

/// Server-computed money for a created order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// Sum of line totals as the server priced them.
    pub subtotal: Money,
    /// Shipping cost the server actually charged.
    pub shipping_cost: Money,
    /// Amount the payment gateway will collect.
    pub total: Money,
}

/// A created order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Server-assigned order ID.
    pub id: OrderId,
    /// Authoritative money for the order.
    pub financial_summary: FinancialSummary,
}
