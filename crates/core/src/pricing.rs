//! Deterministic price derivation for cart rows.
//!
//! Every surface that shows money for a cart row - the cart page, the header
//! mini-cart, the payment review - derives it from the row's snapshot through
//! [`compute_item_price`]. Nothing stores a computed price: a snapshot
//! refresh implicitly reprices everything, which is what keeps the displayed
//! numbers consistent across surfaces.
//!
//! The rules, in order:
//! 1. base price = variant price if present, else product price, else zero
//! 2. discount amount = descriptor applied to the base (percentage or fixed)
//! 3. final unit price = base minus discount, floored at zero
//! 4. line total = final unit price x quantity (quantity sanitized to >= 1)
//!
//! The derived discount percentage is reporting data only: for percentage
//! descriptors it is the descriptor's own value, for fixed descriptors it is
//! back-computed from the base price. It is deliberately not capped at 100 -
//! a 60k fixed discount on a 50k item reports 120% while the price clamps
//! at zero.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::cart::CartItem;
use crate::types::discount::DiscountKind;
use crate::types::money::Money;

/// Derived pricing for a single cart row. Never stored - recompute on use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceBreakdown {
    /// Per-unit price actually charged (after discount, floored at zero).
    pub unit_price: Money,
    /// Per-unit price before any discount.
    pub original_unit_price: Money,
    /// Per-unit amount taken off. May exceed the base price; the floor is
    /// applied to `unit_price`, not here.
    pub discount_amount: Money,
    /// Reported discount percentage, rounded to a whole number.
    pub discount_percentage: u32,
    /// `unit_price` x quantity.
    pub line_total: Money,
}

impl PriceBreakdown {
    /// Whether the row has any effective discount.
    #[must_use]
    pub fn is_discounted(&self) -> bool {
        !self.discount_amount.is_zero()
    }
}

/// Derive the full price breakdown for one cart row.
#[must_use]
pub fn compute_item_price(item: &CartItem) -> PriceBreakdown {
    let quantity = item.quantity.max(1);
    let base = item.base_price();

    let discount_amount = item
        .product
        .discount
        .map_or_else(Money::zero, |d| d.amount_off(base));

    let unit_price = base.saturating_sub(discount_amount);

    let discount_percentage = match item.product.discount {
        Some(d) if d.kind == DiscountKind::Percentage => round_percentage(d.amount),
        Some(_) if !base.is_zero() => {
            round_percentage(discount_amount.amount() / base.amount() * Decimal::ONE_HUNDRED)
        }
        _ => 0,
    };

    PriceBreakdown {
        unit_price,
        original_unit_price: base,
        discount_amount,
        discount_percentage,
        line_total: unit_price.times(quantity),
    }
}

/// Sum of line totals across the given rows.
#[must_use]
pub fn cart_subtotal<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> Money {
    items
        .into_iter()
        .map(|item| compute_item_price(item).line_total)
        .fold(Money::zero(), Money::saturating_add)
}

/// Sum of quantities across the given rows (header badge count).
#[must_use]
pub fn cart_count<'a>(items: impl IntoIterator<Item = &'a CartItem>) -> u32 {
    items
        .into_iter()
        .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
}

fn round_percentage(value: Decimal) -> u32 {
    value
        .max(Decimal::ZERO)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u32()
        .unwrap_or(u32::MAX)
}
