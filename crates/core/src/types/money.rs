//! Monetary amounts with decimal arithmetic.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A monetary amount in the store's single settlement currency.
///
/// The store prices everything in a zero-decimal currency (whole units on
/// the wire, no cents column), so `Money` carries one `Decimal` amount and
/// no currency code. Fractional values still arise transiently from
/// percentage discounts; they are kept exact here and only rounded at the
/// payment-gateway boundary via [`Money::minor_units`].
///
/// ## Invariants
///
/// All arithmetic is saturating - pricing code must never panic on
/// adversarial catalog data (oversized discounts, absurd quantities).
/// Clamping at zero is explicit via [`Money::clamp_non_negative`]; plain
/// subtraction does not exist on this type.
///
/// ## Examples
///
/// ```
/// use bazaar_core::Money;
///
/// let base = Money::from_units(100_000);
/// let discounted = base.saturating_sub(Money::from_units(20_000));
/// assert_eq!(discounted, Money::from_units(80_000));
///
/// // Oversized discounts clamp instead of going negative:
/// let clamped = Money::from_units(50_000).saturating_sub(Money::from_units(60_000));
/// assert_eq!(clamped, Money::zero());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Create a `Money` from a raw decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Zero in the settlement currency.
    #[must_use]
    pub const fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Create a `Money` from a whole number of currency units.
    #[must_use]
    pub fn from_units(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// The raw decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Whether the amount is exactly zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Saturating addition.
    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Subtraction that stops at zero.
    ///
    /// This is the discount clamp: a discount larger than the base price
    /// yields a free item, never a negative one.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0).max(Decimal::ZERO))
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }

    /// Take a percentage of this amount (`percentage` is e.g. `20`, not `0.2`).
    #[must_use]
    pub fn percent_of(self, percentage: Decimal) -> Self {
        Self(self.0.saturating_mul(percentage) / Decimal::ONE_HUNDRED)
    }

    /// Negative amounts become zero; non-negative amounts are unchanged.
    #[must_use]
    pub fn clamp_non_negative(self) -> Self {
        Self(self.0.max(Decimal::ZERO))
    }

    /// The amount in the currency's smallest unit, rounded half away from
    /// zero. This is what payment gateways expect in their `amount` field.
    #[must_use]
    pub fn minor_units(&self) -> i64 {
        let rounded = self
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        rounded.to_i64().unwrap_or_else(|| {
            if rounded.is_sign_negative() {
                i64::MIN
            } else {
                i64::MAX
            }
        })
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl From<Money> for Decimal {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}
