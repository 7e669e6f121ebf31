//! Discount descriptors attached to catalog snapshots.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::money::Money;

/// How a [`Discount`] amount is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `amount` is a percentage of the base price (e.g. `20` for 20% off).
    Percentage,
    /// `amount` is an absolute amount of money off the base price.
    Fixed,
}

/// A discount descriptor as it appears on product and variant snapshots.
///
/// The descriptor is data, not a computation: the amount of money it takes
/// off a given base price is derived in [`crate::pricing`], where the
/// clamp-at-zero rule lives. Descriptors with `amount` larger than the base
/// price (or larger than 100 for percentages) are legal catalog data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discount {
    /// Magnitude, interpreted per `kind`. Negative values are treated as zero.
    pub amount: Decimal,
    /// Interpretation of `amount`.
    pub kind: DiscountKind,
}

impl Discount {
    /// A percentage discount (e.g. `percentage(20)` for 20% off).
    #[must_use]
    pub fn percentage(amount: impl Into<Decimal>) -> Self {
        Self {
            amount: amount.into(),
            kind: DiscountKind::Percentage,
        }
    }

    /// A fixed amount-off discount.
    #[must_use]
    pub fn fixed(amount: Money) -> Self {
        Self {
            amount: amount.amount(),
            kind: DiscountKind::Fixed,
        }
    }

    /// The amount of money this discount takes off `base`.
    ///
    /// Not clamped to `base`; callers subtract with
    /// [`Money::saturating_sub`], which is where the floor at zero applies.
    #[must_use]
    pub fn amount_off(&self, base: Money) -> Money {
        let amount = self.amount.max(Decimal::ZERO);
        match self.kind {
            DiscountKind::Percentage => base.percent_of(amount),
            DiscountKind::Fixed => Money::new(amount),
        }
    }
}
