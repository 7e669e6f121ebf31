//! Cart item snapshots.
//!
//! Cart rows carry a denormalized snapshot of the product (and variant)
//! captured when the cart was last read from the store API. Prices are
//! never locked in at add time: every fetch refreshes the snapshot, and
//! all money shown for a row is re-derived from it by [`crate::pricing`].

use serde::{Deserialize, Serialize};

use super::discount::Discount;
use super::id::{CartItemId, ProductId, VariantId};
use super::money::Money;

// =============================================================================
// Snapshots
// =============================================================================

/// Product data captured at cart-read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Display name.
    pub name: String,
    /// Primary image URL, if the product has one.
    pub image: Option<String>,
    /// Units in stock at read time.
    pub stock: u32,
    /// Base price. `None` means the catalog row had no price data;
    /// pricing treats it as zero rather than failing the row.
    pub price: Option<Money>,
    /// Active discount descriptor, if any.
    pub discount: Option<Discount>,
}

/// Variant data captured at cart-read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    /// Variant display title (e.g. a color or size label).
    pub title: Option<String>,
    /// Variant price override. Takes precedence over the product price.
    pub price: Option<Money>,
    /// Variant-level stock, when tracked separately from the product.
    pub stock: Option<u32>,
}

// =============================================================================
// Cart Item
// =============================================================================

/// One row of the cart.
///
/// A row's identity is its server-assigned `id`; `(product_id, variant_id)`
/// is the merge key the server uses when the same purchasable is added
/// twice. `quantity` is always at least 1 - a quantity of zero is a removal,
/// which deletes the row instead of keeping it around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Server-assigned row ID.
    pub id: CartItemId,
    /// Product this row refers to.
    pub product_id: ProductId,
    /// Selected variant, if the product has variants.
    pub variant_id: Option<VariantId>,
    /// Units of this purchasable in the cart (>= 1).
    pub quantity: u32,
    /// Product snapshot at last read.
    pub product: ProductSnapshot,
    /// Variant snapshot at last read, if a variant is selected.
    pub variant: Option<VariantSnapshot>,
}

impl CartItem {
    /// The price the row is charged at before discounts: the variant price
    /// when the selected variant has one, else the product price, else zero.
    #[must_use]
    pub fn base_price(&self) -> Money {
        self.variant
            .as_ref()
            .and_then(|v| v.price)
            .or(self.product.price)
            .unwrap_or_else(Money::zero)
    }

    /// Stock limit that applies to this row: variant stock when tracked,
    /// product stock otherwise.
    #[must_use]
    pub fn available_stock(&self) -> u32 {
        self.variant
            .as_ref()
            .and_then(|v| v.stock)
            .unwrap_or(self.product.stock)
    }

    /// Whether this row refers to the given purchasable.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.product_id == *product_id && self.variant_id.as_ref() == variant_id
    }
}
