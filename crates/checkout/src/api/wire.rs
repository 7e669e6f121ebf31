//! Raw wire shapes for the store API and their domain conversions.
//!
//! Field names mirror the JSON contract exactly (camelCase, whole-unit
//! money as plain numbers). Nothing outside the API module sees these;
//! responses are converted to the domain types in `types` immediately
//! after decoding.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};

use bazaar_core::{
    CartItem, CartItemId, Discount, DiscountKind, Money, OrderId, ProductId, ProductSnapshot,
    VariantId, VariantSnapshot,
};

use super::types::{Cart, CartValidation, FinancialSummary, Order, PriceSummary, ShippingQuote};

// =============================================================================
// Envelope
// =============================================================================

/// The `{success, message, data}` envelope every endpoint responds with.
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    // No `default` here: that would bound the derive on `T: Default`,
    // and serde already decodes an absent `Option` field as `None`.
    pub data: Option<T>,
}

// =============================================================================
// Cart payloads
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountData {
    pub amount: f64,
    pub kind: DiscountKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    pub name: String,
    pub image: Option<String>,
    pub stock: u32,
    pub price: Option<i64>,
    pub discount: Option<DiscountData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantData {
    pub title: Option<String>,
    pub price: Option<i64>,
    pub stock: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemData {
    pub id: String,
    pub product_id: String,
    pub variant_id: Option<String>,
    pub quantity: u32,
    pub product: ProductData,
    pub variant: Option<VariantData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartData {
    pub items: Vec<CartItemData>,
    pub total: i64,
    pub count: u32,
}

impl From<DiscountData> for Discount {
    fn from(data: DiscountData) -> Self {
        Self {
            // Non-finite amounts decode to zero rather than poisoning the row.
            amount: Decimal::from_f64(data.amount).unwrap_or_default(),
            kind: data.kind,
        }
    }
}

impl From<ProductData> for ProductSnapshot {
    fn from(data: ProductData) -> Self {
        Self {
            name: data.name,
            image: data.image,
            stock: data.stock,
            price: data.price.map(Money::from_units),
            discount: data.discount.map(Discount::from),
        }
    }
}

impl From<VariantData> for VariantSnapshot {
    fn from(data: VariantData) -> Self {
        Self {
            title: data.title,
            price: data.price.map(Money::from_units),
            stock: data.stock,
        }
    }
}

impl From<CartItemData> for CartItem {
    fn from(data: CartItemData) -> Self {
        Self {
            id: CartItemId::new(data.id),
            product_id: ProductId::new(data.product_id),
            variant_id: data.variant_id.map(VariantId::new),
            quantity: data.quantity,
            product: data.product.into(),
            variant: data.variant.map(VariantSnapshot::from),
        }
    }
}

impl From<CartData> for Cart {
    fn from(data: CartData) -> Self {
        Self {
            items: data.items.into_iter().map(CartItem::from).collect(),
            total: Money::from_units(data.total),
            count: data.count,
        }
    }
}

// =============================================================================
// Validation payload
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSummaryData {
    pub subtotal: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationData {
    pub is_valid: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub price_summary: PriceSummaryData,
    pub items_count: u32,
    pub products_count: u32,
}

impl From<ValidationData> for CartValidation {
    fn from(data: ValidationData) -> Self {
        Self {
            is_valid: data.is_valid,
            message: data.message,
            price_summary: PriceSummary {
                subtotal: Money::from_units(data.price_summary.subtotal),
                total: Money::from_units(data.price_summary.total),
            },
            items_count: data.items_count,
            products_count: data.products_count,
        }
    }
}

// =============================================================================
// Shipping payload
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingQuoteData {
    pub cost: i64,
    pub is_free: bool,
    #[serde(default)]
    pub estimated_delivery: Option<String>,
}

impl From<ShippingQuoteData> for ShippingQuote {
    fn from(data: ShippingQuoteData) -> Self {
        Self {
            cost: Money::from_units(data.cost),
            is_free: data.is_free,
            // Unparseable dates degrade to "no estimate", not an error.
            estimated_delivery: data
                .estimated_delivery
                .and_then(|s| chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()),
        }
    }
}

// =============================================================================
// Order payload
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialSummaryData {
    pub subtotal: i64,
    pub shipping_cost: i64,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderData {
    pub id: String,
    pub financial_summary: FinancialSummaryData,
}

impl From<OrderData> for Order {
    fn from(data: OrderData) -> Self {
        Self {
            id: OrderId::new(data.id),
            financial_summary: FinancialSummary {
                subtotal: Money::from_units(data.financial_summary.subtotal),
                shipping_cost: Money::from_units(data.financial_summary.shipping_cost),
                total: Money::from_units(data.financial_summary.total),
            },
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest<'a> {
    pub product_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<&'a str>,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingCostRequest<'a> {
    pub province: &'a str,
    pub city: &'a str,
    pub subtotal: i64,
    pub shipping_method: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone: &'a str,
    pub province: &'a str,
    pub city: &'a str,
    pub address: &'a str,
    pub postal_code: &'a str,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_envelope_decodes_and_converts() {
        let json = serde_json::json!({
            "success": true,
            "data": {
                "items": [{
                    "id": "ci_1",
                    "productId": "p_9",
                    "variantId": "v_2",
                    "quantity": 3,
                    "product": {
                        "name": "Leather satchel",
                        "image": "https://cdn.example.com/satchel.jpg",
                        "stock": 14,
                        "price": 100_000,
                        "discount": { "amount": 20.0, "kind": "percentage" }
                    },
                    "variant": { "title": "Brown", "price": null, "stock": 5 }
                }],
                "total": 240_000,
                "count": 3
            }
        });

        let envelope: ApiEnvelope<CartData> = serde_json::from_value(json).unwrap();
        assert!(envelope.success);

        let cart = Cart::from(envelope.data.unwrap());
        assert_eq!(cart.total, Money::from_units(240_000));
        assert_eq!(cart.count, 3);

        let item = &cart.items[0];
        assert_eq!(item.id, CartItemId::new("ci_1"));
        assert_eq!(item.variant_id, Some(VariantId::new("v_2")));
        assert_eq!(item.product.price, Some(Money::from_units(100_000)));
        assert_eq!(
            item.product.discount,
            Some(Discount::percentage(Decimal::from(20)))
        );
        assert_eq!(item.available_stock(), 5);
    }

    #[test]
    fn test_failure_envelope_carries_message_without_data() {
        let json = serde_json::json!({
            "success": false,
            "message": "quantity exceeds available stock"
        });
        let envelope: ApiEnvelope<CartData> = serde_json::from_value(json).unwrap();
        assert!(!envelope.success);
        assert_eq!(
            envelope.message.as_deref(),
            Some("quantity exceeds available stock")
        );
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_envelope_with_absent_data_decodes_to_none() {
        // `CartData` has no `Default`; the envelope must still decode when
        // the server omits `data` (and `message`) entirely.
        let envelope: ApiEnvelope<CartData> =
            serde_json::from_value(serde_json::json!({ "success": true })).unwrap();
        assert!(envelope.success);
        assert!(envelope.message.is_none());
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_validation_data_converts() {
        let json = serde_json::json!({
            "isValid": false,
            "message": "\u{0645}\u{0648}\u{062c}\u{0648}\u{062f}\u{06cc} \u{06a9}\u{0627}\u{0641}\u{06cc} \u{0646}\u{06cc}\u{0633}\u{062a}",
            "priceSummary": { "subtotal": 500_000, "total": 500_000 },
            "itemsCount": 2,
            "productsCount": 1
        });
        let validation = CartValidation::from(serde_json::from_value::<ValidationData>(json).unwrap());
        assert!(!validation.is_valid);
        assert!(validation.message.is_some());
        assert_eq!(validation.price_summary.subtotal, Money::from_units(500_000));
        assert_eq!(validation.items_count, 2);
    }

    #[test]
    fn test_shipping_quote_bad_date_degrades_to_none() {
        let json = serde_json::json!({
            "cost": 45_000,
            "isFree": false,
            "estimatedDelivery": "not-a-date"
        });
        let quote = ShippingQuote::from(serde_json::from_value::<ShippingQuoteData>(json).unwrap());
        assert_eq!(quote.cost, Money::from_units(45_000));
        assert!(quote.estimated_delivery.is_none());

        let json = serde_json::json!({
            "cost": 0,
            "isFree": true,
            "estimatedDelivery": "2026-09-01"
        });
        let quote = ShippingQuote::from(serde_json::from_value::<ShippingQuoteData>(json).unwrap());
        assert!(quote.is_free);
        assert_eq!(
            quote.estimated_delivery,
            chrono::NaiveDate::from_ymd_opt(2026, 9, 1)
        );
    }

    #[test]
    fn test_add_item_request_omits_missing_variant() {
        let with_variant = AddItemRequest {
            product_id: "p_1",
            variant_id: Some("v_1"),
            quantity: 2,
        };
        let json = serde_json::to_value(&with_variant).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "productId": "p_1", "variantId": "v_1", "quantity": 2 })
        );

        let without_variant = AddItemRequest {
            product_id: "p_1",
            variant_id: None,
            quantity: 2,
        };
        let json = serde_json::to_value(&without_variant).unwrap();
        assert_eq!(json, serde_json::json!({ "productId": "p_1", "quantity": 2 }));
    }

    #[test]
    fn test_create_order_request_shape() {
        let request = CreateOrderRequest {
            first_name: "Sara",
            last_name: "Ahmadi",
            phone: "09123456789",
            province: "Tehran",
            city: "Tehran",
            address: "Valiasr St 12",
            postal_code: "1234567890",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "firstName": "Sara",
                "lastName": "Ahmadi",
                "phone": "09123456789",
                "province": "Tehran",
                "city": "Tehran",
                "address": "Valiasr St 12",
                "postalCode": "1234567890"
            })
        );
    }
}
