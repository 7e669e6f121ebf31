//! In-process stub of the store API and payment gateway.
//!
//! Serves the same JSON envelope contract the engine's client speaks,
//! keeps a server-side cart model, and exposes failure-injection toggles
//! so tests can exercise the degraded paths (failed mutations, invalid
//! carts, dead quote endpoint, order-creation and token failures, 401s).

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;

use bazaar_checkout::{Engine, EngineConfig};

/// Orders above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: i64 = 1_000_000;
/// Flat cost below the threshold.
pub const SHIPPING_COST: i64 = 45_000;

#[derive(Debug, Clone)]
pub struct StubProduct {
    pub name: String,
    pub price: i64,
    pub stock: u32,
}

#[derive(Debug, Clone)]
pub struct StubRow {
    pub id: String,
    pub product_id: String,
    pub quantity: u32,
}

#[derive(Debug, Clone)]
pub struct CreatedOrder {
    pub id: String,
    pub idempotency_key: Option<String>,
    pub total: i64,
}

#[derive(Debug, Default)]
pub struct StubState {
    pub products: BTreeMap<String, StubProduct>,
    pub rows: Vec<StubRow>,
    next_row: u32,
    next_order: u32,
    next_token: u32,
    /// Fail the next cart mutation (add/update/remove) with a 500, once.
    pub fail_next_mutation: bool,
    /// Make validate-cart report the cart invalid with this message.
    pub invalid_cart_message: Option<String>,
    /// Fail the shipping-cost endpoint with a 500.
    pub fail_shipping_quote: bool,
    /// Fail order creation with a 500.
    pub fail_create_order: bool,
    /// Fail the gateway token endpoint with a 500.
    pub fail_token: bool,
    /// Answer every store call with a 401.
    pub unauthorized: bool,
    pub orders: Vec<CreatedOrder>,
    pub delete_calls: u32,
}

impl StubState {
    fn subtotal(&self) -> i64 {
        self.rows
            .iter()
            .filter_map(|row| {
                let product = self.products.get(&row.product_id)?;
                Some(product.price * i64::from(row.quantity))
            })
            .sum()
    }

    fn shipping_cost(&self) -> i64 {
        if self.subtotal() >= FREE_SHIPPING_THRESHOLD {
            0
        } else {
            SHIPPING_COST
        }
    }

    fn cart_json(&self) -> Value {
        let items: Vec<Value> = self
            .rows
            .iter()
            .filter_map(|row| {
                let product = self.products.get(&row.product_id)?;
                Some(json!({
                    "id": row.id,
                    "productId": row.product_id,
                    "variantId": null,
                    "quantity": row.quantity,
                    "product": {
                        "name": product.name,
                        "image": null,
                        "stock": product.stock,
                        "price": product.price,
                        "discount": null,
                    },
                    "variant": null,
                }))
            })
            .collect();
        json!({
            "items": items,
            "total": self.subtotal(),
            "count": self.rows.iter().map(|r| r.quantity).sum::<u32>(),
        })
    }
}

type Shared = Arc<Mutex<StubState>>;

pub struct Stub {
    pub state: Shared,
    pub base_url: Url,
}

impl Stub {
    pub fn lock(&self) -> std::sync::MutexGuard<'_, StubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_product(&self, id: &str, name: &str, price: i64, stock: u32) {
        self.lock().products.insert(
            id.to_owned(),
            StubProduct {
                name: name.to_owned(),
                price,
                stock,
            },
        );
    }

    /// An engine pointed at this stub, signed in with a dummy token.
    pub fn engine(&self) -> Engine {
        let mut config = EngineConfig::new(
            self.base_url.clone(),
            self.base_url.join("gateway/token").expect("gateway url"),
        );
        config.auth_token = Some(SecretString::from("tok_test"));
        Engine::new(config)
    }
}

pub async fn start() -> Stub {
    // RUST_LOG=bazaar_checkout=debug surfaces engine tracing in test output.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let state: Shared = Arc::new(Mutex::new(StubState::default()));

    let app = Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/items", post(add_item))
        .route("/api/cart/items/{id}", patch(update_item))
        .route("/api/cart/items/{id}", delete(remove_item))
        .route("/api/checkout/validate-cart", post(validate_cart))
        .route("/api/checkout/shipping-cost", post(shipping_cost))
        .route("/api/orders", post(create_order))
        .route("/gateway/token", post(gateway_token))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });

    Stub {
        state,
        base_url: Url::parse(&format!("http://{addr}/")).expect("stub url"),
    }
}

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, StubState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn ok(data: Value) -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({"success": true, "data": data})))
}

fn rejected(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({"success": false, "message": message})),
    )
}

fn server_error() -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"success": false, "message": "internal error"})),
    )
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"success": false, "message": "unauthorized"})),
    )
}

/// Take the one-shot mutation failure flag; also handles the 401 toggle.
fn gate(state: &mut StubState) -> Option<(StatusCode, Json<Value>)> {
    if state.unauthorized {
        return Some(unauthorized());
    }
    if state.fail_next_mutation {
        state.fail_next_mutation = false;
        return Some(server_error());
    }
    None
}

async fn get_cart(State(state): State<Shared>) -> (StatusCode, Json<Value>) {
    let state = lock(&state);
    if state.unauthorized {
        return unauthorized();
    }
    ok(state.cart_json())
}

async fn add_item(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    if let Some(response) = gate(&mut state) {
        return response;
    }

    let product_id = body["productId"].as_str().unwrap_or_default().to_owned();
    let quantity = u32::try_from(body["quantity"].as_u64().unwrap_or(0)).unwrap_or(0);

    let Some(product) = state.products.get(&product_id).cloned() else {
        return rejected("unknown product");
    };
    let in_cart: u32 = state
        .rows
        .iter()
        .filter(|r| r.product_id == product_id)
        .map(|r| r.quantity)
        .sum();
    if in_cart + quantity > product.stock {
        return rejected("insufficient stock");
    }

    if let Some(row) = state.rows.iter_mut().find(|r| r.product_id == product_id) {
        row.quantity += quantity;
    } else {
        state.next_row += 1;
        let id = format!("ci_{}", state.next_row);
        state.rows.push(StubRow {
            id,
            product_id,
            quantity,
        });
    }
    ok(state.cart_json())
}

async fn update_item(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    if let Some(response) = gate(&mut state) {
        return response;
    }

    let quantity = u32::try_from(body["quantity"].as_u64().unwrap_or(0)).unwrap_or(0);
    if quantity == 0 {
        return rejected("quantity must be at least 1");
    }
    let Some(row) = state.rows.iter_mut().find(|r| r.id == id) else {
        return rejected("unknown cart item");
    };
    row.quantity = quantity;
    ok(state.cart_json())
}

async fn remove_item(
    State(state): State<Shared>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    if let Some(response) = gate(&mut state) {
        return response;
    }
    state.delete_calls += 1;
    state.rows.retain(|r| r.id != id);
    ok(state.cart_json())
}

async fn validate_cart(State(state): State<Shared>) -> (StatusCode, Json<Value>) {
    let state = lock(&state);
    if state.unauthorized {
        return unauthorized();
    }

    let subtotal = state.subtotal();
    let is_valid = state.invalid_cart_message.is_none() && !state.rows.is_empty();
    let message = state
        .invalid_cart_message
        .clone()
        .or_else(|| state.rows.is_empty().then(|| "cart is empty".to_owned()));

    ok(json!({
        "isValid": is_valid,
        "message": message,
        "priceSummary": { "subtotal": subtotal, "total": subtotal },
        "itemsCount": state.rows.iter().map(|r| r.quantity).sum::<u32>(),
        "productsCount": state.rows.len(),
    }))
}

async fn shipping_cost(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let state = lock(&state);
    if state.unauthorized {
        return unauthorized();
    }
    if state.fail_shipping_quote {
        return server_error();
    }

    let subtotal = body["subtotal"].as_i64().unwrap_or(0);
    let free = subtotal >= FREE_SHIPPING_THRESHOLD;
    ok(json!({
        "cost": if free { 0 } else { SHIPPING_COST },
        "isFree": free,
        "estimatedDelivery": "2026-09-05",
    }))
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    if state.unauthorized {
        return unauthorized();
    }
    if state.fail_create_order {
        return server_error();
    }
    if state.rows.is_empty() {
        return rejected("cart is empty");
    }

    let subtotal = state.subtotal();
    let shipping = state.shipping_cost();
    state.next_order += 1;
    let id = format!("ord_{}", state.next_order);
    state.orders.push(CreatedOrder {
        id: id.clone(),
        idempotency_key: headers
            .get("Idempotency-Key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
        total: subtotal + shipping,
    });

    ok(json!({
        "id": id,
        "financialSummary": {
            "subtotal": subtotal,
            "shippingCost": shipping,
            "total": subtotal + shipping,
        },
    }))
}

async fn gateway_token(
    State(state): State<Shared>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut state = lock(&state);
    if state.fail_token {
        return server_error();
    }
    state.next_token += 1;
    (
        StatusCode::OK,
        Json(json!({
            "token": format!("tok_{}_{}", body["orderId"].as_str().unwrap_or(""), state.next_token),
            "paymentUrl": "https://gateway.example.com/pay",
        })),
    )
}
