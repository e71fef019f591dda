use std::sync::Arc;

use axum::{extract::{Path, State}, Json};
use serde::{Deserialize, Serialize};

use models::{Cart, LineItem, ProductId};
use service::cart::{CartError, CartOperation, CartStore, UpdateProductAmount};

use crate::errors::JsonApiError;
use crate::observability;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CartStore>,
}

/// Cart as returned to UI clients.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CartView {
    pub items: Vec<LineItem>,
    pub total_units: u64,
    pub subtotal: f64,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        Self { items: cart.items().to_vec(), total_units: cart.total_units(), subtotal: cart.subtotal() }
    }
}

#[derive(Debug, Deserialize)]
pub struct AmountInput {
    pub amount: i64,
}

fn respond(op: CartOperation, result: Result<Arc<Cart>, CartError>) -> Result<Json<CartView>, JsonApiError> {
    observability::record(op, &result);
    match result {
        Ok(cart) => {
            observability::set_line_items(cart.len());
            Ok(Json(CartView::from(cart.as_ref())))
        }
        Err(e) => Err(JsonApiError::from_cart(op, &e)),
    }
}

#[utoipa::path(get, path = "/cart", tag = "cart", responses((status = 200, description = "Current cart", body = crate::openapi::CartViewDoc)))]
pub async fn get_cart(State(state): State<AppState>) -> Json<CartView> {
    Json(CartView::from(state.store.cart().as_ref()))
}

#[utoipa::path(
    post,
    path = "/cart/items/{id}",
    tag = "cart",
    params(("id" = u64, Path, description = "Product id")),
    responses((status = 200, description = "Product added"), (status = 409, description = "Out of stock"), (status = 502, description = "Catalog unavailable"))
)]
pub async fn add_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<CartView>, JsonApiError> {
    respond(CartOperation::AddProduct, state.store.add_product(id).await)
}

#[utoipa::path(
    delete,
    path = "/cart/items/{id}",
    tag = "cart",
    params(("id" = u64, Path, description = "Product id")),
    responses((status = 200, description = "Product removed"), (status = 404, description = "Not in cart"))
)]
pub async fn remove_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<CartView>, JsonApiError> {
    respond(CartOperation::RemoveProduct, state.store.remove_product(id).await)
}

#[utoipa::path(
    put,
    path = "/cart/items/{id}",
    tag = "cart",
    params(("id" = u64, Path, description = "Product id")),
    request_body = crate::openapi::AmountInputDoc,
    responses((status = 200, description = "Amount changed or ignored"), (status = 404, description = "Not in cart"), (status = 409, description = "Out of stock"))
)]
pub async fn update_product_amount(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(input): Json<AmountInput>,
) -> Result<Json<CartView>, JsonApiError> {
    let result = state
        .store
        .update_product_amount(UpdateProductAmount { product_id: id, amount: input.amount })
        .await;
    respond(CartOperation::UpdateProductAmount, result)
}
