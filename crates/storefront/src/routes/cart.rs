//! Cart handlers.
//!
//! The cart lives in the session under `cart-storage`. Line prices always
//! come from the catalog; clients only send ids and quantities.

use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use lumiere_core::ProductId;

use crate::cart::{CartStore, CartSummary, SessionCartStorage};
use crate::catalog::Product;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

const fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: i32,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

#[derive(Debug, Serialize)]
pub struct CartCount {
    pub count: u64,
}

/// Open the session's cart.
pub(crate) async fn open_cart(session: &Session) -> Result<CartStore<SessionCartStorage>> {
    Ok(CartStore::open(SessionCartStorage::new(session.clone())).await?)
}

/// Look up a product that can go in the cart.
pub(crate) async fn purchasable(state: &AppState, id: ProductId) -> Result<Product> {
    let product = state
        .catalog()
        .product(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("livre {id}")))?;
    if !product.in_stock() {
        return Err(AppError::BadRequest(format!(
            "« {} » est en rupture de stock",
            product.title
        )));
    }
    Ok(product)
}

#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<CartSummary>> {
    Ok(Json(open_cart(&session).await?.summary()))
}

/// Item count for the header badge.
#[instrument(skip(session))]
pub async fn count(session: Session) -> Result<Json<CartCount>> {
    let cart = open_cart(&session).await?;
    Ok(Json(CartCount {
        count: cart.total_items(),
    }))
}

#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<AddToCartForm>,
) -> Result<Json<CartSummary>> {
    if form.quantity == 0 {
        return Err(AppError::BadRequest(
            "La quantité doit être au moins 1".to_string(),
        ));
    }
    let product = purchasable(&state, ProductId::new(form.product_id)).await?;

    let mut cart = open_cart(&session).await?;
    cart.add_item(product.cart_product(), form.quantity).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &form.product_id.to_string())]),
    );
    Ok(Json(cart.summary()))
}

/// Set a line's quantity; zero or less removes it.
#[instrument(skip(session))]
pub async fn update(session: Session, Json(form): Json<UpdateCartForm>) -> Result<Json<CartSummary>> {
    let mut cart = open_cart(&session).await?;
    cart.update_quantity(ProductId::new(form.product_id), form.quantity)
        .await?;
    Ok(Json(cart.summary()))
}

#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Json(form): Json<RemoveFromCartForm>,
) -> Result<Json<CartSummary>> {
    let mut cart = open_cart(&session).await?;
    cart.remove_item(ProductId::new(form.product_id)).await?;
    Ok(Json(cart.summary()))
}

#[instrument(skip(session))]
pub async fn clear(session: Session) -> Result<Json<CartSummary>> {
    let mut cart = open_cart(&session).await?;
    cart.clear().await?;
    Ok(Json(cart.summary()))
}
