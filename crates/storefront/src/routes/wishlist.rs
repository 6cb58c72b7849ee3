//! Wishlist handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use serde::Serialize;
use tower_sessions::Session;
use tracing::{debug, info, instrument};

use lumiere_core::ProductId;

use crate::cart::CartSummary;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::cart::{open_cart, purchasable};
use crate::state::AppState;
use crate::wishlist::{Wishlist, WishlistItem, WishlistQuery, WishlistStats};

#[derive(Debug, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistItem>,
    pub categories: Vec<String>,
    pub stats: WishlistStats,
}

#[derive(Debug, Serialize)]
pub struct ToggleResult {
    pub in_wishlist: bool,
    pub stats: WishlistStats,
}

#[derive(Debug, Serialize)]
pub struct AddAllResult {
    pub added: usize,
    /// Saved items the catalog no longer sells or has run out of.
    pub skipped: Vec<ProductId>,
    pub cart: CartSummary,
}

#[instrument(skip(session, _auth))]
pub async fn show(
    _auth: RequireAuth,
    session: Session,
    Query(query): Query<WishlistQuery>,
) -> Result<Json<WishlistView>> {
    let wishlist = Wishlist::load(&session).await?;
    Ok(Json(WishlistView {
        items: wishlist.view(&query),
        categories: wishlist.categories(),
        stats: wishlist.stats(),
    }))
}

/// Add the product, or remove it if already saved.
#[instrument(skip(state, session, _auth))]
pub async fn toggle(
    State(state): State<AppState>,
    _auth: RequireAuth,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ToggleResult>> {
    let product = state
        .catalog()
        .product(ProductId::new(id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("livre {id}")))?;

    let mut wishlist = Wishlist::load(&session).await?;
    let in_wishlist = wishlist.toggle(&product, Utc::now().date_naive());
    wishlist.save(&session).await?;

    Ok(Json(ToggleResult {
        in_wishlist,
        stats: wishlist.stats(),
    }))
}

#[instrument(skip(session, _auth))]
pub async fn remove(
    _auth: RequireAuth,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<WishlistStats>> {
    let mut wishlist = Wishlist::load(&session).await?;
    if !wishlist.remove(ProductId::new(id)) {
        return Err(AppError::NotFound(format!("livre {id} dans la liste d'envies")));
    }
    wishlist.save(&session).await?;
    Ok(Json(wishlist.stats()))
}

/// Put one saved item in the cart. The item stays in the wishlist.
#[instrument(skip(state, session, _auth))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    _auth: RequireAuth,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<CartSummary>> {
    let id = ProductId::new(id);
    let wishlist = Wishlist::load(&session).await?;
    if !wishlist.contains(id) {
        return Err(AppError::NotFound(format!("livre {id} dans la liste d'envies")));
    }
    let product = purchasable(&state, id).await?;

    let mut cart = open_cart(&session).await?;
    cart.add_item(product.cart_product(), 1).await?;
    Ok(Json(cart.summary()))
}

/// Put every saved item the catalog can sell in the cart, one copy each.
///
/// Availability is checked against the catalog, not the wishlist snapshot.
#[instrument(skip(state, session, _auth))]
pub async fn add_all_to_cart(
    State(state): State<AppState>,
    _auth: RequireAuth,
    session: Session,
) -> Result<Json<AddAllResult>> {
    let wishlist = Wishlist::load(&session).await?;
    let mut cart = open_cart(&session).await?;

    let mut added = 0;
    let mut skipped = Vec::new();
    for item in wishlist.items() {
        match purchasable(&state, item.id).await {
            Ok(product) => {
                cart.add_item(product.cart_product(), 1).await?;
                added += 1;
            }
            Err(AppError::NotFound(_) | AppError::BadRequest(_)) => {
                debug!(product_id = %item.id, "Skipping unavailable wishlist item");
                skipped.push(item.id);
            }
            Err(e) => return Err(e),
        }
    }

    info!(added, skipped = skipped.len(), "Wishlist added to cart");
    Ok(Json(AddAllResult {
        added,
        skipped,
        cart: cart.summary(),
    }))
}
