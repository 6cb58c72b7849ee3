//! Product, category and review handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use lumiere_core::ProductId;

use crate::backend::{Category, NewReview, Review};
use crate::catalog::{Product, StockStatus};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::AuthError;
use crate::state::AppState;
use crate::validation::ValidationError;

/// A product with its computed display fields.
#[derive(Debug, Clone, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub display_price: String,
    pub in_stock: bool,
    pub on_sale: bool,
    pub stock_status: StockStatus,
    pub stock_label: &'static str,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let stock_status = product.stock_status();
        Self {
            display_price: product.display_price().to_string(),
            in_stock: product.in_stock(),
            on_sale: product.is_on_sale(),
            stock_status,
            stock_label: stock_status.label(),
            product,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductList {
    pub total: usize,
    pub products: Vec<ProductView>,
}

/// List the active catalog.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<ProductList> {
    let products: Vec<ProductView> = state
        .catalog()
        .products()
        .await
        .into_iter()
        .map(ProductView::from)
        .collect();

    Json(ProductList {
        total: products.len(),
        products,
    })
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<ProductView>> {
    state
        .catalog()
        .product(ProductId::new(id))
        .await
        .map(|product| Json(product.into()))
        .ok_or_else(|| AppError::NotFound(format!("livre {id}")))
}

#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Json<Vec<Category>> {
    Json(state.catalog().categories().await)
}

/// Approved reviews of a product. The demo catalog has none.
#[instrument(skip(state))]
pub async fn reviews(State(state): State<AppState>, Path(id): Path<i32>) -> Result<Json<Vec<Review>>> {
    if state.auth_mode().is_demo() {
        return Ok(Json(Vec::new()));
    }
    Ok(Json(
        state.backend().get_product_reviews(ProductId::new(id)).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Submit a review. It stays hidden until approved.
#[instrument(skip(state, ctx, form))]
pub async fn create_review(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<i32>,
    Json(form): Json<ReviewForm>,
) -> Result<(StatusCode, Json<Review>)> {
    if state.auth_mode().is_demo() {
        return Err(AppError::Unavailable(
            "Les avis ne sont pas disponibles en mode démo".to_string(),
        ));
    }
    if !(1..=5).contains(&form.rating) {
        return Err(ValidationError::Invalid {
            field: "rating",
            reason: "la note doit être comprise entre 1 et 5".to_string(),
        }
        .into());
    }
    let session = ctx.session.as_ref().ok_or(AuthError::NotConnected)?;

    let review = NewReview {
        product_id: Some(ProductId::new(id)),
        user_id: ctx.user_id().cloned(),
        rating: form.rating,
        title: form.title.filter(|t| !t.trim().is_empty()),
        comment: form.comment.filter(|c| !c.trim().is_empty()),
    };
    let created = state.backend().create_review(&review, session).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
