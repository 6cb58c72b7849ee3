//! Admin panel handlers. Every route requires an admin profile.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use lumiere_core::{OrderId, OrderStatus, ProductId};

use crate::admin::{self, AdminProduct, Dashboard, OrderList, OrderQuery, ProductForm};
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::orders::OrderView;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub q: Option<String>,
}

#[instrument(skip_all)]
pub async fn dashboard(State(state): State<AppState>, _admin: RequireAdmin) -> Json<Dashboard> {
    Json(Dashboard::build(state.orders(), state.products()))
}

#[instrument(skip(state, _admin))]
pub async fn orders(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<OrderQuery>,
) -> Json<OrderList> {
    Json(admin::list_orders(state.orders(), &query))
}

#[instrument(skip(state, _admin))]
pub async fn update_order_status(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
    Json(form): Json<StatusForm>,
) -> Result<Json<OrderView>> {
    let order = admin::update_order_status(state.orders(), OrderId::new(id), form.status, Utc::now())?;
    Ok(Json(order.into()))
}

#[instrument(skip(state, _admin))]
pub async fn products(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Query(query): Query<ProductQuery>,
) -> Json<Vec<AdminProduct>> {
    Json(admin::list_products(state.products(), query.q.as_deref()))
}

#[instrument(skip(state, _admin))]
pub async fn create_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<AdminProduct>)> {
    let product = admin::create_product(state.products(), form, Utc::now())?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(state, _admin))]
pub async fn update_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
    Json(form): Json<ProductForm>,
) -> Result<Json<AdminProduct>> {
    Ok(Json(admin::update_product(
        state.products(),
        ProductId::new(id),
        form,
    )?))
}

#[instrument(skip(state, _admin))]
pub async fn toggle_product(
    State(state): State<AppState>,
    _admin: RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<AdminProduct>> {
    Ok(Json(admin::toggle_product(state.products(), ProductId::new(id))?))
}
