//! Order history handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use tracing::{info, instrument, warn};

use lumiere_core::{OrderStatus, UserId};

use crate::backend::BackendError;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::orders::{CustomerContact, Order, OrderError, OrderView};
use crate::services::AuthContext;
use crate::state::AppState;

/// Backend order rows carry no customer name; it comes from the profile.
fn contact_of(ctx: &AuthContext) -> CustomerContact {
    let profile = ctx.profile.as_ref();
    CustomerContact {
        first_name: profile
            .and_then(|p| p.first_name.clone())
            .unwrap_or_default(),
        last_name: profile.and_then(|p| p.last_name.clone()).unwrap_or_default(),
        email: ctx.email().unwrap_or_default().to_string(),
    }
}

fn require_user(ctx: &AuthContext) -> Result<&UserId> {
    ctx.user_id()
        .ok_or_else(|| AppError::Unauthorized("Vous devez être connecté".to_string()))
}

/// The user's orders, newest first.
///
/// Backend mode reads the backend and adds the orders kept in the in-memory
/// order book after a failed `create_order` call. Demo mode, or a backend
/// failure, reads the order book alone.
async fn user_orders(state: &AppState, ctx: &AuthContext) -> Result<Vec<Order>> {
    let user_id = require_user(ctx)?;
    let local = state.orders().for_user(user_id);

    if !state.auth_mode().is_demo()
        && let Some(session) = &ctx.session
    {
        match state.backend().get_user_orders(user_id, Some(session)).await {
            Ok(rows) => {
                let contact = contact_of(ctx);
                let mut orders: Vec<Order> = rows
                    .into_iter()
                    .map(|row| Order::from_row(row, contact.clone()))
                    .collect();
                let kept: Vec<Order> = local
                    .into_iter()
                    .filter(|l| !orders.iter().any(|o| o.order_number == l.order_number))
                    .collect();
                orders.extend(kept);
                orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                return Ok(orders);
            }
            Err(e) => warn!(error = %e, "Failed to load orders, using local order book"),
        }
    }

    Ok(local)
}

/// Whether the order lives in the in-memory order book rather than the backend.
fn is_local(state: &AppState, user_id: &UserId, order: &Order) -> bool {
    state
        .orders()
        .find_for_user(user_id, &order.order_number)
        .is_some()
}

#[instrument(skip_all)]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<Vec<OrderView>>> {
    let orders = user_orders(&state, &ctx).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// Backend mode reloads the order with full product rows; any failure keeps
/// the row from the list.
async fn order_detail(state: &AppState, ctx: &AuthContext, order: Order) -> Order {
    if state.auth_mode().is_demo() || is_local(state, &order.user_id, &order) {
        return order;
    }
    let Some(session) = &ctx.session else {
        return order;
    };
    match state.backend().get_order(order.id, Some(session)).await {
        Ok(row) => Order::from_row(row, contact_of(ctx)),
        Err(e) => {
            warn!(error = %e, order_id = %order.id, "Failed to load order detail");
            order
        }
    }
}

#[instrument(skip(state, ctx))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(number): Path<String>,
) -> Result<Json<OrderView>> {
    let order = user_orders(&state, &ctx)
        .await?
        .into_iter()
        .find(|order| order.order_number == number)
        .ok_or_else(|| AppError::NotFound(format!("commande {number}")))?;
    Ok(Json(order_detail(&state, &ctx, order).await.into()))
}

/// Cancel one of the user's pending orders.
///
/// Orders the backend holds are cancelled there; orders kept in the order
/// book are cancelled locally.
#[instrument(skip(state, ctx))]
pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(number): Path<String>,
) -> Result<Json<OrderView>> {
    let user_id = require_user(&ctx)?;
    let order = user_orders(&state, &ctx)
        .await?
        .into_iter()
        .find(|order| order.order_number == number)
        .ok_or_else(|| AppError::NotFound(format!("commande {number}")))?;

    if state.auth_mode().is_demo() || is_local(&state, user_id, &order) {
        let order = state.orders().cancel(user_id, &number, Utc::now())?;
        return Ok(Json(order.into()));
    }

    let session = ctx
        .session
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Vous devez être connecté".to_string()))?;
    if !order.status.is_cancellable_by_customer() {
        return Err(OrderError::NotCancellable(order.status).into());
    }

    match state.backend().cancel_order(order.id, user_id, session).await {
        Ok(row) => {
            info!(order_number = %number, "Order cancelled");
            Ok(Json(Order::from_row(row, contact_of(&ctx)).into()))
        }
        // Moved past pending between the read and the update
        Err(BackendError::NotFound(_)) => {
            Err(OrderError::NotCancellable(OrderStatus::Processing).into())
        }
        Err(e) => Err(e.into()),
    }
}
