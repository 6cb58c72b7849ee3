//! Checkout wizard handlers.
//!
//! The wizard state is kept in the session between steps. Every step
//! requires a signed-in user.

use axum::{Json, extract::State};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::routes::cart::open_cart;
use crate::services::AuthContext;
use crate::services::checkout::{
    CheckoutError, CheckoutState, CheckoutStep, CheckoutView, OrderConfirmation, PaymentInfo,
    ShippingInfo,
};
use crate::state::AppState;

/// The stored wizard, restarted when missing or when a new cart follows a
/// confirmed order.
async fn current_state(
    session: &Session,
    ctx: &AuthContext,
    cart_is_empty: bool,
) -> Result<CheckoutState> {
    Ok(match CheckoutState::load(session).await? {
        Some(state) if state.step != CheckoutStep::Confirmation || cart_is_empty => state,
        _ => CheckoutState::start(ctx),
    })
}

/// Current step with the cart summary.
#[instrument(skip_all)]
pub async fn show(RequireAuth(ctx): RequireAuth, session: Session) -> Result<Json<CheckoutView>> {
    let cart = open_cart(&session).await?;
    let state = current_state(&session, &ctx, cart.cart().is_empty()).await?;
    state.save(&session).await?;
    Ok(Json(CheckoutView::new(&state, cart.summary())))
}

/// Step 1 → 2.
#[instrument(skip_all)]
pub async fn shipping(
    RequireAuth(ctx): RequireAuth,
    session: Session,
    Json(info): Json<ShippingInfo>,
) -> Result<Json<CheckoutView>> {
    let cart = open_cart(&session).await?;
    if cart.cart().is_empty() {
        return Err(CheckoutError::EmptyCart.into());
    }

    let mut state = current_state(&session, &ctx, false).await?;
    state.submit_shipping(info)?;
    state.save(&session).await?;
    Ok(Json(CheckoutView::new(&state, cart.summary())))
}

/// Step 2 → 1.
#[instrument(skip_all)]
pub async fn back(RequireAuth(ctx): RequireAuth, session: Session) -> Result<Json<CheckoutView>> {
    let cart = open_cart(&session).await?;
    let mut state = current_state(&session, &ctx, cart.cart().is_empty()).await?;
    state.back()?;
    state.save(&session).await?;
    Ok(Json(CheckoutView::new(&state, cart.summary())))
}

/// Step 2 → 3: pay, record the order, empty the cart.
///
/// Card details are validated and then dropped; they are never stored or
/// logged.
#[instrument(skip_all)]
pub async fn payment(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    session: Session,
    Json(payment): Json<PaymentInfo>,
) -> Result<Json<OrderConfirmation>> {
    let mut cart = open_cart(&session).await?;
    let mut wizard = current_state(&session, &ctx, cart.cart().is_empty()).await?;

    let confirmation = state
        .checkout()
        .place_order(&ctx, &mut wizard, &mut cart, &payment)
        .await?;

    wizard.save(&session).await?;
    Ok(Json(confirmation))
}
