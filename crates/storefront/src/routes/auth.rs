//! Authentication handlers.
//!
//! Backend mode exposes sign-in, sign-up, password reset and recovery; demo
//! mode exposes the two demo accounts instead. Sign-out and `/auth/me` exist
//! in both.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::OptionalAuth;
use crate::models::session_keys;
use crate::services::auth::{AuthContext, AuthStatus, SignUpResult, demo};
use crate::services::checkout::CheckoutState;
use crate::state::AppState;
use crate::validation::SignUpFields;
use crate::wishlist::Wishlist;

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub accept_terms: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RecoverForm {
    #[serde(default)]
    pub token_hash: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Store a freshly signed-in context under a new session id.
async fn start_session(session: &Session, ctx: &AuthContext) -> Result<()> {
    session.cycle_id().await?;
    ctx.save(session).await?;
    if let Some(user_id) = ctx.user_id() {
        set_sentry_user(user_id, ctx.email());
    }
    Ok(())
}

/// Who is signed in.
#[instrument(skip_all)]
pub async fn me(OptionalAuth(ctx): OptionalAuth) -> Json<AuthStatus> {
    Json(AuthStatus::from(&ctx))
}

#[instrument(skip_all, fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<LoginForm>,
) -> Result<Json<AuthStatus>> {
    let ctx = state.auth().sign_in(&form.email, &form.password).await?;
    start_session(&session, &ctx).await?;
    Ok(Json(AuthStatus::from(&ctx)))
}

/// Create an account.
///
/// Responds 201 when the account is signed in right away and 202 when the
/// backend sent a confirmation email first.
#[instrument(skip_all, fields(email = %form.email))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<SignUpForm>,
) -> Result<Response> {
    let fields = SignUpFields {
        email: &form.email,
        password: &form.password,
        confirm_password: &form.confirm_password,
        first_name: &form.first_name,
        last_name: &form.last_name,
        accept_terms: form.accept_terms,
    };

    match state.auth().sign_up(&fields).await? {
        SignUpResult::SignedIn(ctx) => {
            start_session(&session, &ctx).await?;
            Ok((StatusCode::CREATED, Json(AuthStatus::from(&ctx))).into_response())
        }
        SignUpResult::ConfirmationRequired(_) => Ok((
            StatusCode::ACCEPTED,
            Json(MessageResponse {
                message: "Vérifiez votre email pour confirmer votre compte",
            }),
        )
            .into_response()),
    }
}

/// Sign out and drop the per-user session state.
///
/// The cart is kept.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(mut ctx): OptionalAuth,
) -> Result<Json<AuthStatus>> {
    state.auth().sign_out(&mut ctx).await;

    AuthContext::clear(&session).await?;
    session.remove::<Wishlist>(session_keys::WISHLIST).await?;
    session
        .remove::<CheckoutState>(session_keys::CHECKOUT)
        .await?;
    clear_sentry_user();

    info!("User signed out");
    Ok(Json(AuthStatus::from(&ctx)))
}

/// Send a password reset email.
#[instrument(skip(state))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(form): Json<ResetPasswordForm>,
) -> Result<Json<MessageResponse>> {
    state.auth().reset_password(&form.email).await?;
    Ok(Json(MessageResponse {
        message: "Un email de réinitialisation a été envoyé",
    }))
}

/// Sign in with the token of a reset email so a new password can be set.
#[instrument(skip_all)]
pub async fn recover(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<RecoverForm>,
) -> Result<Json<AuthStatus>> {
    let ctx = state.auth().verify_recovery(&form.token_hash).await?;
    start_session(&session, &ctx).await?;
    Ok(Json(AuthStatus::from(&ctx)))
}

async fn demo_sign_in(state: &AppState, session: &Session, ctx: AuthContext) -> Result<Json<AuthStatus>> {
    start_session(session, &ctx).await?;
    Wishlist::demo(&state.products().all())
        .save(session)
        .await?;
    info!(user_id = ?ctx.user_id(), "Demo account signed in");
    Ok(Json(AuthStatus::from(&ctx)))
}

#[instrument(skip_all)]
pub async fn demo_admin(State(state): State<AppState>, session: Session) -> Result<Json<AuthStatus>> {
    demo_sign_in(&state, &session, demo::sign_in_as_admin()).await
}

#[instrument(skip_all)]
pub async fn demo_customer(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<AuthStatus>> {
    demo_sign_in(&state, &session, demo::sign_in_as_customer()).await
}
