//! Account handlers: profile, password and saved addresses.
//!
//! Password changes and addresses need the backend; in demo mode they
//! respond 503.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{instrument, warn};

use lumiere_core::AddressId;

use crate::backend::{Address, AddressUpdate, AuthSession, NewAddress, Profile, ProfileUpdate};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::auth::MessageResponse;
use crate::services::AuthContext;
use crate::state::AppState;
use crate::validation;

#[derive(Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Backend session of a signed-in backend user.
fn backend_session<'a>(state: &AppState, ctx: &'a AuthContext) -> Result<&'a AuthSession> {
    if state.auth_mode().is_demo() {
        return Err(AppError::Unavailable(
            "Fonction indisponible en mode démo".to_string(),
        ));
    }
    ctx.session
        .as_ref()
        .ok_or_else(|| AppError::Unauthorized("Vous devez être connecté".to_string()))
}

/// The stored profile, reloaded from the backend in backend mode.
#[instrument(skip_all)]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(mut ctx): RequireAuth,
    session: Session,
) -> Result<Json<Profile>> {
    match state.auth().reload_user(&mut ctx).await {
        Ok(true) => ctx.save(&session).await?,
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Failed to reload user, using stored profile"),
    }
    ctx.profile
        .map(Json)
        .ok_or_else(|| AppError::NotFound("profil".to_string()))
}

#[instrument(skip_all)]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(mut ctx): RequireAuth,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Option<Profile>>> {
    let profile = state.auth().update_profile(&mut ctx, &update).await?;
    ctx.save(&session).await?;
    Ok(Json(profile))
}

#[instrument(skip_all)]
pub async fn update_password(
    State(state): State<AppState>,
    RequireAuth(mut ctx): RequireAuth,
    session: Session,
    Json(form): Json<PasswordForm>,
) -> Result<Json<MessageResponse>> {
    backend_session(&state, &ctx)?;
    state
        .auth()
        .update_password(&mut ctx, &form.password, &form.confirm_password)
        .await?;
    ctx.save(&session).await?;
    Ok(Json(MessageResponse {
        message: "Mot de passe mis à jour",
    }))
}

#[instrument(skip_all)]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    let session = backend_session(&state, &ctx)?;
    let user_id = &session.user.id;
    Ok(Json(
        state
            .backend()
            .get_user_addresses(user_id, Some(session))
            .await?,
    ))
}

#[instrument(skip_all)]
pub async fn create_address(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Json(mut address): Json<NewAddress>,
) -> Result<(StatusCode, Json<Address>)> {
    let session = backend_session(&state, &ctx)?;
    validation::require_all(&[
        &address.first_name,
        &address.last_name,
        &address.street,
        &address.city,
        &address.postal_code,
    ])?;

    address.user_id = Some(session.user.id.clone());
    let created = state
        .backend()
        .create_address(&address, Some(session))
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[instrument(skip(state, ctx, update))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<i32>,
    Json(update): Json<AddressUpdate>,
) -> Result<Json<Address>> {
    let session = backend_session(&state, &ctx)?;
    Ok(Json(
        state
            .backend()
            .update_address(AddressId::new(id), &update, Some(session))
            .await?,
    ))
}

#[instrument(skip(state, ctx))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(ctx): RequireAuth,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let session = backend_session(&state, &ctx)?;
    state
        .backend()
        .delete_address(AddressId::new(id), Some(session))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
