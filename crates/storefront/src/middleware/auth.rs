//! Authentication extractors.
//!
//! The [`AuthContext`] is read from the session on every request. Backend
//! tokens close to expiry are refreshed here, so handlers always see a
//! usable access token; a rejected refresh signs the user out.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;
use tracing::warn;

use crate::error::{AppError, clear_sentry_user};
use crate::services::AuthContext;
use crate::services::auth::AuthSource;
use crate::state::AppState;

/// Session from the request extensions (set by `SessionManagerLayer`).
fn session(parts: &Parts) -> Result<Session, AppError> {
    parts
        .extensions
        .get::<Session>()
        .cloned()
        .ok_or_else(|| AppError::Internal("session layer missing".to_string()))
}

/// Load the auth context and refresh its tokens if needed.
async fn load_context(parts: &Parts, state: &AppState) -> Result<AuthContext, AppError> {
    let session = session(parts)?;
    let mut ctx = AuthContext::load(&session).await?;

    // Demo accounts carry no token, so they only count while the demo is on.
    if ctx.source == AuthSource::Demo && !state.auth_mode().is_demo() {
        warn!("Demo session presented outside demo mode, signing out");
        AuthContext::clear(&session).await?;
        clear_sentry_user();
        return Ok(AuthContext::default());
    }

    match state.auth().ensure_fresh(&mut ctx).await {
        Ok(true) => ctx.save(&session).await?,
        Ok(false) => {}
        Err(e) => {
            warn!(error = %e, "Token refresh failed, signing out");
            AuthContext::clear(&session).await?;
            clear_sentry_user();
            ctx = AuthContext::default();
        }
    }

    Ok(ctx)
}

/// Auth context of the request, signed in or not.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(OptionalAuth(ctx): OptionalAuth) -> impl IntoResponse {
///     if ctx.is_authenticated() { "Bonjour !" } else { "Bienvenue !" }
/// }
/// ```
pub struct OptionalAuth(pub AuthContext);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        load_context(parts, state).await.map(Self)
    }
}

/// Extractor that requires a signed-in user; responds 401 otherwise.
pub struct RequireAuth(pub AuthContext);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ctx = load_context(parts, state).await?;
        if !ctx.is_authenticated() {
            return Err(AppError::Unauthorized(
                "Vous devez être connecté".to_string(),
            ));
        }
        Ok(Self(ctx))
    }
}

/// Extractor that requires an admin profile; 401 when signed out, 403 for
/// other roles.
pub struct RequireAdmin(pub AuthContext);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(ctx) = RequireAuth::from_request_parts(parts, state).await?;
        if !ctx.is_admin() {
            return Err(AppError::Forbidden(
                "Accès réservé aux administrateurs".to_string(),
            ));
        }
        Ok(Self(ctx))
    }
}
