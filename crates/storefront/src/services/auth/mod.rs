//! Authentication service.
//!
//! Wraps the backend's auth API with local form validation, user-facing
//! error messages and the per-session [`AuthContext`]. Demo accounts live in
//! [`demo`] and never reach the backend.

mod context;
pub mod demo;
mod error;

pub use context::{AuthContext, AuthSource, AuthStatus};
pub use error::AuthError;

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

use lumiere_core::{UserId, UserRole};

use crate::backend::{
    AuthEvent, AuthEventKind, AuthSession, AuthUser, BackendClient, BackendError, Profile,
    ProfileUpdate, SignUpMetadata,
};
use crate::validation::{self, SignUpFields};

/// Tokens closer than this to expiry are refreshed before use.
const REFRESH_MARGIN_SECS: i64 = 60;

/// Outcome of a sign-up.
#[derive(Debug)]
pub enum SignUpResult {
    /// The account is active and signed in.
    SignedIn(AuthContext),
    /// The backend sent a confirmation email; nobody is signed in yet.
    ConfirmationRequired(AuthUser),
}

/// Authentication service.
pub struct AuthService<'a> {
    backend: &'a BackendClient,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(backend: &'a BackendClient) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Sign in / out
    // =========================================================================

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for an incomplete form and the mapped
    /// backend error otherwise.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthContext, AuthError> {
        validation::sign_in(email, password)?;

        let session = self.backend.sign_in(email.trim(), password).await?;
        let mut ctx = AuthContext::default();
        if ctx.apply_event(&AuthEvent::new(AuthEventKind::SignedIn, Some(session.clone()))) {
            ctx.profile = self.load_profile(&session.user.id, Some(&session)).await;
        }

        info!(user_id = %session.user.id, "User signed in");
        Ok(ctx)
    }

    /// Create an account and its `customer` profile row.
    ///
    /// A failure to create the profile row is logged and does not fail the
    /// sign-up.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for an invalid form and the mapped
    /// backend error otherwise.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn sign_up(&self, form: &SignUpFields<'_>) -> Result<SignUpResult, AuthError> {
        let email = validation::sign_up(form)?;
        let metadata = SignUpMetadata {
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
        };

        let outcome = self
            .backend
            .sign_up(email.as_str(), form.password, &metadata)
            .await?;

        let profile = Profile {
            id: outcome.user.id.clone(),
            email: email.as_str().to_string(),
            first_name: Some(metadata.first_name),
            last_name: Some(metadata.last_name),
            phone: None,
            role: UserRole::Customer,
        };
        let created = match self
            .backend
            .create_profile(&profile, outcome.session.as_ref())
            .await
        {
            Ok(created) => Some(created),
            Err(e) => {
                warn!(error = %e, user_id = %profile.id, "Failed to create profile row");
                None
            }
        };

        info!(user_id = %outcome.user.id, "User signed up");
        Ok(match outcome.session {
            Some(session) => {
                let mut ctx = AuthContext::signed_in(session);
                ctx.profile = created;
                SignUpResult::SignedIn(ctx)
            }
            None => SignUpResult::ConfirmationRequired(outcome.user),
        })
    }

    /// Sign out.
    ///
    /// Local state is always cleared; a backend failure is only logged.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, ctx: &mut AuthContext) {
        if let Some(session) = &ctx.session
            && let Err(e) = self.backend.sign_out(session).await
        {
            warn!(error = %e, "Backend sign-out failed, clearing local session anyway");
        }
        ctx.apply_event(&AuthEvent::signed_out());
    }

    // =========================================================================
    // Passwords
    // =========================================================================

    /// Send a password reset email.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` for a missing or malformed email and
    /// the mapped backend error otherwise.
    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthError> {
        let email = validation::reset_password(email)?;
        self.backend.reset_password(email.as_str()).await?;
        Ok(())
    }

    /// Sign in with the token from a reset email so a new password can be set.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn verify_recovery(&self, token_hash: &str) -> Result<AuthContext, AuthError> {
        validation::require("token_hash", token_hash)?;
        let session = self.backend.verify_recovery(token_hash).await?;
        let mut ctx = AuthContext::signed_in(session.clone());
        ctx.profile = self.load_profile(&session.user.id, Some(&session)).await;
        Ok(ctx)
    }

    /// Set a new password for the signed-in backend user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotConnected` without a backend session,
    /// `AuthError::Validation` for a short or mismatched password, and the
    /// mapped backend error otherwise.
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        ctx: &mut AuthContext,
        password: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        let session = ctx.session.clone().ok_or(AuthError::NotConnected)?;
        validation::new_password(password, confirm)?;

        let user = self.backend.update_password(&session, password).await?;
        ctx.user = Some(user);
        Ok(())
    }

    // =========================================================================
    // Profile
    // =========================================================================

    /// Update the signed-in user's profile.
    ///
    /// Demo accounts are updated in the session only.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotConnected` without a signed-in user and the
    /// mapped backend error otherwise.
    #[instrument(skip_all)]
    pub async fn update_profile(
        &self,
        ctx: &mut AuthContext,
        update: &ProfileUpdate,
    ) -> Result<Option<Profile>, AuthError> {
        let user_id = ctx.user_id().cloned().ok_or(AuthError::NotConnected)?;

        if ctx.source == AuthSource::Demo {
            ctx.apply_profile_update(update);
            return Ok(ctx.profile.clone());
        }

        let profile = self
            .backend
            .update_profile(&user_id, update, ctx.session.as_ref())
            .await?;
        ctx.profile = Some(profile.clone());
        Ok(Some(profile))
    }

    /// Fetch a profile row.
    ///
    /// A missing row is normal for accounts created elsewhere; other
    /// failures are logged. Both yield `None`.
    pub async fn load_profile(
        &self,
        user_id: &UserId,
        session: Option<&AuthSession>,
    ) -> Option<Profile> {
        match self.backend.get_profile(user_id, session).await {
            Ok(profile) => Some(profile),
            Err(BackendError::NotFound(_)) => None,
            Err(e) => {
                warn!(error = %e, user_id = %user_id, "Failed to load profile");
                None
            }
        }
    }

    // =========================================================================
    // Tokens
    // =========================================================================

    /// Refresh the access token if it is about to expire.
    ///
    /// Returns `true` if the context changed and must be saved.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error if the refresh token was rejected.
    pub async fn ensure_fresh(&self, ctx: &mut AuthContext) -> Result<bool, AuthError> {
        let Some(session) = &ctx.session else {
            return Ok(false);
        };
        if !session.expires_within(Utc::now(), Duration::seconds(REFRESH_MARGIN_SECS)) {
            return Ok(false);
        }

        let refreshed = self.backend.refresh_session(session).await?;
        if ctx.apply_event(&AuthEvent::new(AuthEventKind::TokenRefreshed, Some(refreshed.clone())))
        {
            ctx.profile = self.load_profile(&refreshed.user.id, Some(&refreshed)).await;
        }
        Ok(true)
    }

    /// Reload the user and profile of a backend session.
    ///
    /// Returns `false` for contexts without a backend session.
    ///
    /// # Errors
    ///
    /// Returns the mapped backend error if the token is rejected.
    pub async fn reload_user(&self, ctx: &mut AuthContext) -> Result<bool, AuthError> {
        let Some(session) = ctx.session.as_mut() else {
            return Ok(false);
        };
        let user = self.backend.get_user(session).await?;
        session.user = user.clone();
        ctx.profile = self.load_profile(&user.id, Some(&*session)).await;
        ctx.user = Some(user);
        Ok(true)
    }
}
