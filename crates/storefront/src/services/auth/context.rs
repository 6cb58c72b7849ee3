//! Per-session auth state.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use lumiere_core::{UserId, UserRole};

use crate::backend::{AuthEvent, AuthSession, AuthUser, Profile, ProfileUpdate};
use crate::models::session_keys;

/// Where the signed-in identity came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthSource {
    #[default]
    Backend,
    /// A demo account; there are no tokens.
    Demo,
}

/// The current user, their tokens and their profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user: Option<AuthUser>,
    pub session: Option<AuthSession>,
    pub profile: Option<Profile>,
    #[serde(default)]
    pub source: AuthSource,
}

impl AuthContext {
    /// Context for a freshly signed-in backend user.
    #[must_use]
    pub fn signed_in(session: AuthSession) -> Self {
        Self {
            user: Some(session.user.clone()),
            session: Some(session),
            profile: None,
            source: AuthSource::Backend,
        }
    }

    /// Backend users need a session; demo users only a user.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        match self.source {
            AuthSource::Backend => self.user.is_some() && self.session.is_some(),
            AuthSource::Demo => self.user.is_some(),
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.profile
            .as_ref()
            .is_some_and(|profile| profile.role == UserRole::Admin)
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|user| &user.id)
    }

    /// Email from the profile, falling back to the auth user.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.profile
            .as_ref()
            .map(|profile| profile.email.as_str())
            .or_else(|| self.user.as_ref().and_then(|user| user.email.as_deref()))
    }

    /// Apply an auth state change.
    ///
    /// An event with a session signs that user in; one without signs
    /// everyone out. Returns `true` when the profile must be (re)loaded.
    pub fn apply_event(&mut self, event: &AuthEvent) -> bool {
        match &event.session {
            Some(session) => {
                let same_user = self.user_id() == Some(&session.user.id);
                self.user = Some(session.user.clone());
                self.session = Some(session.clone());
                self.source = AuthSource::Backend;
                if !same_user {
                    self.profile = None;
                }
                !same_user || self.profile.is_none()
            }
            None => {
                *self = Self::default();
                false
            }
        }
    }

    /// Merge a profile update into the cached profile.
    pub fn apply_profile_update(&mut self, update: &ProfileUpdate) {
        if let Some(profile) = self.profile.as_mut() {
            if let Some(first_name) = &update.first_name {
                profile.first_name = Some(first_name.clone());
            }
            if let Some(last_name) = &update.last_name {
                profile.last_name = Some(last_name.clone());
            }
            if let Some(phone) = &update.phone {
                profile.phone = Some(phone.clone());
            }
        }
    }

    /// Read the context from the session; a missing entry is signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub async fn load(session: &Session) -> Result<Self, tower_sessions::session::Error> {
        Ok(session
            .get::<Self>(session_keys::AUTH_CONTEXT)
            .await?
            .unwrap_or_default())
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self, session: &Session) -> Result<(), tower_sessions::session::Error> {
        session.insert(session_keys::AUTH_CONTEXT, self).await
    }

    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn clear(session: &Session) -> Result<(), tower_sessions::session::Error> {
        session
            .remove::<Self>(session_keys::AUTH_CONTEXT)
            .await
            .map(|_| ())
    }
}

/// What `GET /auth/me` returns.
#[derive(Debug, Clone, Serialize)]
pub struct AuthStatus {
    pub is_authenticated: bool,
    pub is_admin: bool,
    pub user: Option<AuthUser>,
    pub profile: Option<Profile>,
    pub source: Option<AuthSource>,
}

impl From<&AuthContext> for AuthStatus {
    fn from(ctx: &AuthContext) -> Self {
        let is_authenticated = ctx.is_authenticated();
        Self {
            is_authenticated,
            is_admin: ctx.is_admin(),
            user: ctx.user.clone(),
            profile: ctx.profile.clone(),
            source: is_authenticated.then_some(ctx.source),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::backend::AuthEventKind;

    fn session_for(id: &str) -> AuthSession {
        AuthSession::new(
            "access".to_string(),
            "refresh".to_string(),
            Utc::now() + Duration::hours(1),
            AuthUser {
                id: UserId::new(id),
                email: Some(format!("{id}@example.fr")),
            },
        )
    }

    fn profile_for(id: &str, role: UserRole) -> Profile {
        Profile {
            id: UserId::new(id),
            email: format!("{id}@example.fr"),
            first_name: Some("Prénom".to_string()),
            last_name: None,
            phone: None,
            role,
        }
    }

    #[test]
    fn test_backend_context_needs_user_and_session() {
        let mut ctx = AuthContext::signed_in(session_for("u1"));
        assert!(ctx.is_authenticated());
        ctx.session = None;
        assert!(!ctx.is_authenticated());
        assert!(!AuthContext::default().is_authenticated());
    }

    #[test]
    fn test_is_admin_follows_profile_role() {
        let mut ctx = AuthContext::signed_in(session_for("u1"));
        assert!(!ctx.is_admin());
        ctx.profile = Some(profile_for("u1", UserRole::Admin));
        assert!(ctx.is_admin());
        ctx.profile = Some(profile_for("u1", UserRole::Vendor));
        assert!(!ctx.is_admin());
    }

    #[test]
    fn test_event_with_session_signs_in() {
        let mut ctx = AuthContext::default();
        let event = AuthEvent::new(AuthEventKind::SignedIn, Some(session_for("u1")));
        assert!(ctx.apply_event(&event));
        assert!(ctx.is_authenticated());
        assert_eq!(ctx.email(), Some("u1@example.fr"));
    }

    #[test]
    fn test_refresh_keeps_profile_of_same_user() {
        let mut ctx = AuthContext::signed_in(session_for("u1"));
        ctx.profile = Some(profile_for("u1", UserRole::Customer));

        let refreshed = AuthEvent::new(AuthEventKind::TokenRefreshed, Some(session_for("u1")));
        assert!(!ctx.apply_event(&refreshed));
        assert!(ctx.profile.is_some());

        let other = AuthEvent::new(AuthEventKind::SignedIn, Some(session_for("u2")));
        assert!(ctx.apply_event(&other));
        assert!(ctx.profile.is_none());
    }

    #[test]
    fn test_event_without_session_clears_everything() {
        let mut ctx = AuthContext::signed_in(session_for("u1"));
        ctx.profile = Some(profile_for("u1", UserRole::Admin));
        assert!(!ctx.apply_event(&AuthEvent::signed_out()));
        assert_eq!(ctx, AuthContext::default());
    }

    #[test]
    fn test_profile_update_merges() {
        let mut ctx = AuthContext::signed_in(session_for("u1"));
        ctx.profile = Some(profile_for("u1", UserRole::Customer));
        ctx.apply_profile_update(&ProfileUpdate {
            last_name: Some("Nom".to_string()),
            ..ProfileUpdate::default()
        });
        let profile = ctx.profile.unwrap_or_else(|| profile_for("x", UserRole::Customer));
        assert_eq!(profile.display_name(), "Prénom Nom");
    }
}
