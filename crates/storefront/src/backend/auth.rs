//! Auth API calls (`/auth/v1`).
//!
//! Each successful call that changes who is signed in publishes an
//! [`AuthEvent`] on the client's broadcast channel.

use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::instrument;

use super::client::BackendClient;
use super::types::{
    AuthSession, AuthUser, SignUpMetadata, SignUpOutcome, SignUpResponse, TokenResponse,
};
use super::{AuthEvent, AuthEventKind, BackendError};

impl BackendClient {
    /// Create an account.
    ///
    /// When the backend requires email confirmation the outcome carries no
    /// session and no event is published.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (e.g. "User already registered").
    #[instrument(skip(self, password, metadata))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        metadata: &SignUpMetadata,
    ) -> Result<SignUpOutcome, BackendError> {
        let url = self.auth_url("signup")?;
        let request = self.request(Method::POST, url, None).json(&json!({
            "email": email,
            "password": password,
            "data": metadata,
        }));

        let outcome = match self.execute::<SignUpResponse>(request).await? {
            SignUpResponse::Session(token) => {
                let session = token.into_session(Utc::now());
                self.publish(AuthEvent::new(AuthEventKind::SignedIn, Some(session.clone())));
                SignUpOutcome {
                    user: session.user.clone(),
                    session: Some(session),
                }
            }
            SignUpResponse::User(user) => SignUpOutcome {
                user,
                session: None,
            },
        };

        Ok(outcome)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (e.g. "Invalid login credentials").
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, BackendError> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let request = self
            .request(Method::POST, url, None)
            .json(&json!({ "email": email, "password": password }));

        let token: TokenResponse = self.execute(request).await?;
        let session = token.into_session(Utc::now());
        self.publish(AuthEvent::new(AuthEventKind::SignedIn, Some(session.clone())));
        Ok(session)
    }

    /// Revoke the session's refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the call.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, session: &AuthSession) -> Result<(), BackendError> {
        let url = self.auth_url("logout")?;
        let request = self.request(Method::POST, url, Some(session.access_token()));
        self.execute_empty(request).await?;
        self.publish(AuthEvent::signed_out());
        Ok(())
    }

    /// Fetch the user the access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn get_user(&self, session: &AuthSession) -> Result<AuthUser, BackendError> {
        let url = self.auth_url("user")?;
        let request = self.request(Method::GET, url, Some(session.access_token()));
        self.execute(request).await
    }

    /// Exchange the refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns an error if the refresh token was revoked or already used.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, session: &AuthSession) -> Result<AuthSession, BackendError> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");
        let request = self
            .request(Method::POST, url, None)
            .json(&json!({ "refresh_token": session.refresh_token() }));

        let token: TokenResponse = self.execute(request).await?;
        let refreshed = token.into_session(Utc::now());
        self.publish(AuthEvent::new(
            AuthEventKind::TokenRefreshed,
            Some(refreshed.clone()),
        ));
        Ok(refreshed)
    }

    /// Send a password reset email.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the call.
    #[instrument(skip(self))]
    pub async fn reset_password(&self, email: &str) -> Result<(), BackendError> {
        let url = self.auth_url("recover")?;
        let request = self
            .request(Method::POST, url, None)
            .json(&json!({ "email": email }));
        self.execute_empty(request).await
    }

    /// Verify the token from a password reset email, signing the user in so
    /// they can choose a new password.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn verify_recovery(&self, token_hash: &str) -> Result<AuthSession, BackendError> {
        let url = self.auth_url("verify")?;
        let request = self
            .request(Method::POST, url, None)
            .json(&json!({ "type": "recovery", "token_hash": token_hash }));

        let token: TokenResponse = self.execute(request).await?;
        let session = token.into_session(Utc::now());
        self.publish(AuthEvent::new(
            AuthEventKind::PasswordRecovery,
            Some(session.clone()),
        ));
        Ok(session)
    }

    /// Set a new password for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns the backend's rejection (e.g. "Password should be at least 6 characters").
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        session: &AuthSession,
        password: &str,
    ) -> Result<AuthUser, BackendError> {
        let url = self.auth_url("user")?;
        let request = self
            .request(Method::PUT, url, Some(session.access_token()))
            .json(&json!({ "password": password }));

        let user: AuthUser = self.execute(request).await?;
        let mut updated = session.clone();
        updated.user = user.clone();
        self.publish(AuthEvent::new(AuthEventKind::UserUpdated, Some(updated)));
        Ok(user)
    }
}
