//! Client for the hosted auth/database service.
//!
//! # Architecture
//!
//! - GoTrue-style auth API under `/auth/v1`
//! - PostgREST-style table API under `/rest/v1`
//! - Every call returns `Result<T, BackendError>`; nothing is retried
//! - Product and category reads are cached with `moka` (5 minute TTL)
//! - Auth state changes are broadcast as [`AuthEvent`]s
//!
//! # Example
//!
//! ```rust,ignore
//! use lumiere_storefront::backend::BackendClient;
//!
//! let client = BackendClient::new(&config.backend);
//! let session = client.sign_in("client@email.com", "hunter22").await?;
//! let orders = client.get_user_orders(&session.user.id, Some(&session)).await?;
//! ```

mod auth;
mod cache;
mod client;
mod tables;
pub mod types;

pub use client::BackendClient;
pub use types::*;

use thiserror::Error;

/// PostgREST error code for "the result contains 0 rows" on single-row reads.
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Building a request URL failed.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// The backend rejected the request.
    #[error("{message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// Single-row read found nothing.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

impl BackendError {
    /// The message the backend sent, when it sent one.
    #[must_use]
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Kind of auth state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEventKind {
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
    PasswordRecovery,
}

/// An auth state change, published by [`BackendClient`] after auth calls.
///
/// Subscribers treat an event carrying a session as "signed in as this user"
/// and an event without one as "signed out".
#[derive(Debug, Clone)]
pub struct AuthEvent {
    pub kind: AuthEventKind,
    pub session: Option<AuthSession>,
}

impl AuthEvent {
    #[must_use]
    pub const fn new(kind: AuthEventKind, session: Option<AuthSession>) -> Self {
        Self { kind, session }
    }

    #[must_use]
    pub const fn signed_out() -> Self {
        Self::new(AuthEventKind::SignedOut, None)
    }
}
