//! Authentication error types.

use thiserror::Error;

use crate::backend::BackendError;
use crate::validation::ValidationError;

/// Errors that can occur during authentication operations.
///
/// The `Display` text is shown to the user.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password.
    #[error("Email ou mot de passe incorrect")]
    InvalidCredentials,

    /// The account exists but its email was never confirmed.
    #[error("Veuillez confirmer votre email avant de vous connecter")]
    EmailNotConfirmed,

    /// An account already uses this email.
    #[error("Un compte existe déjà avec cette adresse email")]
    UserAlreadyExists,

    /// The backend rejected the password.
    #[error("Le mot de passe doit contenir au moins 6 caractères")]
    WeakPassword,

    /// A form failed local validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The action needs a signed-in user.
    #[error("Vous devez être connecté")]
    NotConnected,

    /// Any other backend failure; its message is surfaced as-is.
    #[error("{0}")]
    Backend(BackendError),

    /// Session state missing or invalid.
    #[error("invalid session state")]
    InvalidSessionState,
}

impl AuthError {
    /// Map a backend error to a user-facing auth error by its message.
    #[must_use]
    pub fn from_backend(err: BackendError) -> Self {
        let message = err.api_message().unwrap_or_default();

        if message.contains("Invalid login credentials") {
            Self::InvalidCredentials
        } else if message.contains("Email not confirmed") {
            Self::EmailNotConfirmed
        } else if message.contains("User already registered") {
            Self::UserAlreadyExists
        } else if message.contains("Password should be at least") {
            Self::WeakPassword
        } else {
            Self::Backend(err)
        }
    }
}

impl From<BackendError> for AuthError {
    fn from(err: BackendError) -> Self {
        Self::from_backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(message: &str) -> BackendError {
        BackendError::Api {
            status: 400,
            code: None,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_message_mapping() {
        assert!(matches!(
            AuthError::from(api("Invalid login credentials")),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            AuthError::from(api("Email not confirmed")),
            AuthError::EmailNotConfirmed
        ));
        assert!(matches!(
            AuthError::from(api("User already registered")),
            AuthError::UserAlreadyExists
        ));
        assert!(matches!(
            AuthError::from(api("Password should be at least 6 characters.")),
            AuthError::WeakPassword
        ));
    }

    #[test]
    fn test_other_messages_pass_through() {
        let err = AuthError::from(api("Signups not allowed for this instance"));
        assert!(matches!(err, AuthError::Backend(_)));
        assert_eq!(err.to_string(), "Signups not allowed for this instance");
    }

    #[test]
    fn test_user_facing_text() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Email ou mot de passe incorrect"
        );
    }
}
