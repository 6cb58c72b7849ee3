//! Local form validation.
//!
//! A validation failure blocks the action before any backend call and is
//! returned to the client as a 400 with the message below.

use thiserror::Error;

use lumiere_core::Email;

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Le champ {0} est obligatoire")]
    Required(&'static str),

    #[error("Veuillez saisir une adresse email valide")]
    InvalidEmail,

    #[error("Le mot de passe doit contenir au moins {0} caractères")]
    PasswordTooShort(usize),

    #[error("Les mots de passe ne correspondent pas")]
    PasswordMismatch,

    #[error("Vous devez accepter les conditions d'utilisation")]
    TermsNotAccepted,

    #[error("Veuillez remplir tous les champs obligatoires")]
    MissingFields,

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Fail with `Required(field)` if `value` is blank.
///
/// # Errors
///
/// Returns `ValidationError::Required` for an empty or whitespace-only value.
pub fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

/// Fail with `MissingFields` if any value is blank.
///
/// # Errors
///
/// Returns `ValidationError::MissingFields` if one of `values` is blank.
pub fn require_all(values: &[&str]) -> Result<(), ValidationError> {
    if values.iter().any(|v| v.trim().is_empty()) {
        Err(ValidationError::MissingFields)
    } else {
        Ok(())
    }
}

/// Check an email's shape.
///
/// # Errors
///
/// Returns `ValidationError::InvalidEmail` if the address does not parse.
pub fn email(value: &str) -> Result<Email, ValidationError> {
    Email::parse(value.trim()).map_err(|_| ValidationError::InvalidEmail)
}

/// Sign-in form: both fields present.
///
/// # Errors
///
/// Returns the first missing field.
pub fn sign_in(email: &str, password: &str) -> Result<(), ValidationError> {
    require("email", email)?;
    require("mot de passe", password)
}

/// The sign-up form as submitted.
#[derive(Debug, Clone, Copy)]
pub struct SignUpFields<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub confirm_password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub accept_terms: bool,
}

/// Sign-up form.
///
/// # Errors
///
/// Returns the first rule the form breaks, in the order: required fields,
/// password length, confirmation, terms, email shape.
pub fn sign_up(fields: &SignUpFields<'_>) -> Result<Email, ValidationError> {
    require_all(&[
        fields.email,
        fields.password,
        fields.first_name,
        fields.last_name,
    ])?;
    new_password(fields.password, fields.confirm_password)?;
    if !fields.accept_terms {
        return Err(ValidationError::TermsNotAccepted);
    }
    email(fields.email)
}

/// A new password and its confirmation.
///
/// # Errors
///
/// Returns `PasswordTooShort` or `PasswordMismatch`.
pub fn new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Password reset request.
///
/// # Errors
///
/// Returns `Required` or `InvalidEmail`.
pub fn reset_password(value: &str) -> Result<Email, ValidationError> {
    require("email", value)?;
    email(value)
}
