//! Contact form.
//!
//! Accepted messages are logged; nothing is sent by mail.

use serde::{Deserialize, Serialize};
use tracing::info;

use lumiere_core::Email;

use crate::validation::{self, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactSubject {
    General,
    Bulk,
    Shipping,
    Return,
    Support,
}

impl ContactSubject {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "Question générale",
            Self::Bulk => "Commande en gros",
            Self::Shipping => "Livraison",
            Self::Return => "Retour/Échange",
            Self::Support => "Support technique",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "general" => Some(Self::General),
            "bulk" => Some(Self::Bulk),
            "shipping" => Some(Self::Shipping),
            "return" => Some(Self::Return),
            "support" => Some(Self::Support),
            _ => None,
        }
    }
}

/// The form as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// A validated message.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: Email,
    pub subject: ContactSubject,
    pub message: String,
}

impl ContactForm {
    /// # Errors
    ///
    /// Returns `MissingFields` if a field is blank, `InvalidEmail` for a
    /// malformed address and `Invalid` for an unknown subject.
    pub fn validate(&self) -> Result<ContactSubmission, ValidationError> {
        validation::require_all(&[&self.name, &self.email, &self.subject, &self.message])?;
        let email = validation::email(&self.email)?;
        let subject = ContactSubject::parse(&self.subject).ok_or_else(|| ValidationError::Invalid {
            field: "subject",
            reason: format!("sujet inconnu: {}", self.subject.trim()),
        })?;

        Ok(ContactSubmission {
            name: self.name.trim().to_string(),
            email,
            subject,
            message: self.message.trim().to_string(),
        })
    }
}

/// Validate and record a contact message.
///
/// # Errors
///
/// Returns the validation failure; nothing is logged in that case.
pub fn submit(form: &ContactForm) -> Result<ContactSubmission, ValidationError> {
    let submission = form.validate()?;
    info!(
        email = %submission.email,
        subject = submission.subject.label(),
        message_len = submission.message.len(),
        "Contact form submitted"
    );
    Ok(submission)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: "Jeanne".to_string(),
            email: "jeanne@example.fr".to_string(),
            subject: "shipping".to_string(),
            message: "Où est mon colis ?".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let submission = submit(&form()).unwrap();
        assert_eq!(submission.subject, ContactSubject::Shipping);
        assert_eq!(submission.subject.label(), "Livraison");
    }

    #[test]
    fn test_rejections() {
        let blank = ContactForm {
            message: "  ".to_string(),
            ..form()
        };
        assert_eq!(blank.validate().unwrap_err(), ValidationError::MissingFields);

        let bad_email = ContactForm {
            email: "jeanne.example.fr".to_string(),
            ..form()
        };
        assert_eq!(bad_email.validate().unwrap_err(), ValidationError::InvalidEmail);

        let bad_subject = ContactForm {
            subject: "complaint".to_string(),
            ..form()
        };
        assert!(matches!(
            bad_subject.validate().unwrap_err(),
            ValidationError::Invalid { field: "subject", .. }
        ));
    }
}
