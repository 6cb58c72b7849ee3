//! Contact form handler.

use axum::Json;
use serde::Serialize;
use tracing::instrument;

use crate::error::Result;
use crate::services::contact::{self, ContactForm};

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub message: &'static str,
}

/// Accept a contact message. Messages are logged, not mailed.
#[instrument(skip_all)]
pub async fn submit(Json(form): Json<ContactForm>) -> Result<Json<ContactResponse>> {
    contact::submit(&form)?;
    Ok(Json(ContactResponse {
        success: true,
        message: "Merci ! Votre message a bien été envoyé.",
    }))
}
