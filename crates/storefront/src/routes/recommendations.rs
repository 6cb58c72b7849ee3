//! Recommendation handlers.

use axum::{Json, extract::Query};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::recommendations::{self, RecommendationTab, RecommendationView};

#[derive(Debug, Default, Deserialize)]
pub struct RecommendationQuery {
    pub tab: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TabInfo {
    pub id: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RecommendationPage {
    pub tab: RecommendationTab,
    pub tabs: Vec<TabInfo>,
    pub items: Vec<RecommendationView>,
}

/// Recommendations of one tab (`personalized` by default).
#[instrument(skip(_auth))]
pub async fn index(
    _auth: RequireAuth,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationPage>> {
    let tab = match query.tab.as_deref() {
        None | Some("") => RecommendationTab::default(),
        Some(name) => name.parse().map_err(AppError::BadRequest)?,
    };

    Ok(Json(RecommendationPage {
        tab,
        tabs: RecommendationTab::ALL
            .iter()
            .map(|t| TabInfo {
                id: t.as_str(),
                label: t.label(),
            })
            .collect(),
        items: recommendations::for_tab(tab)
            .into_iter()
            .map(RecommendationView::from)
            .collect(),
    }))
}
