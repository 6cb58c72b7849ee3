//! Search handler.

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::instrument;

use crate::search::{SearchParams, SearchResults};
use crate::state::AppState;

/// Filter and sort the catalog.
///
/// In backend mode the text query runs on the backend; every other filter
/// and the sort run in memory, the same in both modes.
#[instrument(skip(state), fields(q = %params.query))]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResults> {
    let catalog = state.catalog();
    let products = catalog.products().await;
    let candidates = catalog.search(&params.query, &products).await;
    Json(SearchResults::build(&products, candidates, &params))
}
