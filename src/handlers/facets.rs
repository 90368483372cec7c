use axum::{extract::State, response::Json, routing::get, Router};

use crate::{
    errors::Result,
    models::{parse_filter_state, Dimension, DimensionDescriptor, FacetCountsResponse},
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/photos/facets", get(facet_counts))
        .route("/dimensions", get(list_dimensions))
}

/// GET /api/photos/facets - per-dimension option counts, each dimension
/// computed without its own constraint
pub async fn facet_counts(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<Json<FacetCountsResponse>> {
    let query_string = request.uri().query().unwrap_or("");
    let filters = parse_filter_state(query_string)?;

    tracing::info!("📊 FACET REQUEST: filters={:?}", filters);

    let counts = state.engine.facet_counts(&filters).await;
    Ok(Json(counts.into()))
}

/// GET /api/dimensions - the filterable dimensions and their canonical values
pub async fn list_dimensions() -> Json<Vec<DimensionDescriptor>> {
    Json(Dimension::ALL.into_iter().map(DimensionDescriptor::from).collect())
}
