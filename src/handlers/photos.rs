use axum::{extract::State, response::Json, routing::get, Router};
use serde::Serialize;

use crate::{
    errors::Result,
    models::{parse_gallery_query, FacetCountsResponse, ResultPage},
    AppState,
};

#[derive(Debug, Serialize)]
pub struct GalleryResponse {
    pub photos: ResultPage,
    pub facets: FacetCountsResponse,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/photos", get(list_photos))
}

pub fn gallery_router() -> Router<AppState> {
    Router::new().route("/gallery", get(gallery))
}

/// GET /api/photos - one page of photos matching every active filter
pub async fn list_photos(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<Json<ResultPage>> {
    let query_string = request.uri().query().unwrap_or("");
    let query = parse_gallery_query(query_string, &state.config)?;

    tracing::info!(
        "🔍 PHOTO REQUEST: page={}, limit={}, sort={}, filters={:?}",
        query.page,
        query.limit,
        query.sort,
        query.filters
    );

    let page = state.engine.photo_page(&query).await;
    Ok(Json(page))
}

/// GET /api/gallery - result page and facet counts for the same filters
pub async fn gallery(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> Result<Json<GalleryResponse>> {
    let query_string = request.uri().query().unwrap_or("");
    let query = parse_gallery_query(query_string, &state.config)?;

    tracing::info!(
        "🔍 GALLERY REQUEST: page={}, limit={}, sort={}, filters={:?}",
        query.page,
        query.limit,
        query.sort,
        query.filters
    );

    let (photos, facets) = state.engine.gallery(&query).await;

    tracing::info!(
        "✅ GALLERY COMPLETE: {} items, total={:?}, degraded facets={:?}",
        photos.items.len(),
        photos.total,
        facets.degraded()
    );

    Ok(Json(GalleryResponse {
        photos,
        facets: facets.into(),
    }))
}
