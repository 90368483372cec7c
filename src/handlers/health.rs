use axum::{extract::State, response::Json, routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let database = match state.engine.store().ping().await {
        Ok(()) => "ok",
        Err(err) => {
            tracing::warn!("⚠️ Health check could not reach the database: {}", err);
            "unavailable"
        }
    };

    let grouped_counts = if state.engine.primary_known_unavailable() {
        "unavailable"
    } else {
        "available"
    };

    Json(serde_json::json!({
        "status": "healthy",
        "service": "photofacet-backend",
        "timestamp": chrono::Utc::now(),
        "version": env!("CARGO_PKG_VERSION"),
        "database": database,
        "grouped_counts": grouped_counts,
        "endpoints": {
            "photos": "/api/photos",
            "facets": "/api/photos/facets",
            "gallery": "/api/gallery",
            "dimensions": "/api/dimensions",
            "health": "/api/health"
        }
    }))
}
