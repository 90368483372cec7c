//! Faceted filter and aggregation engine for the sports photo gallery.
//!
//! Requests carry a Filter State; the engine answers with per-dimension option
//! counts (each dimension computed without its own constraint) and a sorted,
//! paged slice of matching photos. Everything here is read-only.

use axum::Router;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod query;
pub mod store;

use config::Config;
use query::GalleryEngine;
use store::PhotoStore;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<GalleryEngine>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn PhotoStore>, config: Config) -> Self {
        Self {
            engine: Arc::new(GalleryEngine::new(store, &config)),
            config: Arc::new(config),
        }
    }
}

fn cors_layer(config: &Config) -> CorsLayer {
    let cors = if config.debug_mode {
        info!("🔓 Development mode: Using permissive CORS");
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("⚠️ Ignoring invalid origin '{}': {}", origin, e);
                    None
                }
            })
            .collect();
        info!("🔒 CORS configured for {} origins", origins.len());
        CorsLayer::new().allow_origin(origins)
    };

    cors.allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::ORIGIN,
        ])
}

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(handlers::health::router())
        .merge(handlers::photos::router())
        .merge(handlers::photos::gallery_router())
        .merge(handlers::facets::router());

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&state.config)),
        )
        .with_state(state)
}
