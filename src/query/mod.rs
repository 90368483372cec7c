mod aggregate;
mod conditions;
mod fanout;
mod mapper;
mod photos;

pub use aggregate::{
    finalize_counts, Aggregation, AggregationExecutor, Aggregator, EnumerateCountAggregator,
    GroupedCountAggregator,
};
pub use conditions::{build_conditions, Predicate};
pub use fanout::FacetCoordinator;
pub use mapper::{quality_tier, RowMapper};
pub use photos::PhotoQueryExecutor;

use std::sync::Arc;

use crate::config::Config;
use crate::models::{FacetCounts, FilterState, GalleryQuery, ResultPage};
use crate::store::{OperationPolicy, PhotoStore};

/// Facet counts and result pages over one store.
pub struct GalleryEngine {
    store: Arc<dyn PhotoStore>,
    facets: FacetCoordinator,
    photos: PhotoQueryExecutor,
}

impl GalleryEngine {
    pub fn new(store: Arc<dyn PhotoStore>, config: &Config) -> Self {
        let policy = OperationPolicy {
            timeout: config.query_timeout,
            retries: config.store_retries,
        };
        Self {
            store,
            facets: FacetCoordinator::new(AggregationExecutor::new(config)),
            photos: PhotoQueryExecutor::new(policy, RowMapper::new(config.media_base_url.clone())),
        }
    }

    pub fn store(&self) -> &dyn PhotoStore {
        self.store.as_ref()
    }

    pub fn primary_known_unavailable(&self) -> bool {
        self.facets.executor().primary_known_unavailable()
    }

    pub async fn facet_counts(&self, filters: &FilterState) -> FacetCounts {
        self.facets.facet_counts(self.store.as_ref(), filters).await
    }

    pub async fn photo_page(&self, query: &GalleryQuery) -> ResultPage {
        self.photos.execute(self.store.as_ref(), query).await
    }

    /// Both independent reads for one request, run concurrently.
    pub async fn gallery(&self, query: &GalleryQuery) -> (ResultPage, FacetCounts) {
        tokio::join!(self.photo_page(query), self.facet_counts(&query.filters))
    }
}
