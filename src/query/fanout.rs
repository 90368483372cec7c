use futures::future::join_all;
use std::time::Instant;

use super::aggregate::AggregationExecutor;
use super::conditions::build_conditions;
use crate::models::{Dimension, FacetCounts, FilterState};
use crate::store::PhotoStore;

/// Runs the aggregation executor for every dimension at once and joins the results.
pub struct FacetCoordinator {
    executor: AggregationExecutor,
}

impl FacetCoordinator {
    pub fn new(executor: AggregationExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &AggregationExecutor {
        &self.executor
    }

    /// Facet Count Result for all dimensions. Each dimension is computed with
    /// its own constraint excluded. The per-dimension futures are polled
    /// together inside the caller's future, so dropping the caller (client
    /// disconnect) drops every in-flight query with it.
    pub async fn facet_counts(&self, store: &dyn PhotoStore, filters: &FilterState) -> FacetCounts {
        let started = Instant::now();

        let per_dimension = Dimension::ALL.into_iter().map(move |dimension| async move {
            let predicates = build_conditions(filters, Some(dimension));
            let facets = self.executor.execute(store, dimension, &predicates).await;
            tracing::debug!(
                "📊 FACET {}: {} values via {:?}",
                dimension,
                facets.counts.len(),
                facets.path
            );
            (dimension, facets)
        });

        let counts = FacetCounts {
            dimensions: join_all(per_dimension).await.into_iter().collect(),
        };

        let enumerated: Vec<Dimension> = counts
            .dimensions
            .iter()
            .filter(|(_, f)| f.used_fallback())
            .map(|(d, _)| *d)
            .collect();
        if !enumerated.is_empty() {
            tracing::warn!(
                "🐢 FACET FALLBACK: {} dimensions counted value by value: {:?}",
                enumerated.len(),
                enumerated
            );
        }

        let degraded = counts.degraded();
        tracing::info!(
            "⏱️  FACET COUNTS: {}ms ({} active filters, {} degraded dimensions)",
            started.elapsed().as_millis(),
            filters.iter().count(),
            degraded.len()
        );

        counts
    }
}
