//! Per-dimension facet aggregation.
//!
//! Two strategies produce the same (value, count) pairs:
//! - [`GroupedCountAggregator`]: one server-side grouped count (O(1) round-trips)
//! - [`EnumerateCountAggregator`]: distinct values, then one count per value
//!
//! [`AggregationExecutor`] tries the grouped strategy first and switches to
//! enumeration when the store reports the capability as unavailable. Once seen,
//! the unavailability can be remembered for the rest of the process so later
//! requests skip the doomed call.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};

use super::conditions::Predicate;
use crate::config::Config;
use crate::models::{AggregationPath, Dimension, DimensionFacets, FacetCount};
use crate::store::{OperationPolicy, PhotoStore, StoreError, StoreResult};

/// Counts produced by one strategy. `complete` is false when some values
/// could not be counted and are absent from `counts`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    pub counts: Vec<FacetCount>,
    pub complete: bool,
}

impl Aggregation {
    pub fn complete(counts: Vec<FacetCount>) -> Self {
        Self {
            counts,
            complete: true,
        }
    }
}

#[async_trait]
pub trait Aggregator: Send + Sync {
    fn path(&self) -> AggregationPath;

    async fn aggregate(
        &self,
        store: &dyn PhotoStore,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Aggregation>;
}

pub struct GroupedCountAggregator {
    policy: OperationPolicy,
}

impl GroupedCountAggregator {
    pub fn new(policy: OperationPolicy) -> Self {
        Self { policy }
    }
}

#[async_trait]
impl Aggregator for GroupedCountAggregator {
    fn path(&self) -> AggregationPath {
        AggregationPath::Grouped
    }

    async fn aggregate(
        &self,
        store: &dyn PhotoStore,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Aggregation> {
        let label = format!("grouped counts for {}", dimension);
        self.policy
            .run(&label, || store.grouped_counts(dimension, predicates))
            .await
            .map(Aggregation::complete)
    }
}

pub struct EnumerateCountAggregator {
    policy: OperationPolicy,
    concurrency: usize,
}

impl EnumerateCountAggregator {
    pub fn new(policy: OperationPolicy, concurrency: usize) -> Self {
        Self {
            policy,
            concurrency: concurrency.max(1),
        }
    }
}

#[async_trait]
impl Aggregator for EnumerateCountAggregator {
    fn path(&self) -> AggregationPath {
        AggregationPath::Enumerated
    }

    async fn aggregate(
        &self,
        store: &dyn PhotoStore,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Aggregation> {
        let label = format!("distinct values for {}", dimension);
        let values = self
            .policy
            .run(&label, || store.distinct_values(dimension, predicates))
            .await?;

        tracing::debug!(
            "🔢 ENUMERATE {}: {} distinct values, issuing one count each",
            dimension,
            values.len()
        );

        let policy = self.policy;
        let counts: Vec<Option<FacetCount>> = stream::iter(values)
            .map(move |value| async move {
                let mut scoped = predicates.to_vec();
                scoped.push(Predicate::Equals(dimension, value.clone()));
                let label = format!("count for {}={}", dimension, value);

                match policy.run(&label, || store.count(&scoped)).await {
                    Ok(count) => Some(FacetCount::new(value, count)),
                    Err(err) => {
                        // The rest of the dimension survives; the result is marked partial
                        tracing::warn!("⚠️ {} failed: {}", label, err);
                        None
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let complete = counts.iter().all(Option::is_some);
        Ok(Aggregation {
            counts: counts.into_iter().flatten().collect(),
            complete,
        })
    }
}

/// Drops zero counts and orders by count descending, then value ascending so
/// equal counts come back in the same order on every call.
pub fn finalize_counts(mut counts: Vec<FacetCount>) -> Vec<FacetCount> {
    counts.retain(|c| c.count > 0);
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
    counts
}

pub struct AggregationExecutor {
    primary: Box<dyn Aggregator>,
    fallback: Box<dyn Aggregator>,
    primary_unavailable: AtomicBool,
    remember_unavailable: bool,
}

impl AggregationExecutor {
    pub fn new(config: &Config) -> Self {
        let policy = OperationPolicy {
            timeout: config.query_timeout,
            retries: config.store_retries,
        };
        Self::with_strategies(
            Box::new(GroupedCountAggregator::new(policy)),
            Box::new(EnumerateCountAggregator::new(policy, config.fallback_concurrency)),
            config.remember_primary_unavailable,
        )
    }

    pub fn with_strategies(
        primary: Box<dyn Aggregator>,
        fallback: Box<dyn Aggregator>,
        remember_unavailable: bool,
    ) -> Self {
        Self {
            primary,
            fallback,
            primary_unavailable: AtomicBool::new(false),
            remember_unavailable,
        }
    }

    /// True once the grouped path has been found missing and is being skipped.
    pub fn primary_known_unavailable(&self) -> bool {
        self.primary_unavailable.load(Ordering::Relaxed)
    }

    /// Counts for one dimension. Never fails: store errors other than a missing
    /// capability degrade the dimension to an empty list, and values the
    /// fallback could not count mark the dimension partial.
    pub async fn execute(
        &self,
        store: &dyn PhotoStore,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> DimensionFacets {
        if !self.primary_known_unavailable() {
            match self.primary.aggregate(store, dimension, predicates).await {
                Ok(aggregation) => return self.finish(dimension, self.primary.path(), aggregation),
                Err(StoreError::Unsupported(reason)) => {
                    tracing::warn!(
                        "⚠️ Grouped facet counts unavailable for {} ({}); enumerating values instead",
                        dimension,
                        reason
                    );
                    if self.remember_unavailable {
                        self.primary_unavailable.store(true, Ordering::Relaxed);
                    }
                }
                Err(err) => {
                    tracing::warn!("⚠️ Facet counts for {} degraded: {}", dimension, err);
                    return DimensionFacets::degraded();
                }
            }
        }

        match self.fallback.aggregate(store, dimension, predicates).await {
            Ok(aggregation) => self.finish(dimension, self.fallback.path(), aggregation),
            Err(err) => {
                tracing::warn!(
                    "⚠️ Facet counts for {} degraded (fallback failed): {}",
                    dimension,
                    err
                );
                DimensionFacets::degraded()
            }
        }
    }

    fn finish(
        &self,
        dimension: Dimension,
        path: AggregationPath,
        aggregation: Aggregation,
    ) -> DimensionFacets {
        let path = if aggregation.complete {
            path
        } else {
            tracing::warn!("⚠️ Facet counts for {} are partial", dimension);
            AggregationPath::Partial
        };
        DimensionFacets {
            counts: finalize_counts(aggregation.counts),
            path,
        }
    }
}
