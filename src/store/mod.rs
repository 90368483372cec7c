use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::models::{Dimension, FacetCount, PageWindow, PhotoRow, SortOrder};
use crate::query::Predicate;

mod postgres;

pub use postgres::PgPhotoStore;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store lacks a capability (e.g. the grouped-count function is not installed)
    #[error("Capability unavailable: {0}")]
    Unsupported(String),

    #[error("Transient store error: {0}")]
    Transient(String),

    #[error("Query failed: {0}")]
    Query(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => match db.code().as_deref() {
                // undefined_function, undefined_table, feature_not_supported
                Some("42883") | Some("42P01") | Some("0A000") => {
                    StoreError::Unsupported(db.message().to_string())
                }
                // serialization_failure, deadlock_detected, admin/crash shutdown, cannot_connect_now
                Some("40001") | Some("40P01") | Some("57P01") | Some("57P02") | Some("57P03") => {
                    StoreError::Transient(db.message().to_string())
                }
                _ => StoreError::Query(err.to_string()),
            },
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::WorkerCrashed => StoreError::Transient(err.to_string()),
            _ => StoreError::Query(err.to_string()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Read-only access to photo records. Every operation receives structured
/// predicates; implementations must bind values, never splice them into text.
#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// Counts per distinct non-null value of `dimension`, count descending.
    async fn grouped_counts(
        &self,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Vec<FacetCount>>;

    /// Distinct non-null values of `dimension` among matching rows.
    async fn distinct_values(
        &self,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Vec<String>>;

    async fn count(&self, predicates: &[Predicate]) -> StoreResult<i64>;

    async fn fetch_page(
        &self,
        predicates: &[Predicate],
        sort: SortOrder,
        window: PageWindow,
    ) -> StoreResult<Vec<PhotoRow>>;

    async fn ping(&self) -> StoreResult<()>;
}

/// Per-operation timeout and transient retry policy.
#[derive(Debug, Clone, Copy)]
pub struct OperationPolicy {
    pub timeout: Duration,
    pub retries: u32,
}

impl OperationPolicy {
    /// Run one store operation under the timeout, retrying transient failures
    /// (timeouts included) up to `retries` more times.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt = 0;
        loop {
            let result = match tokio::time::timeout(self.timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Transient(format!(
                    "{} timed out after {}ms",
                    label,
                    self.timeout.as_millis()
                ))),
            };

            match result {
                Err(err) if err.is_transient() && attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!("🔁 RETRY {} (attempt {}): {}", label, attempt + 1, err);
                }
                other => return other,
            }
        }
    }
}
