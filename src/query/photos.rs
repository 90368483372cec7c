use std::time::Instant;

use super::conditions::build_conditions;
use super::mapper::RowMapper;
use crate::models::{GalleryQuery, ResultPage};
use crate::store::{OperationPolicy, PhotoStore};

/// Applies the full Filter State (no self-exclusion) plus sort and window.
pub struct PhotoQueryExecutor {
    policy: OperationPolicy,
    mapper: RowMapper,
}

impl PhotoQueryExecutor {
    pub fn new(policy: OperationPolicy, mapper: RowMapper) -> Self {
        Self { policy, mapper }
    }

    pub async fn execute(&self, store: &dyn PhotoStore, query: &GalleryQuery) -> ResultPage {
        let window = query.window();
        let mut page = ResultPage {
            items: Vec::new(),
            page: query.page,
            limit: query.limit,
            offset: window.offset,
            sort: query.sort,
            total: None,
            total_pages: None,
            degraded: false,
        };

        // A zero-sized window never touches the store
        if window.is_empty() {
            return page;
        }

        let predicates = build_conditions(&query.filters, None);
        let started = Instant::now();

        let fetch = self
            .policy
            .run("photo page", || store.fetch_page(&predicates, query.sort, window));
        let total = async {
            if query.include_total {
                Some(self.policy.run("photo count", || store.count(&predicates)).await)
            } else {
                None
            }
        };
        let (rows, total) = tokio::join!(fetch, total);

        match rows {
            Ok(rows) => page.items = self.mapper.map_rows(rows),
            Err(err) => {
                tracing::error!("❌ Photo page query failed, returning empty page: {}", err);
                page.degraded = true;
            }
        }

        match total {
            Some(Ok(total)) => {
                page.total = Some(total);
                page.total_pages = Some((total + query.limit - 1) / query.limit);
            }
            Some(Err(err)) => {
                tracing::warn!("⚠️ Photo count query failed: {}", err);
                page.degraded = true;
            }
            None => {}
        }

        tracing::info!(
            "⏱️  PAGE QUERY: {}ms (returned {} records, offset={}, sort={})",
            started.elapsed().as_millis(),
            page.items.len(),
            page.offset,
            page.sort
        );

        page
    }
}
