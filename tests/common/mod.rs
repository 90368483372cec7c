//! Shared test helpers: an in-memory `PhotoStore` with fault injection and a
//! deterministic photo fixture.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use photofacet_backend::config::Config;
use photofacet_backend::models::{
    intensity_rank, Dimension, FacetCount, PageWindow, PhotoRow, SortOrder,
};
use photofacet_backend::query::{GalleryEngine, Predicate};
use photofacet_backend::store::{PhotoStore, StoreError, StoreResult};

pub const SPORTS: [&str; 3] = ["volleyball", "basketball", "soccer"];
pub const INTENSITIES: [&str; 4] = ["low", "medium", "high", "peak"];
pub const COMPOSITIONS: [&str; 5] = ["rule_of_thirds", "centered", "leading_lines", "close_up", "wide"];
pub const LIGHTINGS: [&str; 4] = ["natural", "backlit", "indoor", "dramatic"];
pub const TIMES: [&str; 3] = ["morning", "afternoon", "golden_hour"];
pub const TEMPERATURES: [&str; 3] = ["warm", "neutral", "cool"];
pub const CATEGORIES: [&str; 3] = ["action", "celebration", "candid"];
pub const PLAYS: [&str; 5] = ["attack", "block", "dig", "serve", "shot"];

/// Number of enriched rows in `fixture_rows()`
pub const ENRICHED_ROWS: usize = 72;

#[derive(Debug, Default)]
pub struct CallCounts {
    pub grouped: AtomicUsize,
    pub distinct: AtomicUsize,
    pub count: AtomicUsize,
    pub page: AtomicUsize,
}

impl CallCounts {
    pub fn grouped(&self) -> usize {
        self.grouped.load(Ordering::SeqCst)
    }
    pub fn distinct(&self) -> usize {
        self.distinct.load(Ordering::SeqCst)
    }
    pub fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
    pub fn page(&self) -> usize {
        self.page.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    rows: Vec<PhotoRow>,
    grouped_unsupported: bool,
    failing_dimensions: HashSet<Dimension>,
    slow_dimensions: HashSet<Dimension>,
    slow_delay: Duration,
    failing_pages: bool,
    failing_values: HashSet<(Dimension, String)>,
    slow_finished: AtomicUsize,
    transient_failures: AtomicU32,
    pub calls: CallCounts,
}

impl MemoryStore {
    pub fn new(rows: Vec<PhotoRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Behave like a database without the grouped-count function installed.
    pub fn without_grouped_counts(mut self) -> Self {
        self.grouped_unsupported = true;
        self
    }

    /// Every aggregation touching `dimension` fails with a query error.
    pub fn failing_dimension(mut self, dimension: Dimension) -> Self {
        self.failing_dimensions.insert(dimension);
        self
    }

    /// Aggregations for `dimension` take `delay` before answering.
    pub fn slow_dimension(mut self, dimension: Dimension, delay: Duration) -> Self {
        self.slow_dimensions.insert(dimension);
        self.slow_delay = delay;
        self
    }

    /// Counts scoped to `dimension = value` fail with a query error.
    pub fn failing_value(mut self, dimension: Dimension, value: &str) -> Self {
        self.failing_values.insert((dimension, value.to_string()));
        self
    }

    /// Number of slow aggregations that ran to completion.
    pub fn slow_finished(&self) -> usize {
        self.slow_finished.load(Ordering::SeqCst)
    }

    pub fn failing_pages(mut self) -> Self {
        self.failing_pages = true;
        self
    }

    /// The next `n` operations of any kind fail with a transient error.
    pub fn with_transient_failures(self, n: u32) -> Self {
        self.transient_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn rows(&self) -> &[PhotoRow] {
        &self.rows
    }

    fn take_transient_failure(&self) -> StoreResult<()> {
        let remaining = self.transient_failures.load(Ordering::SeqCst);
        if remaining > 0
            && self
                .transient_failures
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Err(StoreError::Transient("connection reset by peer".to_string()));
        }
        Ok(())
    }

    async fn dimension_hooks(&self, dimension: Dimension) -> StoreResult<()> {
        if self.slow_dimensions.contains(&dimension) {
            tokio::time::sleep(self.slow_delay).await;
            self.slow_finished.fetch_add(1, Ordering::SeqCst);
        }
        if self.failing_dimensions.contains(&dimension) {
            return Err(StoreError::Query(format!("column \"{}\" is corrupted", dimension)));
        }
        Ok(())
    }

    fn matching(&self, predicates: &[Predicate]) -> impl Iterator<Item = &PhotoRow> {
        let predicates = predicates.to_vec();
        self.rows.iter().filter(move |row| row_matches(row, &predicates))
    }
}

pub fn facet_value(row: &PhotoRow, dimension: Dimension) -> Option<&str> {
    let value = match dimension {
        Dimension::SportType => &row.sport_type,
        Dimension::PhotoCategory => &row.photo_category,
        Dimension::PlayType => &row.play_type,
        Dimension::ActionIntensity => &row.action_intensity,
        Dimension::Composition => &row.composition,
        Dimension::TimeOfDay => &row.time_of_day,
        Dimension::Lighting => &row.lighting,
        Dimension::ColorTemperature => &row.color_temperature,
    };
    value.as_deref()
}

pub fn row_matches(row: &PhotoRow, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|predicate| match predicate {
        Predicate::Enriched => row.sharpness.is_some(),
        Predicate::Equals(dimension, value) => facet_value(row, *dimension) == Some(value.as_str()),
        Predicate::In(dimension, values) => facet_value(row, *dimension)
            .map(|v| values.iter().any(|accepted| accepted == v))
            .unwrap_or(false),
    })
}

fn desc_nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> CmpOrdering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

fn asc_nulls_last<T: Ord>(a: Option<T>, b: Option<T>) -> CmpOrdering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

fn float_key(value: Option<f64>) -> Option<i64> {
    value.map(|v| (v * 1_000_000.0) as i64)
}

/// Mirrors the ORDER BY clauses of the Postgres store.
pub fn compare_rows(sort: SortOrder, a: &PhotoRow, b: &PhotoRow) -> CmpOrdering {
    match sort {
        SortOrder::Newest => desc_nulls_last(a.created_at, b.created_at)
            .then_with(|| b.upload_seq.cmp(&a.upload_seq)),
        SortOrder::Oldest => asc_nulls_last(a.created_at, b.created_at)
            .then_with(|| a.upload_seq.cmp(&b.upload_seq)),
        SortOrder::PlayType => asc_nulls_last(a.play_type.as_deref(), b.play_type.as_deref())
            .then_with(|| desc_nulls_last(a.created_at, b.created_at))
            .then_with(|| b.upload_seq.cmp(&a.upload_seq)),
        SortOrder::Intensity => intensity_rank(b.action_intensity.as_deref())
            .cmp(&intensity_rank(a.action_intensity.as_deref()))
            .then_with(|| desc_nulls_last(a.created_at, b.created_at))
            .then_with(|| b.upload_seq.cmp(&a.upload_seq)),
        SortOrder::Sharpness => desc_nulls_last(float_key(a.sharpness), float_key(b.sharpness))
            .then_with(|| b.upload_seq.cmp(&a.upload_seq)),
        SortOrder::Impact => {
            desc_nulls_last(float_key(a.emotional_impact), float_key(b.emotional_impact))
                .then_with(|| b.upload_seq.cmp(&a.upload_seq))
        }
    }
}

#[async_trait]
impl PhotoStore for MemoryStore {
    async fn grouped_counts(
        &self,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Vec<FacetCount>> {
        self.calls.grouped.fetch_add(1, Ordering::SeqCst);
        self.take_transient_failure()?;
        if self.grouped_unsupported {
            return Err(StoreError::Unsupported(
                "function facet_value_counts(text, jsonb) does not exist".to_string(),
            ));
        }
        self.dimension_hooks(dimension).await?;

        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        for row in self.matching(predicates) {
            if let Some(value) = facet_value(row, dimension) {
                *counts.entry(value.to_string()).or_insert(0) += 1;
            }
        }
        let mut counts: Vec<FacetCount> = counts
            .into_iter()
            .map(|(value, count)| FacetCount::new(value, count))
            .collect();
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }

    async fn distinct_values(
        &self,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Vec<String>> {
        self.calls.distinct.fetch_add(1, Ordering::SeqCst);
        self.take_transient_failure()?;
        self.dimension_hooks(dimension).await?;

        let values: BTreeSet<String> = self
            .matching(predicates)
            .filter_map(|row| facet_value(row, dimension).map(str::to_string))
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn count(&self, predicates: &[Predicate]) -> StoreResult<i64> {
        self.calls.count.fetch_add(1, Ordering::SeqCst);
        self.take_transient_failure()?;
        for predicate in predicates {
            if let Predicate::Equals(dimension, value) = predicate {
                if self.failing_values.contains(&(*dimension, value.clone())) {
                    return Err(StoreError::Query(format!(
                        "could not read {} = {}",
                        dimension, value
                    )));
                }
            }
        }
        Ok(self.matching(predicates).count() as i64)
    }

    async fn fetch_page(
        &self,
        predicates: &[Predicate],
        sort: SortOrder,
        window: PageWindow,
    ) -> StoreResult<Vec<PhotoRow>> {
        self.calls.page.fetch_add(1, Ordering::SeqCst);
        self.take_transient_failure()?;
        if self.failing_pages {
            return Err(StoreError::Query("canceling statement due to user request".to_string()));
        }

        let mut rows: Vec<PhotoRow> = self.matching(predicates).cloned().collect();
        rows.sort_by(|a, b| compare_rows(sort, a, b));
        Ok(rows
            .into_iter()
            .skip(window.offset.max(0) as usize)
            .take(window.limit.max(0) as usize)
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 14, 10, 0, 0).unwrap()
}

/// 72 enriched photos spread across every dimension plus 8 not yet enriched.
///
/// Groups of four share a `created_at` so the upload sequence has to break ties.
/// Every seventh photo has no play type.
pub fn fixture_rows() -> Vec<PhotoRow> {
    let mut rows = Vec::new();
    for i in 0..ENRICHED_ROWS {
        let seq = i as i64 + 1;
        rows.push(PhotoRow {
            photo_key: format!("photo-{:03}", seq),
            upload_seq: seq,
            created_at: Some(base_time() + ChronoDuration::hours((i / 4) as i64)),
            image_url: Some(format!("https://photos.example.com/{}/M.jpg", seq)),
            thumbnail_url: Some(format!("https://photos.example.com/{}/Th.jpg", seq)),
            original_url: Some(format!("https://photos.example.com/{}/O.jpg", seq)),
            sport_type: Some(SPORTS[i % 3].to_string()),
            photo_category: Some(CATEGORIES[(i / 3) % 3].to_string()),
            play_type: if i % 7 == 6 {
                None
            } else {
                Some(PLAYS[i % 5].to_string())
            },
            action_intensity: Some(INTENSITIES[i % 4].to_string()),
            composition: Some(COMPOSITIONS[i % 5].to_string()),
            time_of_day: Some(TIMES[(i / 2) % 3].to_string()),
            lighting: Some(LIGHTINGS[(i / 3) % 4].to_string()),
            color_temperature: Some(TEMPERATURES[(i / 5) % 3].to_string()),
            sharpness: Some(5.0 + (i % 5) as f64),
            composition_score: Some(4.0 + (i % 6) as f64),
            exposure_accuracy: Some(0.8),
            emotional_impact: Some((i % 7) as f64),
            emotion: Some("determined".to_string()),
            enrichment_provider: Some("vision-v2".to_string()),
            enrichment_cost: Some(0.002),
            enrichment_confidence: Some(0.9),
            enriched_at: Some(base_time() + ChronoDuration::days(1)),
        });
    }

    // Not yet enriched: present in the table, invisible to every query
    for j in 0..8 {
        let seq = (ENRICHED_ROWS + j) as i64 + 1;
        rows.push(PhotoRow {
            photo_key: format!("pending-{:03}", seq),
            upload_seq: seq,
            created_at: Some(base_time() + ChronoDuration::days(30)),
            image_url: Some(format!("https://photos.example.com/{}/M.jpg", seq)),
            sport_type: Some("volleyball".to_string()),
            action_intensity: Some("peak".to_string()),
            composition: Some("centered".to_string()),
            ..PhotoRow::default()
        });
    }

    rows
}

pub fn test_config() -> Config {
    Config {
        query_timeout: Duration::from_millis(200),
        ..Config::default()
    }
}

pub fn engine_with(store: Arc<MemoryStore>, config: &Config) -> GalleryEngine {
    GalleryEngine::new(store, config)
}

/// Brute-force count of enriched rows matching every predicate.
pub fn brute_force_count(rows: &[PhotoRow], predicates: &[Predicate]) -> i64 {
    rows.iter().filter(|row| row_matches(row, predicates)).count() as i64
}
