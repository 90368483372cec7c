use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{PhotoStore, StoreResult};
use crate::models::{Dimension, FacetCount, PageWindow, PhotoRow, SortOrder, INTENSITY_RANKS};
use crate::query::Predicate;

const PHOTO_COLUMNS: &str = r#"
    photo_key,
    upload_seq,
    created_at,
    image_url,
    thumbnail_url,
    original_url,
    sport_type,
    photo_category,
    play_type,
    action_intensity,
    composition,
    time_of_day,
    lighting,
    color_temperature,
    sharpness,
    composition_score,
    exposure_accuracy,
    emotional_impact,
    emotion,
    enrichment_provider,
    enrichment_cost,
    enrichment_confidence,
    enriched_at
"#;

/// PostgreSQL backed store over the `photos` table.
#[derive(Clone)]
pub struct PgPhotoStore {
    pool: PgPool,
}

impl PgPhotoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append ` WHERE ...` for the predicate list. Column names come from the
/// closed `Dimension` enum; every value goes through `push_bind`.
fn push_where(query_builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    query_builder.push(" WHERE 1=1");

    for predicate in predicates {
        match predicate {
            Predicate::Enriched => {
                query_builder.push(" AND sharpness IS NOT NULL");
            }
            Predicate::Equals(dimension, value) => {
                query_builder.push(" AND ");
                query_builder.push(dimension.column());
                query_builder.push(" = ");
                query_builder.push_bind(value.clone());
            }
            Predicate::In(dimension, values) => {
                query_builder.push(" AND ");
                query_builder.push(dimension.column());
                query_builder.push(" = ANY(");
                query_builder.push_bind(values.clone());
                query_builder.push(")");
            }
        }
    }
}

/// Filter object for `facet_value_counts`: `{column: [values...]}`.
/// The eligibility gate is enforced inside the function itself.
pub(crate) fn facet_filter_json(predicates: &[Predicate]) -> Value {
    let mut filters = Map::new();
    for predicate in predicates {
        if let Some(dimension) = predicate.dimension() {
            let values = predicate
                .values()
                .into_iter()
                .map(|v| Value::String(v.to_string()))
                .collect();
            filters.insert(dimension.column().to_string(), Value::Array(values));
        }
    }
    Value::Object(filters)
}

/// `CASE` over the fixed rank table; the literals are constants, never request text.
fn intensity_rank_case() -> String {
    let arms: String = INTENSITY_RANKS
        .iter()
        .map(|(value, rank)| format!(" WHEN '{}' THEN {}", value, rank))
        .collect();
    format!("CASE action_intensity{} ELSE 0 END", arms)
}

pub(crate) fn order_by_clause(sort: SortOrder) -> String {
    match sort {
        SortOrder::Newest => "created_at DESC NULLS LAST, upload_seq DESC".to_string(),
        SortOrder::Oldest => "created_at ASC NULLS LAST, upload_seq ASC".to_string(),
        SortOrder::PlayType => {
            "play_type ASC NULLS LAST, created_at DESC NULLS LAST, upload_seq DESC".to_string()
        }
        SortOrder::Intensity => format!(
            "{} DESC, created_at DESC NULLS LAST, upload_seq DESC",
            intensity_rank_case()
        ),
        SortOrder::Sharpness => "sharpness DESC NULLS LAST, upload_seq DESC".to_string(),
        SortOrder::Impact => "emotional_impact DESC NULLS LAST, upload_seq DESC".to_string(),
    }
}

pub(crate) fn distinct_values_query(
    dimension: Dimension,
    predicates: &[Predicate],
) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new("SELECT DISTINCT ");
    query_builder.push(dimension.column());
    query_builder.push(" AS value FROM photos");
    push_where(&mut query_builder, predicates);
    query_builder.push(" AND ");
    query_builder.push(dimension.column());
    query_builder.push(" IS NOT NULL ORDER BY value");
    query_builder
}

pub(crate) fn count_query(predicates: &[Predicate]) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new("SELECT COUNT(*) FROM photos");
    push_where(&mut query_builder, predicates);
    query_builder
}

pub(crate) fn page_query(
    predicates: &[Predicate],
    sort: SortOrder,
    window: PageWindow,
) -> QueryBuilder<'static, Postgres> {
    let mut query_builder = QueryBuilder::new("SELECT");
    query_builder.push(PHOTO_COLUMNS);
    query_builder.push("FROM photos");
    push_where(&mut query_builder, predicates);
    query_builder.push(" ORDER BY ");
    query_builder.push(order_by_clause(sort));
    query_builder.push(" LIMIT ");
    query_builder.push_bind(window.limit);
    query_builder.push(" OFFSET ");
    query_builder.push_bind(window.offset);
    query_builder
}

#[async_trait]
impl PhotoStore for PgPhotoStore {
    async fn grouped_counts(
        &self,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Vec<FacetCount>> {
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            "SELECT facet_value, facet_count FROM facet_value_counts($1, $2)",
        )
        .bind(dimension.column())
        .bind(facet_filter_json(predicates))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(value, count)| value.map(|v| FacetCount::new(v, count)))
            .collect())
    }

    async fn distinct_values(
        &self,
        dimension: Dimension,
        predicates: &[Predicate],
    ) -> StoreResult<Vec<String>> {
        let mut query_builder = distinct_values_query(dimension, predicates);
        let values: Vec<String> = query_builder
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;
        Ok(values)
    }

    async fn count(&self, predicates: &[Predicate]) -> StoreResult<i64> {
        let mut query_builder = count_query(predicates);
        let count: i64 = query_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn fetch_page(
        &self,
        predicates: &[Predicate],
        sort: SortOrder,
        window: PageWindow,
    ) -> StoreResult<Vec<PhotoRow>> {
        let mut query_builder = page_query(predicates, sort, window);
        let rows = query_builder
            .build_query_as::<PhotoRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
