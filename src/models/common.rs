use validator::Validate;

use super::filters::{FilterError, FilterState};
use super::photos::{PageWindow, SortOrder};
use crate::config::Config;
use crate::errors::AppError;

const PAGING_KEYS: [&str; 4] = ["page", "limit", "sort", "include_total"];

/// Paging and sort parameters, validated before any query is planned.
#[derive(Debug, Default, Validate)]
pub struct PageParams {
    #[validate(range(min = 0, max = 100_000))]
    pub page: Option<i64>,
    #[validate(range(min = 0))]
    pub limit: Option<i64>,
    pub sort: Option<String>,
    pub include_total: Option<bool>,
}

/// A fully parsed gallery request: filters plus paging.
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryQuery {
    pub filters: FilterState,
    pub sort: SortOrder,
    pub page: i64,
    pub limit: i64,
    pub include_total: bool,
}

impl GalleryQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow::from_page(self.page, self.limit)
    }
}

/// Split a raw query string into decoded pairs. Repeated names are kept in order.
pub fn parse_query_pairs(query: &str) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Filter State only; paging keys are ignored so the facet endpoint accepts the
/// same query string as the photo endpoint.
pub fn parse_filter_state(query: &str) -> Result<FilterState, FilterError> {
    let pairs = parse_query_pairs(query);
    FilterState::from_pairs(
        pairs
            .iter()
            .filter(|(k, _)| !PAGING_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str())),
    )
}

fn parse_flag(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(AppError::BadRequest(format!(
            "include_total must be true or false, got '{}'",
            raw
        ))),
    }
}

pub fn parse_gallery_query(query: &str, config: &Config) -> Result<GalleryQuery, AppError> {
    let pairs = parse_query_pairs(query);

    let last = |key: &str| -> Option<&str> {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    };

    let parse_i64 = |key: &str| -> Result<Option<i64>, AppError> {
        last(key)
            .map(|v| {
                v.trim()
                    .parse::<i64>()
                    .map_err(|_| AppError::BadRequest(format!("{} must be an integer", key)))
            })
            .transpose()
    };

    let params = PageParams {
        page: parse_i64("page")?,
        limit: parse_i64("limit")?,
        sort: last("sort").map(str::to_string),
        include_total: last("include_total").map(parse_flag).transpose()?,
    };
    params
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Validation error: {}", e)))?;

    let limit = params.limit.unwrap_or(config.default_page_size);
    if limit > config.max_page_size {
        return Err(AppError::BadRequest(format!(
            "limit must be at most {}",
            config.max_page_size
        )));
    }

    let sort = match params.sort.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw.parse::<SortOrder>().map_err(AppError::BadRequest)?,
        _ => SortOrder::default(),
    };

    let filters = FilterState::from_pairs(
        pairs
            .iter()
            .filter(|(k, _)| !PAGING_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.as_str(), v.as_str())),
    )?;

    Ok(GalleryQuery {
        filters,
        sort,
        page: params.page.unwrap_or(0),
        limit,
        include_total: params.include_total.unwrap_or(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Dimension;

    #[test]
    fn repeated_and_bracketed_params_accumulate() {
        let query = "sport=volleyball&intensity%5B%5D=high&intensity%5B%5D=peak&page=2&limit=10";
        let parsed = parse_gallery_query(query, &Config::default()).unwrap();

        assert_eq!(parsed.page, 2);
        assert_eq!(parsed.limit, 10);
        assert_eq!(parsed.window().offset, 20);
        let intensity = parsed.filters.get(Dimension::ActionIntensity).unwrap();
        assert!(intensity.contains("high") && intensity.contains("peak"));
    }

    #[test]
    fn defaults_apply_when_paging_absent() {
        let parsed = parse_gallery_query("", &Config::default()).unwrap();
        assert_eq!(parsed.page, 0);
        assert_eq!(parsed.limit, Config::default().default_page_size);
        assert_eq!(parsed.sort, SortOrder::Newest);
        assert!(parsed.include_total);
        assert!(parsed.filters.is_empty());
    }

    #[test]
    fn bad_paging_is_rejected() {
        let config = Config::default();
        assert!(matches!(
            parse_gallery_query("page=-1", &config),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_gallery_query("limit=5000", &config),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_gallery_query("page=abc", &config),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            parse_gallery_query("sort=shuffle", &config),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn include_total_accepts_flags_and_rejects_garbage() {
        let config = Config::default();
        assert!(!parse_gallery_query("include_total=false", &config).unwrap().include_total);
        assert!(parse_gallery_query("include_total=1", &config).unwrap().include_total);
        assert!(matches!(
            parse_gallery_query("include_total=garbage", &config),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn unknown_filter_key_is_an_invalid_filter() {
        let err = parse_gallery_query("camera=canon", &Config::default()).unwrap_err();
        assert!(matches!(err, AppError::InvalidFilter(_)));
    }

    #[test]
    fn facet_parser_ignores_paging_keys() {
        let state = parse_filter_state("lighting=soft&page=4&sort=oldest").unwrap();
        assert!(state.get(Dimension::Lighting).is_some());
    }
}
