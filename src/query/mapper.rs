use chrono::{DateTime, Utc};
use url::Url;

use crate::models::{
    FacetMetadata, Photo, PhotoMetadata, PhotoRow, PhotoUrls, Provenance, QualityMetrics,
    QualityTier,
};

const UNKNOWN: &str = "unknown";

/// Stateless raw-record to `Photo` transform.
#[derive(Debug, Clone, Default)]
pub struct RowMapper {
    media_base_url: Option<Url>,
}

impl RowMapper {
    pub fn new(media_base_url: Option<Url>) -> Self {
        Self { media_base_url }
    }

    /// Maps every row, skipping (with a warning) rows without a usable display URL.
    pub fn map_rows(&self, rows: Vec<PhotoRow>) -> Vec<Photo> {
        let total = rows.len();
        let photos: Vec<Photo> = rows.into_iter().filter_map(|row| self.map_row(row)).collect();
        if photos.len() < total {
            tracing::warn!(
                "⚠️ ROW MAPPER: skipped {} of {} rows without a usable image url",
                total - photos.len(),
                total
            );
        }
        photos
    }

    pub fn map_row(&self, row: PhotoRow) -> Option<Photo> {
        let image = self.resolve_url(row.image_url.as_deref());
        let original = self.resolve_url(row.original_url.as_deref());
        let thumbnail = self.resolve_url(row.thumbnail_url.as_deref());

        let list = match image.clone().or_else(|| original.clone()) {
            Some(list) => list,
            None => {
                tracing::warn!("⚠️ Skipping photo {}: no usable display url", row.photo_key);
                return None;
            }
        };

        let urls = PhotoUrls {
            thumbnail: thumbnail.unwrap_or_else(|| list.clone()),
            original: original.unwrap_or_else(|| list.clone()),
            list,
        };

        let created_at = row
            .created_at
            .or(row.enriched_at)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let facets = FacetMetadata {
            sport_type: text_or_unknown(row.sport_type),
            photo_category: text_or_unknown(row.photo_category),
            play_type: text_or_unknown(row.play_type),
            action_intensity: text_or_unknown(row.action_intensity),
            composition: text_or_unknown(row.composition),
            time_of_day: text_or_unknown(row.time_of_day),
            lighting: text_or_unknown(row.lighting),
            color_temperature: text_or_unknown(row.color_temperature),
        };

        let quality = QualityMetrics {
            quality_tier: quality_tier(row.sharpness, row.composition_score),
            sharpness: row.sharpness.unwrap_or(0.0),
            composition_score: row.composition_score.unwrap_or(0.0),
            exposure_accuracy: row.exposure_accuracy.unwrap_or(0.0),
            emotional_impact: row.emotional_impact.unwrap_or(0.0),
            emotion: row
                .emotion
                .filter(|e| !e.trim().is_empty())
                .unwrap_or_else(|| "neutral".to_string()),
        };

        let provenance = Provenance {
            provider: text_or_unknown(row.enrichment_provider),
            cost: row.enrichment_cost.unwrap_or(0.0),
            confidence: row.enrichment_confidence.unwrap_or(0.0),
            enriched_at: row.enriched_at.unwrap_or(created_at),
        };

        Some(Photo {
            id: row.photo_key,
            urls,
            created_at,
            metadata: PhotoMetadata {
                facets,
                quality,
                provenance,
            },
        })
    }

    /// Absolute http(s) URLs pass through; relative paths are joined onto the
    /// media base. Anything else is unusable.
    fn resolve_url(&self, raw: Option<&str>) -> Option<String> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;

        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
            Ok(_) => None,
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .media_base_url
                .as_ref()
                .and_then(|base| base.join(raw.trim_start_matches('/')).ok())
                .map(|url| url.to_string()),
            Err(_) => None,
        }
    }
}

fn text_or_unknown(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Buckets the 0-10 sharpness and composition scores into a display tier.
pub fn quality_tier(sharpness: Option<f64>, composition_score: Option<f64>) -> QualityTier {
    let Some(sharpness) = sharpness else {
        return QualityTier::Unrated;
    };
    let score = match composition_score {
        Some(composition) => (sharpness + composition) / 2.0,
        None => sharpness,
    };

    if score >= 8.0 {
        QualityTier::Excellent
    } else if score >= 6.0 {
        QualityTier::Good
    } else {
        QualityTier::Fair
    }
}
