use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Raw `photos` row as the store returns it. Every column except the key and
/// upload sequence may be missing; the row mapper decides what survives.
#[derive(Debug, Clone, Default, PartialEq, FromRow)]
pub struct PhotoRow {
    pub photo_key: String,
    pub upload_seq: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub image_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub original_url: Option<String>,
    // Facet columns
    pub sport_type: Option<String>,
    pub photo_category: Option<String>,
    pub play_type: Option<String>,
    pub action_intensity: Option<String>,
    pub composition: Option<String>,
    pub time_of_day: Option<String>,
    pub lighting: Option<String>,
    pub color_temperature: Option<String>,
    // Internal quality fields (sharpness doubles as the enriched marker)
    pub sharpness: Option<f64>,
    pub composition_score: Option<f64>,
    pub exposure_accuracy: Option<f64>,
    pub emotional_impact: Option<f64>,
    pub emotion: Option<String>,
    // Provenance
    pub enrichment_provider: Option<String>,
    pub enrichment_cost: Option<f64>,
    pub enrichment_confidence: Option<f64>,
    pub enriched_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoUrls {
    /// Grid/list resolution
    pub list: String,
    /// Thumbnail or blur placeholder
    pub thumbnail: String,
    pub original: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FacetMetadata {
    pub sport_type: String,
    pub photo_category: String,
    pub play_type: String,
    pub action_intensity: String,
    pub composition: String,
    pub time_of_day: String,
    pub lighting: String,
    pub color_temperature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub sharpness: f64,
    pub composition_score: f64,
    pub exposure_accuracy: f64,
    pub emotional_impact: f64,
    pub emotion: String,
    pub quality_tier: QualityTier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Excellent,
    Good,
    Fair,
    Unrated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub provider: String,
    pub cost: f64,
    pub confidence: f64,
    pub enriched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub facets: FacetMetadata,
    pub quality: QualityMetrics,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub urls: PhotoUrls,
    pub created_at: DateTime<Utc>,
    pub metadata: PhotoMetadata,
}

/// Result page ordering. Every variant ends in the upload sequence so ties
/// never reorder between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    PlayType,
    Intensity,
    Sharpness,
    Impact,
}

impl SortOrder {
    pub const ALL: [SortOrder; 6] = [
        SortOrder::Newest,
        SortOrder::Oldest,
        SortOrder::PlayType,
        SortOrder::Intensity,
        SortOrder::Sharpness,
        SortOrder::Impact,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Newest => "newest",
            SortOrder::Oldest => "oldest",
            SortOrder::PlayType => "play_type",
            SortOrder::Intensity => "intensity",
            SortOrder::Sharpness => "sharpness",
            SortOrder::Impact => "impact",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        SortOrder::ALL
            .into_iter()
            .find(|order| order.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<&str> = SortOrder::ALL.iter().map(|o| o.as_str()).collect();
                format!("Unknown sort '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Intensity sort ranks, highest first. Values not listed rank 0 and sort last.
pub const INTENSITY_RANKS: [(&str, i32); 4] = [("peak", 4), ("high", 3), ("medium", 2), ("low", 1)];

/// Rank used by the intensity sort; unknown values sort last.
pub fn intensity_rank(value: Option<&str>) -> i32 {
    value
        .and_then(|v| INTENSITY_RANKS.iter().find(|(name, _)| *name == v))
        .map(|(_, rank)| *rank)
        .unwrap_or(0)
}

/// Offset + limit window over the ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWindow {
    pub offset: i64,
    pub limit: i64,
}

impl PageWindow {
    pub fn from_page(page: i64, limit: i64) -> Self {
        Self {
            offset: page.saturating_mul(limit),
            limit,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.limit <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPage {
    pub items: Vec<Photo>,
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
    pub sort: SortOrder,
    pub total: Option<i64>,
    pub total_pages: Option<i64>,
    /// True when the store failed and the page is empty or incomplete for that reason
    pub degraded: bool,
}
