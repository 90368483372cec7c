use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::filters::Dimension;

/// One (value, count) pair of a dimension's breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FacetCount {
    pub value: String,
    pub count: i64,
}

impl FacetCount {
    pub fn new(value: impl Into<String>, count: i64) -> Self {
        Self {
            value: value.into(),
            count,
        }
    }
}

/// How a dimension's counts were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPath {
    /// Single server-side grouped count
    Grouped,
    /// Distinct values followed by one count per value
    Enumerated,
    /// Enumerated, but some values could not be counted and are missing
    Partial,
    /// The store failed; the dimension is reported empty
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionFacets {
    pub counts: Vec<FacetCount>,
    pub path: AggregationPath,
}

impl DimensionFacets {
    pub fn degraded() -> Self {
        Self {
            counts: Vec::new(),
            path: AggregationPath::Degraded,
        }
    }

    /// True when the counts are missing or incomplete because of a store failure.
    pub fn is_degraded(&self) -> bool {
        matches!(self.path, AggregationPath::Degraded | AggregationPath::Partial)
    }

    /// True when the counts came from the per-value fallback.
    pub fn used_fallback(&self) -> bool {
        matches!(self.path, AggregationPath::Enumerated | AggregationPath::Partial)
    }

    pub fn total(&self) -> i64 {
        self.counts.iter().map(|c| c.count).sum()
    }

    pub fn count_of(&self, value: &str) -> i64 {
        self.counts
            .iter()
            .find(|c| c.value == value)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// Facet Count Result for every dimension, keyed in canonical order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FacetCounts {
    pub dimensions: BTreeMap<Dimension, DimensionFacets>,
}

impl FacetCounts {
    pub fn get(&self, dimension: Dimension) -> Option<&DimensionFacets> {
        self.dimensions.get(&dimension)
    }

    pub fn degraded(&self) -> Vec<Dimension> {
        self.dimensions
            .iter()
            .filter(|(_, f)| f.is_degraded())
            .map(|(d, _)| *d)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacetCountsResponse {
    pub facets: BTreeMap<Dimension, Vec<FacetCount>>,
    pub paths: BTreeMap<Dimension, AggregationPath>,
    pub degraded: Vec<Dimension>,
}

impl From<FacetCounts> for FacetCountsResponse {
    fn from(counts: FacetCounts) -> Self {
        let degraded = counts.degraded();
        let mut facets = BTreeMap::new();
        let mut paths = BTreeMap::new();
        for (dimension, result) in counts.dimensions {
            paths.insert(dimension, result.path);
            facets.insert(dimension, result.counts);
        }
        Self {
            facets,
            paths,
            degraded,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionDescriptor {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub values: &'static [&'static str],
}

impl From<Dimension> for DimensionDescriptor {
    fn from(dimension: Dimension) -> Self {
        Self {
            name: dimension.name(),
            aliases: dimension.aliases(),
            values: dimension.values(),
        }
    }
}
