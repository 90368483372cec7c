use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// One independently filterable categorical attribute of a photo.
///
/// The declaration order is the canonical order used everywhere a list of
/// dimensions is produced (predicates, fan-out results, discovery endpoint).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    SportType,
    PhotoCategory,
    PlayType,
    ActionIntensity,
    Composition,
    TimeOfDay,
    Lighting,
    ColorTemperature,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::SportType,
        Dimension::PhotoCategory,
        Dimension::PlayType,
        Dimension::ActionIntensity,
        Dimension::Composition,
        Dimension::TimeOfDay,
        Dimension::Lighting,
        Dimension::ColorTemperature,
    ];

    /// Query parameter name, also the column name in the `photos` table.
    pub fn name(self) -> &'static str {
        match self {
            Dimension::SportType => "sport_type",
            Dimension::PhotoCategory => "photo_category",
            Dimension::PlayType => "play_type",
            Dimension::ActionIntensity => "action_intensity",
            Dimension::Composition => "composition",
            Dimension::TimeOfDay => "time_of_day",
            Dimension::Lighting => "lighting",
            Dimension::ColorTemperature => "color_temperature",
        }
    }

    pub fn column(self) -> &'static str {
        self.name()
    }

    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Dimension::SportType => &["sport"],
            Dimension::PhotoCategory => &["category"],
            Dimension::ActionIntensity => &["intensity"],
            _ => &[],
        }
    }

    pub fn values(self) -> &'static [&'static str] {
        match self {
            Dimension::SportType => &[
                "volleyball", "basketball", "soccer", "softball", "baseball", "football", "track",
                "swimming", "wrestling", "other",
            ],
            Dimension::PhotoCategory => &[
                "action", "celebration", "candid", "portrait", "warmup", "bench", "crowd",
                "ceremony", "team",
            ],
            Dimension::PlayType => &[
                "attack", "block", "dig", "set", "serve", "pass", "shot", "rebound", "dribble",
                "save", "tackle", "pitch", "swing", "sprint", "jump", "celebration", "other",
            ],
            Dimension::ActionIntensity => &["low", "medium", "high", "peak"],
            Dimension::Composition => &[
                "rule_of_thirds", "centered", "leading_lines", "symmetry", "frame_within_frame",
                "negative_space", "diagonal", "close_up", "wide",
            ],
            Dimension::TimeOfDay => &[
                "morning", "midday", "afternoon", "golden_hour", "evening", "night",
            ],
            Dimension::Lighting => &[
                "natural", "backlit", "dramatic", "soft", "harsh", "indoor", "flash", "low_light",
            ],
            Dimension::ColorTemperature => &["warm", "neutral", "cool", "mixed"],
        }
    }

    /// Resolves a wire name or alias (`sport`, `intensity`, ...) to a dimension.
    pub fn from_param(name: &str) -> Option<Dimension> {
        let name = name.trim().trim_end_matches("[]");
        Dimension::ALL
            .into_iter()
            .find(|d| d.name() == name || d.aliases().contains(&name))
    }

    pub fn accepts(self, value: &str) -> bool {
        self.values().contains(&value)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterError {
    #[error("Unknown filter dimension: {0}")]
    UnknownDimension(String),

    #[error("Invalid value '{value}' for {dimension} (expected one of: {expected})")]
    InvalidValue {
        dimension: Dimension,
        value: String,
        expected: String,
    },
}

/// The accepted values for one constrained dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selection {
    One(String),
    AnyOf(BTreeSet<String>),
}

impl Selection {
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Selection::One(v) => v == value,
            Selection::AnyOf(set) => set.contains(value),
        }
    }

    pub fn values(&self) -> Vec<&str> {
        match self {
            Selection::One(v) => vec![v.as_str()],
            Selection::AnyOf(set) => set.iter().map(String::as_str).collect(),
        }
    }
}

/// Normalize a caller supplied facet value into the canonical spelling.
///
/// `Golden-Hour`, `golden hour` and ` GOLDEN_HOUR ` all become `golden_hour`.
pub fn canonicalize(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Immutable description of the active constraints, one entry per constrained
/// dimension. Absent dimensions are unconstrained; an empty value list never
/// produces an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterState {
    selections: BTreeMap<Dimension, Selection>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `dimension` constrained to `values`.
    ///
    /// Values are canonicalized and validated against the dimension's value set.
    /// An empty list (or one made only of blanks) leaves the dimension unconstrained.
    pub fn with<I, S>(&self, dimension: Dimension, values: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut accepted = BTreeSet::new();
        for raw in values {
            let value = canonicalize(raw.as_ref());
            if value.is_empty() {
                continue;
            }
            if !dimension.accepts(&value) {
                return Err(FilterError::InvalidValue {
                    dimension,
                    value: raw.as_ref().to_string(),
                    expected: dimension.values().join(", "),
                });
            }
            accepted.insert(value);
        }

        let mut next = self.clone();
        match accepted.len() {
            0 => {
                next.selections.remove(&dimension);
            }
            1 => {
                let value = accepted.into_iter().next().unwrap_or_default();
                next.selections.insert(dimension, Selection::One(value));
            }
            _ => {
                next.selections.insert(dimension, Selection::AnyOf(accepted));
            }
        }
        Ok(next)
    }

    /// Builds a state from decoded query pairs. Repeated names accumulate and
    /// comma separated lists are split, so `intensity=high,peak` and
    /// `intensity=high&intensity=peak` are equivalent.
    pub fn from_pairs<'a, I>(pairs: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut raw: BTreeMap<Dimension, Vec<String>> = BTreeMap::new();
        for (name, value) in pairs {
            let dimension = Dimension::from_param(name)
                .ok_or_else(|| FilterError::UnknownDimension(name.to_string()))?;
            raw.entry(dimension)
                .or_default()
                .extend(value.split(',').map(str::to_string));
        }

        let mut state = FilterState::new();
        for (dimension, values) in raw {
            state = state.with(dimension, values)?;
        }
        Ok(state)
    }

    pub fn get(&self, dimension: Dimension) -> Option<&Selection> {
        self.selections.get(&dimension)
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Active constraints in canonical dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, &Selection)> {
        self.selections.iter().map(|(d, s)| (*d, s))
    }
}
