use crate::models::{Dimension, FilterState, Selection};

/// Atomic, structured predicate. Values are always carried as data so the store
/// can bind them; nothing here is ever rendered into query text directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Predicate {
    /// Base eligibility: internal quality fields are populated (sharpness is set)
    Enriched,
    Equals(Dimension, String),
    In(Dimension, Vec<String>),
}

impl Predicate {
    pub fn dimension(&self) -> Option<Dimension> {
        match self {
            Predicate::Enriched => None,
            Predicate::Equals(d, _) | Predicate::In(d, _) => Some(*d),
        }
    }

    /// Accepted values of a facet predicate (empty for the eligibility gate).
    pub fn values(&self) -> Vec<&str> {
        match self {
            Predicate::Enriched => Vec::new(),
            Predicate::Equals(_, v) => vec![v.as_str()],
            Predicate::In(_, vs) => vs.iter().map(String::as_str).collect(),
        }
    }
}

impl From<(Dimension, &Selection)> for Predicate {
    fn from((dimension, selection): (Dimension, &Selection)) -> Self {
        match selection {
            Selection::One(value) => Predicate::Equals(dimension, value.clone()),
            Selection::AnyOf(values) => Predicate::In(dimension, values.iter().cloned().collect()),
        }
    }
}

/// Predicate list for a Filter State.
///
/// `exclude` names the dimension whose counts are being computed; its own
/// constraint is left out. Pass `None` for the result-page query. The
/// eligibility gate always comes first, followed by facet predicates in
/// canonical dimension order.
pub fn build_conditions(filters: &FilterState, exclude: Option<Dimension>) -> Vec<Predicate> {
    let mut predicates = vec![Predicate::Enriched];
    predicates.extend(
        filters
            .iter()
            .filter(|(dimension, _)| Some(*dimension) != exclude)
            .map(Predicate::from),
    );
    predicates
}
