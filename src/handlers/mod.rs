pub mod facets;
pub mod health;
pub mod photos;
