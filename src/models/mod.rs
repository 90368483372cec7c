// Re-export all model types from submodules
mod common;
mod facets;
mod filters;
mod photos;

pub use common::*;
pub use facets::*;
pub use filters::*;
pub use photos::*;
