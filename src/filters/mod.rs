//! Pure matching logic: term parsing, age normalization and the filter engine.

pub mod age;
pub mod engine;
pub mod terms;

pub use engine::select_candidates;
pub use terms::parse_terms;
