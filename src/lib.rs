pub mod cli;
pub mod core;
pub mod filters;
pub mod scraping;
pub mod setup;
pub mod tools;

// --- Primary core exports ---
pub use core::types;
pub use core::types::*;
pub use core::{CancelToken, SweepError};

pub use filters::{parse_terms, select_candidates};
pub use scraping::{OfflineSnapshot, PlaylistPage};
pub use tools::run_sweep;
