pub mod executor;
pub mod export;
pub mod loader;
pub mod report;
pub mod sweep;

pub use sweep::run_sweep;
