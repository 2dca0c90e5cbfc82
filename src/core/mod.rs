pub mod cancel;
pub mod config;
pub mod error;
pub mod host;
pub mod types;

pub use cancel::CancelToken;
pub use error::SweepError;
