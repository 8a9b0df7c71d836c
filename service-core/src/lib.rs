//! service-core: Shared infrastructure for the Trackify client crates.
pub mod config;
pub mod error;
pub mod observability;

pub use error::AppError;

pub use serde;
pub use serde_json;
pub use tracing;
pub use validator;
