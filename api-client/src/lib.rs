//! Typed client for the Trackify invoicing and expense backend.
//!
//! [`ApiClient`] wraps `reqwest` with bearer-token injection, CSRF headers and
//! transparent access-token refresh. Resource endpoints hang off it as thin
//! borrowed views (`client.invoices()`, `client.payments()`, ...).

pub mod api;
pub mod auth;
pub mod config;
pub mod http;
pub mod models;

pub use auth::{AuthContext, SessionStatus};
pub use config::ApiSettings;
pub use http::ApiClient;
pub use service_core::error::AppError;
