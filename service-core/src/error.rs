use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Shown when nothing more specific is known about a failure.
pub const GENERIC_MESSAGE: &str = "Something went wrong. Please try again later";

/// Error taxonomy shared by every Trackify client crate.
///
/// Variants follow the transport outcome: no response at all, an HTTP status
/// class, or a local failure (decoding, configuration, token storage). Every
/// variant maps to a fixed, displayable sentence through [`AppError::user_message`].
#[derive(Debug, Clone, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Bad request: {message}")]
    BadRequest {
        message: String,
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unprocessable entity: {0}")]
    Unprocessable(String),

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected status ({status}): {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Build an error from a non-success HTTP response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let parsed = serde_json::from_str::<Value>(body).ok();
        let fields = parsed.as_ref().map(field_errors).unwrap_or_default();
        let message = parsed
            .as_ref()
            .and_then(server_message)
            .unwrap_or_else(|| plain_body(body));

        match status {
            400 => AppError::BadRequest { message, fields },
            401 => AppError::Unauthorized(message),
            403 => AppError::Forbidden(message),
            404 => AppError::NotFound(message),
            422 => AppError::Unprocessable(message),
            500..=599 => AppError::Server { status, message },
            _ => AppError::UnexpectedStatus { status, message },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        AppError::BadRequest {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// HTTP status behind this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::BadRequest { .. } => Some(400),
            AppError::Unauthorized(_) | AppError::SessionExpired => Some(401),
            AppError::Forbidden(_) => Some(403),
            AppError::NotFound(_) => Some(404),
            AppError::Unprocessable(_) => Some(422),
            AppError::Server { status, .. } | AppError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Message supplied by the server (or the local failure), possibly empty.
    pub fn detail(&self) -> String {
        match self {
            AppError::BadRequest { message, fields } => {
                if !message.is_empty() {
                    message.clone()
                } else {
                    format_fields(fields)
                }
            }
            AppError::Network(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Unprocessable(msg)
            | AppError::Decode(msg)
            | AppError::ConfigError(msg)
            | AppError::Storage(msg) => msg.clone(),
            AppError::Server { message, .. } | AppError::UnexpectedStatus { message, .. } => {
                message.clone()
            }
            AppError::SessionExpired => String::new(),
        }
    }

    /// Server detail when present, otherwise `fallback`.
    pub fn detail_or(&self, fallback: &str) -> String {
        let detail = self.detail();
        if detail.trim().is_empty() {
            fallback.to_string()
        } else {
            detail
        }
    }

    /// Fixed, displayable sentence for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(_) => {
                "Unable to reach the server. Please check your connection and try again."
                    .to_string()
            }
            AppError::BadRequest { message, fields } => {
                if !fields.is_empty() {
                    format_fields(fields)
                } else if !message.trim().is_empty() {
                    message.clone()
                } else {
                    "The request contains invalid data. Please check your input.".to_string()
                }
            }
            AppError::Unauthorized(_) => "You need to log in to access this resource".to_string(),
            AppError::SessionExpired => "Your session has expired. Please log in again.".to_string(),
            AppError::Forbidden(_) => {
                "You don't have permission to access this resource".to_string()
            }
            AppError::NotFound(_) => "The requested resource was not found".to_string(),
            AppError::Unprocessable(_) => {
                "The data you provided could not be processed".to_string()
            }
            AppError::Server { status, .. } => match status {
                502 => "Server is temporarily unavailable. Please try again later".to_string(),
                503 => "Service unavailable. Please try again later".to_string(),
                504 => "Server timeout. Please try again later".to_string(),
                _ => "Server error. Our team has been notified".to_string(),
            },
            AppError::UnexpectedStatus { .. }
            | AppError::Decode(_)
            | AppError::ConfigError(_)
            | AppError::Storage(_) => GENERIC_MESSAGE.to_string(),
        }
    }
}

/// Pull the most specific message out of a JSON error body.
fn server_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Array(items) => {
            let joined = join_values(items);
            (!joined.is_empty()).then_some(joined)
        }
        Value::Object(map) => {
            for key in ["detail", "error", "message"] {
                if let Some(Value::String(s)) = map.get(key) {
                    if !s.trim().is_empty() {
                        return Some(s.clone());
                    }
                }
            }
            let fields = field_errors(value);
            if fields.is_empty() {
                Some(value.to_string())
            } else {
                Some(format_fields(&fields))
            }
        }
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

/// Field-level validation errors in the backend's `{field: [messages]}` shape.
fn field_errors(value: &Value) -> BTreeMap<String, Vec<String>> {
    let mut fields = BTreeMap::new();
    if let Value::Object(map) = value {
        for (key, entry) in map {
            if matches!(key.as_str(), "detail" | "error" | "message") {
                continue;
            }
            match entry {
                Value::Array(items) => {
                    let messages: Vec<String> = items.iter().map(value_text).collect();
                    if !messages.is_empty() {
                        fields.insert(key.clone(), messages);
                    }
                }
                Value::String(s) => {
                    fields.insert(key.clone(), vec![s.clone()]);
                }
                _ => {}
            }
        }
    }
    fields
}

fn format_fields(fields: &BTreeMap<String, Vec<String>>) -> String {
    fields
        .iter()
        .map(|(key, messages)| format!("{}: {}", key, messages.join(", ")))
        .collect::<Vec<_>>()
        .join(". ")
}

fn join_values(items: &[Value]) -> String {
    items.iter().map(value_text).collect::<Vec<_>>().join(", ")
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn plain_body(body: &str) -> String {
    let trimmed = body.trim();
    // HTML error pages from proxies carry nothing useful for the user.
    if trimmed.starts_with('<') {
        String::new()
    } else {
        trimmed.to_string()
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        let fields: BTreeMap<String, Vec<String>> = err
            .field_errors()
            .into_iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        let message = if fields.is_empty() {
            err.to_string()
        } else {
            String::new()
        };

        AppError::BadRequest { message, fields }
    }
}
