use serde::Deserialize;

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// Backend root, e.g. `https://trackify.example.com/api`.
    pub base_url: String,
    #[serde(default = "default_refresh_path")]
    pub refresh_path: String,
    #[serde(default = "default_csrf_header")]
    pub csrf_header: String,
    /// Whole-request timeout. Unset means no timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            refresh_path: default_refresh_path(),
            csrf_header: default_csrf_header(),
            timeout_secs: None,
        }
    }
}

fn default_refresh_path() -> String {
    "/users/token/refresh/".to_string()
}

fn default_csrf_header() -> String {
    "X-CSRFToken".to_string()
}
