use serde::{Deserialize, Serialize};
use validator::Validate;

/// Public contact form submission.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct ContactMessage {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactReceipt {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}
