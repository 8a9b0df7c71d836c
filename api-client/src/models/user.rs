use super::currency::Currency;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use validator::{Validate, ValidationError};

/// JWT pair issued by the backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

impl fmt::Debug for Tokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokens")
            .field("access", &"[REDACTED]")
            .field("refresh", &self.refresh.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// Display/payment currency preference (`pkr`, `usd`).
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub profile: Option<Profile>,
}

impl User {
    pub fn currency(&self) -> Currency {
        Currency::from_preference(self.profile.as_ref().and_then(|p| p.currency.as_deref()))
    }

    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: Tokens,
}

#[derive(Debug, Serialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[serde(serialize_with = "expose")]
    #[validate(custom(function = "not_blank"))]
    pub password: Secret<String>,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: Secret<String>) -> Self {
        Self {
            email: email.into(),
            password,
        }
    }
}

#[derive(Debug, Serialize, Validate)]
#[validate(schema(function = "passwords_match", skip_on_field_errors = false))]
pub struct RegisterRequest {
    #[validate(email(message = "Please enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(serialize_with = "expose")]
    #[validate(custom(function = "long_enough"))]
    pub password: Secret<String>,
    #[serde(serialize_with = "expose")]
    pub password2: Secret<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    /// Present when the backend rotates refresh tokens.
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResendVerificationRequest<'a> {
    pub email: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default, alias = "detail")]
    pub message: Option<String>,
}

/// Partial profile update; unset fields are left untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

fn expose<S: Serializer>(secret: &Secret<String>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn not_blank(password: &Secret<String>) -> Result<(), ValidationError> {
    if password.expose_secret().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("Password is required".into());
        return Err(err);
    }
    Ok(())
}

fn long_enough(password: &Secret<String>) -> Result<(), ValidationError> {
    if password.expose_secret().chars().count() < 8 {
        let mut err = ValidationError::new("length");
        err.message = Some("Password must be at least 8 characters".into());
        return Err(err);
    }
    Ok(())
}

fn passwords_match(request: &RegisterRequest) -> Result<(), ValidationError> {
    if request.password.expose_secret() != request.password2.expose_secret() {
        let mut err = ValidationError::new("password_mismatch");
        err.message = Some("Password fields didn't match.".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_debug_is_redacted() {
        let tokens = Tokens {
            access: "eyJhbGciOi.access".into(),
            refresh: Some("eyJhbGciOi.refresh".into()),
        };
        let printed = format!("{:?}", tokens);
        assert!(!printed.contains("eyJ"));
    }

    #[test]
    fn login_request_serializes_password() {
        let request = LoginRequest::new("owner@example.com", Secret::new("hunter22".into()));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["password"], "hunter22");
    }

    #[test]
    fn mismatched_passwords_fail_validation() {
        let request = RegisterRequest {
            email: "owner@example.com".into(),
            username: "owner".into(),
            password: Secret::new("longenough1".into()),
            password2: Secret::new("longenough2".into()),
            first_name: None,
            last_name: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn currency_follows_profile() {
        let user: User = serde_json::from_str(
            r#"{"id": 4, "email": "a@b.co", "profile": {"currency": "usd"}}"#,
        )
        .unwrap();
        assert_eq!(user.currency().code(), "usd");

        let bare: User = serde_json::from_str(r#"{"id": 5, "email": "c@d.co"}"#).unwrap();
        assert_eq!(bare.currency().code(), "pkr");
        assert_eq!(bare.display_name(), "");
    }
}
