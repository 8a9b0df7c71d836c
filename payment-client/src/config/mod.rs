use crate::adapters::stripe::DEFAULT_STRIPE_API_BASE;
use crate::adapters::paypal::DEFAULT_APPROVAL_BASE;
use api_client::models::currency::Currency;
use api_client::ApiSettings;
use secrecy::Secret;
use serde::Deserialize;
use service_core::config::load_configuration;
use service_core::error::AppError;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub api: ApiSettings,
    pub checkout: CheckoutSettings,
    #[serde(default)]
    pub stripe: StripeSettings,
    #[serde(default)]
    pub paypal: PayPalSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CheckoutSettings {
    /// Public site the gateways return to.
    pub origin: String,
    /// Overrides the profile currency (`pkr` or `usd`).
    #[serde(default)]
    pub currency: Option<String>,
}

impl CheckoutSettings {
    pub fn currency(&self) -> Option<Currency> {
        self.currency
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .map(|c| Currency::from_preference(Some(c)))
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct StripeSettings {
    #[serde(default = "default_stripe_api_base")]
    pub api_base: String,
    /// Payment method used by the terminal card form, e.g. `pm_card_visa`.
    #[serde(default)]
    pub payment_method: Option<String>,
}

impl Default for StripeSettings {
    fn default() -> Self {
        Self {
            api_base: default_stripe_api_base(),
            payment_method: None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct PayPalSettings {
    #[serde(default = "default_approval_base")]
    pub approval_base: String,
}

impl Default for PayPalSettings {
    fn default() -> Self {
        Self {
            approval_base: default_approval_base(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    #[serde(default = "default_token_file")]
    pub token_file: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<Secret<String>>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_file: default_token_file(),
            email: None,
            password: None,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        load_configuration("payment-client")
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_stripe_api_base() -> String {
    DEFAULT_STRIPE_API_BASE.to_string()
}

fn default_approval_base() -> String {
    DEFAULT_APPROVAL_BASE.to_string()
}

fn default_token_file() -> String {
    ".trackify/session.json".to_string()
}
