//! Stripe card checkout.
//!
//! The SDK is abstracted behind [`StripeSdk`] so the adapter runs against the
//! public REST API ([`StripeRestSdk`]) or a test double ([`MockStripeSdk`]).

use super::{describe, retry_settlement, settled, BillingDetails, CheckoutAdapter, CheckoutRequest};
use crate::gateway::Gateway;
use crate::reconcile::Reconciler;
use crate::session::{PaymentSession, SessionCoordinator};
use crate::state::{CheckoutError, CheckoutState, PaymentReceipt};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

pub const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";

pub const NOT_LOADED_MESSAGE: &str = "Payment system is still initializing. Please try again in a moment.";
pub const CARD_REQUIRED_MESSAGE: &str = "Card information is required";
pub const MISSING_SECRET_MESSAGE: &str = "Missing client_secret in payment session response";
pub const INIT_FAILED_MESSAGE: &str = "Failed to initialize payment";
pub const UNAVAILABLE_MESSAGE: &str = "Unable to initialize payment. Please try again later.";
pub const UNEXPECTED_MESSAGE: &str =
    "An unexpected error occurred while processing your payment. Please try again later.";
pub const FALLBACK_MESSAGE: &str = "An error occurred with your payment. Please try again.";

/// Payer-facing text for a Stripe error. Mapped by `code`; otherwise the
/// SDK's own message; otherwise a generic sentence. Never empty.
pub fn card_error_message(code: Option<&str>, message: Option<&str>) -> String {
    let mapped = code.and_then(|code| match code {
        "card_declined" => Some("Your card was declined. Please try another payment method."),
        "expired_card" => Some("Your card has expired. Please use another card."),
        "incorrect_cvc" => Some("The security code (CVC) is incorrect. Please check and try again."),
        "processing_error" => Some("An error occurred while processing your card. Please try again."),
        "insufficient_funds" => Some("Your card has insufficient funds. Please use another card."),
        "invalid_expiry_year" => Some("The expiration year is invalid. Please check and try again."),
        "invalid_expiry_month" => Some("The expiration month is invalid. Please check and try again."),
        "invalid_number" => Some("The card number is invalid. Please check and try again."),
        "invalid_cvc" => Some("The security code (CVC) is invalid. Please check and try again."),
        _ => None,
    });

    mapped
        .map(str::to_string)
        .or_else(|| {
            message
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Error)]
pub enum StripeSdkError {
    /// Stripe answered with an error object (card errors and the like).
    #[error("Stripe API error ({code:?}): {message:?}")]
    Api {
        code: Option<String>,
        message: Option<String>,
    },

    #[error("Stripe request failed: {0}")]
    Transport(String),

    #[error("Failed to load Stripe: {0}")]
    Load(String),
}

/// Raw card fields. Kept secret so they never reach logs.
#[derive(Debug)]
pub struct CardDetails {
    pub number: Secret<String>,
    pub exp_month: u8,
    pub exp_year: u16,
    pub cvc: Secret<String>,
}

impl Clone for CardDetails {
    fn clone(&self) -> Self {
        Self {
            number: Secret::new(self.number.expose_secret().clone()),
            exp_month: self.exp_month,
            exp_year: self.exp_year,
            cvc: Secret::new(self.cvc.expose_secret().clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CardInput {
    /// A saved or test payment method, e.g. `pm_card_visa`.
    PaymentMethod(String),
    Card(CardDetails),
}

/// Where card input comes from (a form, a prompt, a fixture).
#[async_trait]
pub trait CardForm: Send + Sync {
    /// `None` when the payer has not entered a card.
    async fn collect(&self) -> Option<CardInput>;
}

/// Card form that always yields the same input.
pub struct StaticCardForm {
    input: Option<CardInput>,
}

impl StaticCardForm {
    pub fn new(input: Option<CardInput>) -> Self {
        Self { input }
    }

    pub fn payment_method(id: impl Into<String>) -> Self {
        Self::new(Some(CardInput::PaymentMethod(id.into())))
    }

    pub fn empty() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl CardForm for StaticCardForm {
    async fn collect(&self) -> Option<CardInput> {
        self.input.clone()
    }
}

#[async_trait]
pub trait StripeSdk: Send + Sync {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardInput,
        billing: &BillingDetails,
    ) -> Result<PaymentIntent, StripeSdkError>;
}

#[async_trait]
pub trait StripeSdkLoader: Send + Sync {
    async fn load(&self, publishable_key: &str) -> Result<Arc<dyn StripeSdk>, StripeSdkError>;
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Confirms PaymentIntents through Stripe's public REST API using the
/// publishable key, the same call Stripe.js makes from a browser.
pub struct StripeRestSdk {
    client: Client,
    api_base: String,
    publishable_key: String,
}

impl StripeRestSdk {
    pub fn new(client: Client, api_base: impl Into<String>, publishable_key: impl Into<String>) -> Self {
        Self {
            client,
            api_base: api_base.into(),
            publishable_key: publishable_key.into(),
        }
    }
}

/// `pi_123_secret_456` belongs to PaymentIntent `pi_123`.
pub fn intent_id_from_secret(client_secret: &str) -> Option<&str> {
    client_secret
        .split_once("_secret_")
        .map(|(id, _)| id)
        .filter(|id| !id.is_empty())
}

/// Raw cards carry the invoice's billing details on the new payment method.
/// A saved payment method keeps the billing details it was created with,
/// since Stripe does not let a confirmation rewrite them; only the email
/// travels, as the receipt address.
fn confirm_form(client_secret: &str, card: &CardInput, billing: &BillingDetails) -> Vec<(&'static str, String)> {
    let mut form = vec![("client_secret", client_secret.to_string())];
    match card {
        CardInput::PaymentMethod(id) => {
            form.push(("payment_method", id.clone()));
            if !billing.email.is_empty() {
                form.push(("receipt_email", billing.email.clone()));
            }
        }
        CardInput::Card(details) => {
            form.push(("payment_method_data[type]", "card".to_string()));
            form.push(("payment_method_data[card][number]", details.number.expose_secret().clone()));
            form.push(("payment_method_data[card][exp_month]", details.exp_month.to_string()));
            form.push(("payment_method_data[card][exp_year]", details.exp_year.to_string()));
            form.push(("payment_method_data[card][cvc]", details.cvc.expose_secret().clone()));
            form.push(("payment_method_data[billing_details][name]", billing.name.clone()));
            if !billing.email.is_empty() {
                form.push(("payment_method_data[billing_details][email]", billing.email.clone()));
            }
        }
    }
    form
}

#[async_trait]
impl StripeSdk for StripeRestSdk {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        card: &CardInput,
        billing: &BillingDetails,
    ) -> Result<PaymentIntent, StripeSdkError> {
        let intent_id = intent_id_from_secret(client_secret).ok_or_else(|| StripeSdkError::Api {
            code: None,
            message: Some("Invalid payment session".to_string()),
        })?;

        let url = format!(
            "{}/v1/payment_intents/{}/confirm",
            self.api_base.trim_end_matches('/'),
            intent_id
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.publishable_key)
            .form(&confirm_form(client_secret, card, billing))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(intent_id = %intent_id, error = %e, "Failed to reach Stripe");
                StripeSdkError::Transport(e.to_string())
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StripeSdkError::Transport(e.to_string()))?;

        if status.is_success() {
            return serde_json::from_str::<PaymentIntent>(&body)
                .map_err(|e| StripeSdkError::Transport(format!("Unreadable Stripe response: {}", e)));
        }

        match serde_json::from_str::<StripeErrorEnvelope>(&body) {
            Ok(envelope) => {
                tracing::warn!(
                    intent_id = %intent_id,
                    status = status.as_u16(),
                    code = ?envelope.error.code,
                    "Stripe rejected the confirmation"
                );
                Err(StripeSdkError::Api {
                    code: envelope.error.code,
                    message: envelope.error.message,
                })
            }
            Err(_) => Err(StripeSdkError::Transport(format!(
                "Stripe returned status {}",
                status
            ))),
        }
    }
}

/// Builds [`StripeRestSdk`] instances for a publishable key.
pub struct StripeRestLoader {
    client: Client,
    api_base: String,
}

impl StripeRestLoader {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into(),
        }
    }
}

impl Default for StripeRestLoader {
    fn default() -> Self {
        Self::new(DEFAULT_STRIPE_API_BASE)
    }
}

#[async_trait]
impl StripeSdkLoader for StripeRestLoader {
    async fn load(&self, publishable_key: &str) -> Result<Arc<dyn StripeSdk>, StripeSdkError> {
        if publishable_key.trim().is_empty() {
            return Err(StripeSdkError::Load("publishable key is empty".to_string()));
        }
        Ok(Arc::new(StripeRestSdk::new(
            self.client.clone(),
            self.api_base.clone(),
            publishable_key,
        )))
    }
}

/// Mock Stripe SDK for testing
pub struct MockStripeSdk {
    outcome: Result<PaymentIntent, StripeSdkError>,
    confirm_count: AtomicU64,
    last_client_secret: Mutex<Option<String>>,
}

impl MockStripeSdk {
    pub fn new(outcome: Result<PaymentIntent, StripeSdkError>) -> Self {
        Self {
            outcome,
            confirm_count: AtomicU64::new(0),
            last_client_secret: Mutex::new(None),
        }
    }

    pub fn succeeding(intent_id: &str) -> Self {
        Self::with_status(intent_id, "succeeded")
    }

    pub fn with_status(intent_id: &str, status: &str) -> Self {
        Self::new(Ok(PaymentIntent {
            id: intent_id.to_string(),
            status: status.to_string(),
        }))
    }

    pub fn declining(code: Option<&str>, message: Option<&str>) -> Self {
        Self::new(Err(StripeSdkError::Api {
            code: code.map(str::to_string),
            message: message.map(str::to_string),
        }))
    }

    pub fn unreachable() -> Self {
        Self::new(Err(StripeSdkError::Transport("connection reset".to_string())))
    }

    pub fn confirm_count(&self) -> u64 {
        self.confirm_count.load(Ordering::SeqCst)
    }

    pub fn last_client_secret(&self) -> Option<String> {
        self.last_client_secret
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StripeSdk for MockStripeSdk {
    async fn confirm_card_payment(
        &self,
        client_secret: &str,
        _card: &CardInput,
        billing: &BillingDetails,
    ) -> Result<PaymentIntent, StripeSdkError> {
        self.confirm_count.fetch_add(1, Ordering::SeqCst);
        *self
            .last_client_secret
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(client_secret.to_string());

        tracing::info!(billing_name = %billing.name, "[MOCK] Stripe card payment would be confirmed");
        self.outcome.clone()
    }
}

/// Mock loader handing out a shared [`MockStripeSdk`].
pub struct MockStripeLoader {
    sdk: Option<Arc<MockStripeSdk>>,
    load_count: AtomicU64,
}

impl MockStripeLoader {
    pub fn new(sdk: Arc<MockStripeSdk>) -> Self {
        Self {
            sdk: Some(sdk),
            load_count: AtomicU64::new(0),
        }
    }

    /// A loader whose script never loads.
    pub fn failing() -> Self {
        Self {
            sdk: None,
            load_count: AtomicU64::new(0),
        }
    }

    pub fn load_count(&self) -> u64 {
        self.load_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StripeSdkLoader for MockStripeLoader {
    async fn load(&self, _publishable_key: &str) -> Result<Arc<dyn StripeSdk>, StripeSdkError> {
        self.load_count.fetch_add(1, Ordering::SeqCst);
        match &self.sdk {
            Some(sdk) => Ok(sdk.clone() as Arc<dyn StripeSdk>),
            None => Err(StripeSdkError::Load("[MOCK] Stripe failed to load".to_string())),
        }
    }
}

/// Card checkout: `Idle → Initializing → Ready → Submitting → Succeeded |
/// Failed | CapturedButUnconfirmed`.
pub struct StripeAdapter {
    gateway: Gateway,
    coordinator: SessionCoordinator,
    reconciler: Reconciler,
    loader: Arc<dyn StripeSdkLoader>,
    card_form: Arc<dyn CardForm>,
    state: CheckoutState,
    sdk: Option<Arc<dyn StripeSdk>>,
    session: Option<PaymentSession>,
    billing: Option<BillingDetails>,
    card: Option<CardInput>,
}

impl StripeAdapter {
    pub fn new(
        publishable_key: Option<String>,
        coordinator: SessionCoordinator,
        reconciler: Reconciler,
        loader: Arc<dyn StripeSdkLoader>,
        card_form: Arc<dyn CardForm>,
    ) -> Self {
        Self {
            gateway: Gateway::Stripe {
                publishable_key,
                display_name: "Stripe".to_string(),
            },
            coordinator,
            reconciler,
            loader,
            card_form,
            state: CheckoutState::Idle,
            sdk: None,
            session: None,
            billing: None,
            card: None,
        }
    }

    fn publishable_key(&self) -> Option<String> {
        match &self.gateway {
            Gateway::Stripe { publishable_key, .. } => publishable_key.clone(),
            _ => None,
        }
    }

    fn fail_initialization(&mut self, message: &str) -> CheckoutError {
        tracing::warn!(reason = %message, "Stripe checkout could not be initialized");
        self.state = CheckoutState::Failed(message.to_string());
        CheckoutError::Initialization(message.to_string())
    }

    fn fail_payment(&mut self, message: String) -> CheckoutError {
        tracing::warn!(reason = %message, "Stripe payment failed");
        self.state = CheckoutState::Failed(message.clone());
        CheckoutError::Payment(message)
    }
}

#[async_trait]
impl CheckoutAdapter for StripeAdapter {
    fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    fn state(&self) -> CheckoutState {
        self.state.clone()
    }

    fn session(&self) -> Option<&PaymentSession> {
        self.session.as_ref()
    }

    async fn initialize(&mut self, request: &CheckoutRequest) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::Idle {
            return Err(CheckoutError::invalid(&self.state, "initialize"));
        }
        self.state = CheckoutState::Initializing;
        self.billing = Some(request.billing.clone());

        let Some(publishable_key) = self.publishable_key() else {
            return Err(self.fail_initialization(UNAVAILABLE_MESSAGE));
        };

        let (session, sdk) = tokio::join!(
            self.coordinator.create(request.session.clone()),
            self.loader.load(&publishable_key)
        );

        let session = match session {
            Ok(session) => session,
            Err(e) => {
                let message = describe(&e, INIT_FAILED_MESSAGE);
                return Err(self.fail_initialization(&message));
            }
        };

        if session.client_secret.is_none() {
            return Err(self.fail_initialization(MISSING_SECRET_MESSAGE));
        }

        let sdk = match sdk {
            Ok(sdk) => sdk,
            Err(e) => {
                tracing::error!(error = %e, "Stripe SDK failed to load");
                return Err(self.fail_initialization(INIT_FAILED_MESSAGE));
            }
        };

        tracing::info!(
            invoice_id = %request.invoice_id,
            payment_id = %session.payment_id,
            "Stripe checkout ready"
        );
        self.session = Some(session);
        self.sdk = Some(sdk);
        self.state = CheckoutState::Ready;
        Ok(())
    }

    async fn collect_instrument(&mut self) -> Result<(), CheckoutError> {
        if self.sdk.is_none() {
            return Err(CheckoutError::NotReady(NOT_LOADED_MESSAGE.to_string()));
        }
        if self.state != CheckoutState::Ready {
            return Err(CheckoutError::invalid(&self.state, "collect card details"));
        }

        match self.card_form.collect().await {
            Some(card) => {
                self.card = Some(card);
                Ok(())
            }
            None => Err(CheckoutError::MissingInput(CARD_REQUIRED_MESSAGE.to_string())),
        }
    }

    async fn confirm(&mut self) -> Result<PaymentReceipt, CheckoutError> {
        let (Some(sdk), Some(session)) = (self.sdk.clone(), self.session.clone()) else {
            return Err(CheckoutError::NotReady(NOT_LOADED_MESSAGE.to_string()));
        };
        if self.state != CheckoutState::Ready {
            return Err(CheckoutError::invalid(&self.state, "confirm"));
        }
        let Some(card) = self.card.clone() else {
            return Err(CheckoutError::MissingInput(CARD_REQUIRED_MESSAGE.to_string()));
        };
        let Some(client_secret) = session.client_secret.as_deref() else {
            return Err(self.fail_initialization(MISSING_SECRET_MESSAGE));
        };
        let billing = self.billing.clone().unwrap_or_else(|| BillingDetails {
            name: "Client".to_string(),
            email: String::new(),
        });

        self.state = CheckoutState::Submitting;
        tracing::info!(payment_id = %session.payment_id, "Confirming card payment");

        match sdk.confirm_card_payment(client_secret, &card, &billing).await {
            Ok(intent) if intent.status == "succeeded" => {
                self.state = self.reconciler.settle(session.payment_id, &intent.id).await;
                settled(&self.state)
            }
            Ok(intent) => Err(self.fail_payment(format!("Payment status: {}", intent.status))),
            Err(StripeSdkError::Api { code, message }) => {
                Err(self.fail_payment(card_error_message(code.as_deref(), message.as_deref())))
            }
            Err(e) => {
                tracing::error!(error = %e, "Unexpected failure confirming card payment");
                Err(self.fail_payment(UNEXPECTED_MESSAGE.to_string()))
            }
        }
    }

    async fn retry_reconciliation(&mut self) -> Result<PaymentReceipt, CheckoutError> {
        retry_settlement(&self.reconciler, &mut self.state).await
    }

    fn cancel(&mut self) {
        if !self.state.is_terminal() {
            tracing::info!("Stripe checkout cancelled");
            self.state = CheckoutState::Cancelled;
        }
    }

    fn reset(&mut self) {
        self.state = CheckoutState::Idle;
        self.sdk = None;
        self.session = None;
        self.card = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_are_mapped() {
        assert_eq!(
            card_error_message(Some("card_declined"), Some("Your card was declined.")),
            "Your card was declined. Please try another payment method."
        );
        assert_eq!(
            card_error_message(Some("invalid_cvc"), None),
            "The security code (CVC) is invalid. Please check and try again."
        );
    }

    #[test]
    fn unknown_code_uses_sdk_message_then_fallback() {
        assert_eq!(
            card_error_message(Some("authentication_required"), Some("Authentication required.")),
            "Authentication required."
        );
        assert_eq!(card_error_message(None, Some("  ")), FALLBACK_MESSAGE);
        assert_eq!(card_error_message(None, None), FALLBACK_MESSAGE);
    }

    #[test]
    fn intent_id_is_the_secret_prefix() {
        assert_eq!(intent_id_from_secret("pi_3Nabc_secret_XYZ"), Some("pi_3Nabc"));
        assert_eq!(intent_id_from_secret("garbage"), None);
    }

    #[test]
    fn raw_card_form_carries_billing_details() {
        let card = CardInput::Card(CardDetails {
            number: Secret::new("4242424242424242".into()),
            exp_month: 12,
            exp_year: 2030,
            cvc: Secret::new("123".into()),
        });
        let billing = BillingDetails {
            name: "Client".into(),
            email: String::new(),
        };
        let form = confirm_form("pi_1_secret_2", &card, &billing);

        assert!(form.contains(&("payment_method_data[card][number]", "4242424242424242".to_string())));
        assert!(form.contains(&("payment_method_data[billing_details][name]", "Client".to_string())));
        assert!(!form.iter().any(|(k, _)| *k == "payment_method_data[billing_details][email]"));
    }

    #[test]
    fn saved_method_sends_receipt_email_only() {
        let card = CardInput::PaymentMethod("pm_card_visa".into());
        let billing = BillingDetails {
            name: "Acme Traders".into(),
            email: "accounts@acme.test".into(),
        };
        let form = confirm_form("pi_1_secret_2", &card, &billing);

        assert!(form.contains(&("payment_method", "pm_card_visa".to_string())));
        assert!(form.contains(&("receipt_email", "accounts@acme.test".to_string())));
        assert!(!form.iter().any(|(k, _)| k.starts_with("payment_method_data")));

        let anonymous = BillingDetails {
            name: "Client".into(),
            email: String::new(),
        };
        let form = confirm_form("pi_1_secret_2", &card, &anonymous);
        assert!(!form.iter().any(|(k, _)| *k == "receipt_email"));
    }

    #[test]
    fn card_details_debug_is_redacted() {
        let details = CardDetails {
            number: Secret::new("4242424242424242".into()),
            exp_month: 1,
            exp_year: 2031,
            cvc: Secret::new("987".into()),
        };
        assert!(!format!("{:?}", details).contains("4242"));
    }
}
