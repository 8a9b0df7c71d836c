//! End-to-end payment workflow test harness.
//!
//! Each test gets its own mock Trackify backend and mock Stripe API, a fresh
//! client session, and a [`CheckoutFlow`] wired to the real Stripe REST SDK
//! pointed at the mock.

use anyhow::{anyhow, Result};
use api_client::auth::MemoryTokenStore;
use api_client::models::invoice::Invoice;
use api_client::models::user::LoginRequest;
use api_client::{ApiClient, ApiSettings, AuthContext};
use payment_client::adapters::{CardForm, MockPayPalButtons, PayPalButtons, StaticCardForm, StripeRestLoader};
use payment_client::CheckoutFlow;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USER_EMAIL: &str = "owner@example.com";
pub const USER_PASSWORD: &str = "correct-horse-battery";
pub const RETURN_URL: &str = "https://app.example.com/invoices/current";

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,workflow_tests=debug")),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Context for one workflow test: mock servers, client and ids.
pub struct WorkflowTestContext {
    pub backend: MockServer,
    pub stripe: MockServer,
    pub store: Arc<MemoryTokenStore>,
    pub auth: Arc<AuthContext>,
    pub api: ApiClient,
    pub invoice_id: Uuid,
    pub payment_id: Uuid,
}

impl WorkflowTestContext {
    /// Start both mock servers and build an anonymous client.
    pub async fn new() -> Result<Self> {
        init_tracing();

        let backend = MockServer::start().await;
        let stripe = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::new());
        let auth = Arc::new(
            AuthContext::restore(store.clone())
                .await
                .map_err(|e| anyhow!("Failed to restore auth context: {}", e))?,
        );
        let api = ApiClient::new(
            ApiSettings::new(format!("{}/api", backend.uri())),
            Arc::clone(&auth),
        )
        .map_err(|e| anyhow!("Failed to build API client: {}", e))?;

        tracing::info!(
            backend = %backend.uri(),
            stripe = %stripe.uri(),
            "Mock servers started"
        );

        Ok(Self {
            backend,
            stripe,
            store,
            auth,
            api,
            invoice_id: Uuid::new_v4(),
            payment_id: Uuid::new_v4(),
        })
    }

    /// Log in through the backend's login endpoint, receiving `access`.
    pub async fn login(&self, access: &str) -> Result<()> {
        Mock::given(method("POST"))
            .and(path("/api/users/login/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": {
                    "id": 7,
                    "email": USER_EMAIL,
                    "username": "owner",
                    "first_name": "Ayesha",
                    "last_name": "Khan",
                    "profile": {"currency": "usd"}
                },
                "tokens": {"access": access, "refresh": "refresh-1"}
            })))
            .mount(&self.backend)
            .await;

        self.api
            .accounts()
            .login(&LoginRequest::new(USER_EMAIL, Secret::new(USER_PASSWORD.to_string())))
            .await
            .map_err(|e| anyhow!("Login failed: {}", e.user_message()))?;
        tracing::debug!(email = USER_EMAIL, "Logged in");
        Ok(())
    }

    /// Checkout flow confirming cards through the mock Stripe API.
    pub fn flow(&self, card_form: Arc<dyn CardForm>, buttons: Arc<dyn PayPalButtons>) -> CheckoutFlow {
        CheckoutFlow::new(
            self.api.clone(),
            Arc::new(StripeRestLoader::new(self.stripe.uri())),
            card_form,
            buttons,
        )
    }

    pub fn card_flow(&self) -> CheckoutFlow {
        self.flow(
            Arc::new(StaticCardForm::payment_method("pm_card_visa")),
            Arc::new(MockPayPalButtons::cancelling()),
        )
    }

    /// Fetch the invoice through the API, as a payment dialog would.
    pub async fn invoice(&self) -> Result<Invoice> {
        Mock::given(method("GET"))
            .and(path(format!("/api/invoice/{}/", self.invoice_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(invoice_json(self.invoice_id)))
            .mount(&self.backend)
            .await;

        self.api
            .invoices()
            .get(self.invoice_id)
            .await
            .map_err(|e| anyhow!("Failed to load invoice: {}", e))
    }

    pub async fn mount_gateway(&self, gateway: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/payment/invoice/{}/gateway-check/", self.invoice_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "invoice_id": self.invoice_id.to_string(),
                "has_gateway": !gateway.is_null()
            })))
            .mount(&self.backend)
            .await;

        if !gateway.is_null() {
            Mock::given(method("GET"))
                .and(path(format!("/api/payment/invoice/{}/gateway/", self.invoice_id)))
                .respond_with(ResponseTemplate::new(200).set_body_json(gateway))
                .mount(&self.backend)
                .await;
        }
    }

    /// Session for `token` only; other bearer tokens fall through to
    /// whatever else is mounted.
    pub async fn mount_session_for(&self, token: &str, body: Value) {
        Mock::given(method("POST"))
            .and(path("/api/payment/create-session/"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.backend)
            .await;
    }

    pub fn stripe_session(&self) -> Value {
        json!({
            "payment_id": self.payment_id,
            "client_secret": "pi_live_1_secret_abc",
            "payment_intent_id": "pi_live_1",
            "publishable_key": "pk_test_e2e",
            "platform_fee": "3.30",
            "platform_fee_percentage": "3.00",
            "total_with_fee": "113.30"
        })
    }

    pub fn paypal_session(&self) -> Value {
        json!({"payment_id": self.payment_id, "order_id": "PAYPAL-ORDER-1"})
    }

    pub async fn mount_stripe_confirm(&self, status: &str) {
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents/pi_live_1/confirm"))
            .and(header("authorization", "Bearer pk_test_e2e"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_live_1",
                "status": status
            })))
            .mount(&self.stripe)
            .await;
    }

    pub fn status_path(&self) -> String {
        format!("/api/payment/status/{}/", self.payment_id)
    }

    pub fn capture_path(&self) -> String {
        format!("/api/payment/capture/{}/", self.payment_id)
    }

    pub async fn mount_status_update(&self, reference: &str) {
        Mock::given(method("PATCH"))
            .and(path(self.status_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": self.payment_id,
                "status": "completed",
                "gateway_payment_id": reference
            })))
            .mount(&self.backend)
            .await;
    }

    pub async fn mount_capture(&self) {
        Mock::given(method("POST"))
            .and(path(self.capture_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": self.payment_id,
                "status": "processing"
            })))
            .mount(&self.backend)
            .await;
    }

    /// Requests the backend received for `method_name path`.
    pub async fn backend_requests(&self, method_name: &str, request_path: &str) -> Vec<wiremock::Request> {
        self.backend
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == method_name && r.url.path() == request_path)
            .collect()
    }
}

pub fn stripe_gateway() -> Value {
    json!({"gateway_name": "stripe", "publishable_key": "pk_test_e2e"})
}

pub fn paypal_gateway() -> Value {
    json!({"gateway_name": "paypal", "client_id": "paypal-e2e"})
}

pub fn invoice_json(id: Uuid) -> Value {
    json!({
        "id": id,
        "invoice_number": "INV-2024-007",
        "client": {
            "id": "5f1c2b7a-8d3e-4f60-9a1b-2c3d4e5f6a7b",
            "name": "Northwind Logistics",
            "email": "billing@northwind.test"
        },
        "issue_date": "2024-06-01",
        "due_date": "2024-06-30",
        "status": "unpaid",
        "tax_rate": "10.00",
        "subtotal": "100.00",
        "tax_amount": "10.00",
        "total": "110.00",
        "items": [
            {"id": 1, "description": "Freight handling", "quantity": "4.00", "unit_price": "25.00", "amount": "100.00"}
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invoice_fixture_decodes() {
        let invoice: Invoice = serde_json::from_value(invoice_json(Uuid::new_v4())).unwrap();
        assert_eq!(invoice.billing_name(), "Northwind Logistics");
        assert!(!invoice.is_paid());
    }
}
