#![allow(dead_code)]

use api_client::auth::{MemoryTokenStore, StoredSession};
use api_client::models::invoice::Invoice;
use api_client::models::user::Tokens;
use api_client::{ApiClient, ApiSettings, AuthContext};
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub const RETURN_URL: &str = "https://app.example.com/invoices/current";

/// A signed-in client talking to a wiremock backend.
pub struct TestBackend {
    pub server: MockServer,
    pub api: ApiClient,
    pub invoice_id: Uuid,
    pub payment_id: Uuid,
}

impl TestBackend {
    pub async fn start() -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let store = Arc::new(MemoryTokenStore::with_session(StoredSession {
            tokens: Tokens {
                access: "access-1".to_string(),
                refresh: Some("refresh-1".to_string()),
            },
            user: None,
        }));
        let auth = AuthContext::restore(store)
            .await
            .expect("Failed to restore auth context");
        let api = ApiClient::new(ApiSettings::new(format!("{}/api", server.uri())), Arc::new(auth))
            .expect("Failed to build client");

        TestBackend {
            server,
            api,
            invoice_id: Uuid::new_v4(),
            payment_id: Uuid::new_v4(),
        }
    }

    pub fn invoice(&self) -> Invoice {
        serde_json::from_value(invoice_json(self.invoice_id)).expect("invalid invoice fixture")
    }

    pub fn session_path(&self) -> &'static str {
        "/api/payment/create-session/"
    }

    pub fn status_path(&self) -> String {
        format!("/api/payment/status/{}/", self.payment_id)
    }

    pub fn capture_path(&self) -> String {
        format!("/api/payment/capture/{}/", self.payment_id)
    }

    pub async fn mount_gateway(&self, gateway: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/api/payment/invoice/{}/gateway-check/", self.invoice_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "invoice_id": self.invoice_id.to_string(),
                "has_gateway": true
            })))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/api/payment/invoice/{}/gateway/", self.invoice_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(gateway))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_no_gateway(&self) {
        Mock::given(method("GET"))
            .and(path(format!("/api/payment/invoice/{}/gateway-check/", self.invoice_id)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "invoice_id": self.invoice_id.to_string(),
                "has_gateway": false
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_stripe_session(&self) {
        self.mount_session(self.stripe_session_json(), Duration::ZERO).await;
    }

    pub async fn mount_paypal_session(&self) {
        self.mount_session(self.paypal_session_json(), Duration::ZERO).await;
    }

    pub async fn mount_session(&self, body: Value, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(self.session_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
            .mount(&self.server)
            .await;
    }

    pub fn stripe_session_json(&self) -> Value {
        json!({
            "payment_id": self.payment_id,
            "client_secret": "pi_123_secret_abc",
            "payment_intent_id": "pi_123",
            "publishable_key": "pk_test_123"
        })
    }

    pub fn paypal_session_json(&self) -> Value {
        json!({
            "payment_id": self.payment_id,
            "order_id": "ORDER-42"
        })
    }

    /// The status PATCH answering `completed`.
    pub async fn mount_status_update(&self, reference: &str) {
        Mock::given(method("PATCH"))
            .and(path(self.status_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": self.payment_id,
                "status": "completed",
                "gateway_payment_id": reference
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_capture(&self) {
        Mock::given(method("POST"))
            .and(path(self.capture_path()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": self.payment_id,
                "status": "processing"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn requests_to(&self, method_name: &str, request_path: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method.as_str() == method_name && r.url.path() == request_path)
            .collect()
    }
}

pub fn stripe_gateway() -> Value {
    json!({
        "gateway_name": "stripe",
        "gateway_display_name": "Stripe",
        "publishable_key": "pk_test_123"
    })
}

pub fn paypal_gateway() -> Value {
    json!({
        "gateway_name": "paypal",
        "gateway_display_name": "PayPal",
        "client_id": "paypal-client-id"
    })
}

pub fn invoice_json(id: Uuid) -> Value {
    json!({
        "id": id,
        "invoice_number": "INV-0042",
        "client": {
            "id": "0b7d6f0e-5a39-4b8e-9c57-3f0f0b3c2d11",
            "name": "Acme Traders",
            "email": "accounts@acme.test"
        },
        "issue_date": "2024-05-01",
        "due_date": "2024-05-31",
        "status": "unpaid",
        "tax_rate": "10.00",
        "subtotal": "100.00",
        "tax_amount": "10.00",
        "total": "110.00",
        "items": [
            {"id": 1, "description": "Design work", "quantity": "2.00", "unit_price": "50.00", "amount": "100.00"}
        ]
    })
}
