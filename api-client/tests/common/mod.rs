#![allow(dead_code)]

use api_client::auth::{MemoryTokenStore, StoredSession};
use api_client::models::user::Tokens;
use api_client::{ApiClient, ApiSettings, AuthContext};
use serde_json::{json, Value};
use std::sync::{Arc, Once};
use uuid::Uuid;
use wiremock::MockServer;

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

pub struct TestApi {
    pub server: MockServer,
    pub store: Arc<MemoryTokenStore>,
    pub client: ApiClient,
}

impl TestApi {
    /// Client with no session.
    pub async fn anonymous() -> Self {
        Self::build(MemoryTokenStore::new()).await
    }

    /// Client restored from a stored session.
    pub async fn signed_in(access: &str, refresh: Option<&str>) -> Self {
        Self::build(MemoryTokenStore::with_session(StoredSession {
            tokens: Tokens {
                access: access.to_string(),
                refresh: refresh.map(str::to_string),
            },
            user: None,
        }))
        .await
    }

    async fn build(store: MemoryTokenStore) -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let store = Arc::new(store);
        let auth = AuthContext::restore(store.clone())
            .await
            .expect("Failed to restore auth context");
        let client = ApiClient::new(ApiSettings::new(format!("{}/api", server.uri())), Arc::new(auth))
            .expect("Failed to build client");

        TestApi {
            server,
            store,
            client,
        }
    }

    pub fn stored_access(&self) -> Option<String> {
        self.store.snapshot().map(|s| s.tokens.access)
    }
}

pub fn invoice_json(id: Uuid) -> Value {
    json!({
        "id": id,
        "invoice_number": "INV-0001",
        "client": {
            "id": "0b7d6f0e-5a39-4b8e-9c57-3f0f0b3c2d11",
            "name": "Acme Traders",
            "email": "accounts@acme.test"
        },
        "issue_date": "2024-05-01",
        "due_date": "2024-05-31",
        "status": "unpaid",
        "notes": null,
        "tax_rate": "10.00",
        "subtotal": "100.00",
        "tax_amount": "10.00",
        "total": "110.00",
        "items": [
            {"id": 1, "description": "Design work", "quantity": "2.00", "unit_price": "50.00", "amount": "100.00"}
        ]
    })
}

pub fn user_json() -> Value {
    json!({
        "id": 7,
        "email": "owner@example.com",
        "username": "owner",
        "first_name": "Ayesha",
        "last_name": "Khan",
        "profile": {"company_name": "Khan Studio", "currency": "pkr"}
    })
}
