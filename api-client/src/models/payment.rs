use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Backend payment status. Unrecognized values decode to `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    #[serde(other)]
    Unknown,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answer of `GET /payment/invoice/{id}/gateway-check/`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayCheck {
    #[serde(default)]
    pub invoice_id: Option<String>,
    pub has_gateway: bool,
}

/// Public gateway details for an invoice; never carries secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayInfo {
    pub gateway_name: String,
    #[serde(default)]
    pub gateway_display_name: Option<String>,
    /// Stripe only.
    #[serde(default)]
    pub publishable_key: Option<String>,
    /// PayPal only.
    #[serde(default)]
    pub client_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest {
    pub invoice_id: Uuid,
    pub success_url: String,
    pub cancel_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_id: Option<Uuid>,
}

/// Union of the gateway-specific session fields the backend may return.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionResponse {
    #[serde(default)]
    pub payment_id: Option<Uuid>,
    /// Stripe PaymentIntent client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub payment_intent_id: Option<String>,
    #[serde(default)]
    pub publishable_key: Option<String>,
    /// PayPal order id.
    #[serde(default)]
    pub order_id: Option<String>,
    /// Hosted checkout page.
    #[serde(default)]
    pub checkout_url: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub platform_fee: Option<Decimal>,
    #[serde(default)]
    pub platform_fee_percentage: Option<Decimal>,
    #[serde(default)]
    pub total_with_fee: Option<Decimal>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusUpdate {
    pub status: PaymentStatus,
    pub gateway_payment_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureRequest {
    pub order_id: String,
}

/// Answer of the status PATCH and of capture.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub status: PaymentStatus,
    #[serde(default)]
    pub gateway_payment_id: Option<String>,
}

/// Answer of `GET /payment/status/{id}/`; the inner shape is gateway specific.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusReport {
    pub status: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefundResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub refund_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    #[serde(default)]
    pub invoice: Option<Uuid>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    pub gateway_name: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    #[serde(default)]
    pub gateway_payment_id: Option<String>,
    #[serde(default)]
    pub gateway_session_id: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub metadata: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Unauthenticated payment summary behind the public invoice page.
#[derive(Debug, Clone, Deserialize)]
pub struct PublicPaymentInfo {
    pub invoice_id: Uuid,
    pub invoice_number: String,
    /// A payment status, or `no_payment` when nothing was attempted yet.
    pub status: String,
    #[serde(default)]
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_date: Option<DateTime<Utc>>,
}

impl PublicPaymentInfo {
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed.as_str()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub id: Uuid,
    pub gateway_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    /// Opaque credential bundle, shape depends on the gateway.
    #[serde(default)]
    pub credentials: Value,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GatewayConfigDraft {
    pub gateway_name: String,
    pub is_active: bool,
    pub is_default: bool,
    pub credentials: Value,
}

/// Gateway plugin the backend can be configured with.
#[derive(Debug, Clone, Deserialize)]
pub struct AvailableGateway {
    pub name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub logo_url: Option<String>,
}
