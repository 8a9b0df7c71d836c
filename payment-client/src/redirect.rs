//! Redirect-based checkout used by the public payment page: the gateway
//! hosts the payment form and sends the payer back with query parameters.

use crate::session::{SessionCoordinator, SessionRequest};
use api_client::models::currency::Currency;
use api_client::models::invoice::Invoice;
use api_client::models::payment::PublicPaymentInfo;
use api_client::ApiClient;
use reqwest::Url;
use service_core::error::AppError;
use uuid::Uuid;

/// Placeholder the gateway replaces with its checkout session id.
pub const SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// A created session the payer should be redirected to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedSession {
    pub payment_id: Uuid,
    pub checkout_url: String,
}

/// How the payer came back from the hosted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnOutcome {
    Succeeded { session_id: Option<String> },
    Cancelled,
    None,
}

impl ReturnOutcome {
    pub fn from_url(url: &str) -> Self {
        let Ok(url) = Url::parse(url) else {
            return ReturnOutcome::None;
        };

        let mut success = false;
        let mut cancelled = false;
        let mut session_id = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "payment_success" => success = value == "true",
                "payment_cancelled" => cancelled = value == "true",
                "session_id" if !value.is_empty() && value != SESSION_ID_PLACEHOLDER => {
                    session_id = Some(value.into_owned())
                }
                _ => {}
            }
        }

        if success {
            ReturnOutcome::Succeeded { session_id }
        } else if cancelled {
            ReturnOutcome::Cancelled
        } else {
            ReturnOutcome::None
        }
    }
}

/// "Pay Now" is offered only while neither the invoice nor its latest
/// payment says it is settled.
pub fn can_pay_now(invoice: &Invoice, info: Option<&PublicPaymentInfo>) -> bool {
    !invoice.is_paid() && !info.map(PublicPaymentInfo::is_completed).unwrap_or(false)
}

#[derive(Clone)]
pub struct HostedCheckout {
    api: ApiClient,
    coordinator: SessionCoordinator,
    origin: String,
}

impl HostedCheckout {
    /// `origin` is the public site, e.g. `https://app.example.com`.
    pub fn new(api: ApiClient, origin: impl Into<String>) -> Self {
        Self {
            coordinator: SessionCoordinator::new(api.clone()),
            api,
            origin: origin.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn success_url(&self, invoice_id: Uuid) -> String {
        format!(
            "{}/payment/{}?payment_success=true&session_id={}",
            self.origin, invoice_id, SESSION_ID_PLACEHOLDER
        )
    }

    pub fn cancel_url(&self, invoice_id: Uuid) -> String {
        format!("{}/payment/{}?payment_cancelled=true", self.origin, invoice_id)
    }

    /// Payment state shown on the public page; no login needed.
    pub async fn public_info(&self, invoice_id: Uuid) -> Result<PublicPaymentInfo, AppError> {
        self.api.payments().public_payment_info(invoice_id).await
    }

    /// Create a session and return where to send the payer.
    pub async fn start(&self, invoice_id: Uuid, currency: Option<Currency>) -> Result<HostedSession, AppError> {
        let mut request = SessionRequest::new(invoice_id, self.success_url(invoice_id), self.cancel_url(invoice_id));
        if let Some(currency) = currency {
            request = request.with_currency(currency.code());
        }

        let session = self.coordinator.create(request).await?;
        let checkout_url = session.checkout_url.ok_or_else(|| {
            tracing::error!(invoice_id = %invoice_id, payment_id = %session.payment_id, "Session has no checkout URL");
            AppError::Decode("Missing checkout_url in payment session response".to_string())
        })?;

        tracing::info!(invoice_id = %invoice_id, payment_id = %session.payment_id, "Redirecting to hosted checkout");
        Ok(HostedSession {
            payment_id: session.payment_id,
            checkout_url,
        })
    }
}
