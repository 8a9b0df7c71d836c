use api_client::models::payment::{CreateSessionRequest, SessionResponse};
use api_client::ApiClient;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use rust_decimal::Decimal;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub invoice_id: Uuid,
    pub success_url: String,
    pub cancel_url: String,
    pub currency: Option<String>,
    pub gateway_id: Option<Uuid>,
}

impl SessionRequest {
    pub fn new(invoice_id: Uuid, success_url: impl Into<String>, cancel_url: impl Into<String>) -> Self {
        Self {
            invoice_id,
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            currency: None,
            gateway_id: None,
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = Some(currency.into());
        self
    }

    pub fn with_gateway(mut self, gateway_id: Uuid) -> Self {
        self.gateway_id = Some(gateway_id);
        self
    }

    fn to_api(&self) -> CreateSessionRequest {
        CreateSessionRequest {
            invoice_id: self.invoice_id,
            success_url: self.success_url.clone(),
            cancel_url: self.cancel_url.clone(),
            currency: self.currency.clone(),
            gateway_id: self.gateway_id,
        }
    }
}

/// Fee the platform adds on top of the invoice total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformFee {
    pub fee: Decimal,
    pub percentage: Decimal,
    pub total_with_fee: Decimal,
}

/// A backend payment record plus the gateway tokens needed to complete it.
#[derive(Debug, Clone)]
pub struct PaymentSession {
    pub payment_id: Uuid,
    pub client_secret: Option<String>,
    pub payment_intent_id: Option<String>,
    pub publishable_key: Option<String>,
    pub order_id: Option<String>,
    pub checkout_url: Option<String>,
    /// Present only when the fee is greater than zero.
    pub platform_fee: Option<PlatformFee>,
}

impl PaymentSession {
    pub fn from_response(response: SessionResponse) -> Result<Self, AppError> {
        let payment_id = response.payment_id.ok_or_else(|| {
            AppError::Decode("Missing payment_id in payment session response".to_string())
        })?;

        let platform_fee = match response.platform_fee {
            Some(fee) if fee > Decimal::ZERO => Some(PlatformFee {
                fee,
                percentage: response.platform_fee_percentage.unwrap_or_default(),
                total_with_fee: response.total_with_fee.unwrap_or_default(),
            }),
            _ => None,
        };

        Ok(Self {
            payment_id,
            client_secret: response.client_secret.filter(|s| !s.is_empty()),
            payment_intent_id: response.payment_intent_id,
            publishable_key: response.publishable_key,
            order_id: response.order_id.filter(|s| !s.is_empty()),
            checkout_url: response.checkout_url.filter(|s| !s.is_empty()),
            platform_fee,
        })
    }
}

type SharedSession = Shared<BoxFuture<'static, Result<PaymentSession, AppError>>>;

/// Creates payment sessions, joining concurrent requests for the same
/// invoice onto one backend call.
#[derive(Clone)]
pub struct SessionCoordinator {
    api: ApiClient,
    in_flight: Arc<Mutex<HashMap<Uuid, (SessionRequest, SharedSession)>>>,
}

impl SessionCoordinator {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a session, or join the one already being created for the
    /// same invoice.
    ///
    /// Joining is keyed on the invoice alone: a caller that joins gets the
    /// first caller's session even when it asked for a different currency,
    /// gateway or return URLs. At most one session is created per invoice at
    /// a time; a mismatched join is logged.
    pub async fn create(&self, request: SessionRequest) -> Result<PaymentSession, AppError> {
        let invoice_id = request.invoice_id;
        let pending = {
            let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            match in_flight.get(&invoice_id) {
                Some((first, existing)) => {
                    if *first != request {
                        tracing::warn!(
                            invoice_id = %invoice_id,
                            "Joining in-flight payment session created with different options"
                        );
                    } else {
                        tracing::debug!(invoice_id = %invoice_id, "Joining in-flight payment session");
                    }
                    existing.clone()
                }
                None => {
                    let pending = self.spawn_create(request.clone());
                    in_flight.insert(invoice_id, (request, pending.clone()));
                    pending
                }
            }
        };

        pending.await
    }

    /// Number of invoices with a session request outstanding.
    pub fn in_flight(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn spawn_create(&self, request: SessionRequest) -> SharedSession {
        let api = self.api.clone();
        let registry = Arc::clone(&self.in_flight);

        async move {
            let result = api
                .payments()
                .create_payment_session(&request.to_api())
                .await
                .and_then(PaymentSession::from_response);

            registry
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&request.invoice_id);

            result
        }
        .boxed()
        .shared()
    }
}
