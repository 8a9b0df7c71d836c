//! Gateway-specific checkout drivers behind one interface.

pub mod paypal;
pub mod stripe;

use crate::gateway::Gateway;
use crate::session::{PaymentSession, SessionRequest};
use crate::state::{CheckoutError, CheckoutState, PaymentReceipt};
use api_client::models::currency::Currency;
use api_client::models::invoice::Invoice;
use async_trait::async_trait;
use uuid::Uuid;

pub use paypal::{ApprovalOutcome, ButtonsConfig, MockPayPalButtons, PayPalAdapter, PayPalButtons, PromptButtons};
pub use stripe::{
    CardDetails, CardForm, CardInput, MockStripeLoader, MockStripeSdk, PaymentIntent, StaticCardForm,
    StripeAdapter, StripeRestLoader, StripeSdk, StripeSdkError, StripeSdkLoader,
};

/// Payer details passed to the gateway with a card payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingDetails {
    pub name: String,
    pub email: String,
}

impl BillingDetails {
    /// From the invoice's client; name defaults to `Client`, email to empty.
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            name: invoice.billing_name(),
            email: invoice.billing_email(),
        }
    }
}

/// Everything an adapter needs to start a checkout for one invoice.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub invoice_id: Uuid,
    pub billing: BillingDetails,
    pub currency: Currency,
    pub session: SessionRequest,
}

impl CheckoutRequest {
    /// In-place checkout: the gateway returns to `return_url` on both
    /// success and cancel.
    pub fn for_invoice(invoice: &Invoice, currency: Currency, return_url: &str) -> Self {
        Self {
            invoice_id: invoice.id,
            billing: BillingDetails::from_invoice(invoice),
            currency,
            session: SessionRequest::new(invoice.id, return_url, return_url).with_currency(currency.code()),
        }
    }
}

/// One gateway's checkout state machine.
///
/// `initialize` loads the gateway and creates the payment session,
/// `collect_instrument` gathers the payer's card or approval, and `confirm`
/// charges and reconciles. Terminal states are left only through `reset`
/// (or `retry_reconciliation` after a capture the backend never heard of).
#[async_trait]
pub trait CheckoutAdapter: Send + Sync {
    fn gateway(&self) -> &Gateway;

    fn state(&self) -> CheckoutState;

    fn session(&self) -> Option<&PaymentSession>;

    async fn initialize(&mut self, request: &CheckoutRequest) -> Result<(), CheckoutError>;

    async fn collect_instrument(&mut self) -> Result<(), CheckoutError>;

    async fn confirm(&mut self) -> Result<PaymentReceipt, CheckoutError>;

    async fn retry_reconciliation(&mut self) -> Result<PaymentReceipt, CheckoutError>;

    /// Abandon the checkout. No gateway call is made.
    fn cancel(&mut self);

    /// Back to `Idle` for a fresh attempt with a new session.
    fn reset(&mut self);
}

/// Turn a settled state into the result `confirm` returns.
pub(crate) fn settled(state: &CheckoutState) -> Result<PaymentReceipt, CheckoutError> {
    match state {
        CheckoutState::Succeeded(receipt) => Ok(receipt.clone()),
        CheckoutState::CapturedButUnconfirmed(pending) => Err(CheckoutError::Unconfirmed(pending.clone())),
        CheckoutState::Failed(message) => Err(CheckoutError::Payment(message.clone())),
        CheckoutState::Cancelled => Err(CheckoutError::Cancelled),
        other => Err(CheckoutError::invalid(other, "settle")),
    }
}

/// Displayable text for a backend failure during checkout. Server-supplied
/// detail wins for HTTP errors; local failures use `fallback`.
pub(crate) fn describe(err: &service_core::AppError, fallback: &str) -> String {
    use service_core::AppError;
    match err {
        AppError::Network(_) | AppError::SessionExpired => err.user_message(),
        AppError::Decode(_) | AppError::ConfigError(_) | AppError::Storage(_) => fallback.to_string(),
        _ => err.detail_or(fallback),
    }
}

/// Re-run reconciliation for a payment the gateway already captured.
pub(crate) async fn retry_settlement(
    reconciler: &crate::reconcile::Reconciler,
    state: &mut CheckoutState,
) -> Result<PaymentReceipt, CheckoutError> {
    let pending = match state {
        CheckoutState::CapturedButUnconfirmed(pending) => pending.clone(),
        other => return Err(CheckoutError::invalid(other, "retry confirmation")),
    };

    tracing::info!(payment_id = %pending.payment_id, "Retrying payment reconciliation");
    *state = reconciler
        .settle(pending.payment_id, &pending.gateway_reference)
        .await;
    settled(state)
}
