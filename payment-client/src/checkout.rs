//! End-to-end checkout for one invoice, as a payment dialog drives it.

use crate::adapters::{
    describe, CardForm, CheckoutAdapter, CheckoutRequest, PayPalAdapter, PayPalButtons, StripeAdapter,
    StripeSdkLoader,
};
use crate::gateway::{unsupported_message, Gateway, GatewayAvailability, GatewayResolver, LOAD_FAILED_MESSAGE, NO_GATEWAY_MESSAGE};
use crate::reconcile::Reconciler;
use crate::session::{PaymentSession, PlatformFee, SessionCoordinator};
use crate::state::{CheckoutError, PaymentReceipt, PendingReconciliation, CANCELLED_MESSAGE, UNCONFIRMED_MESSAGE};
use api_client::models::currency::Currency;
use api_client::models::invoice::Invoice;
use api_client::ApiClient;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const SUCCESS_TITLE: &str = "Payment Successful";
pub const PAY_TITLE: &str = "Pay Invoice";
pub const SUCCESS_MESSAGE: &str = "Thank you for your payment. The invoice has been marked as paid.";
pub const IN_PROGRESS_MESSAGE: &str = "A payment for this invoice is already in progress.";

/// Per-call checkout options.
#[derive(Debug, Clone)]
pub struct PayOptions {
    /// Where the gateway sends the payer back (success and cancel alike).
    pub return_url: String,
    /// Overrides the signed-in user's preferred currency.
    pub currency: Option<Currency>,
}

impl PayOptions {
    pub fn new(return_url: impl Into<String>) -> Self {
        Self {
            return_url: return_url.into(),
            currency: None,
        }
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }
}

/// What the payment dialog shows instead of, or before, the payment form.
pub enum CheckoutView {
    NotAvailable(String),
    Unsupported(String),
    Ready(Box<dyn CheckoutAdapter>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Succeeded(PaymentReceipt),
    Cancelled,
    Failed(String),
    CapturedButUnconfirmed(PendingReconciliation),
    NotAvailable(String),
    Unsupported(String),
    AlreadyInProgress,
}

impl CheckoutOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutOutcome::Succeeded(_))
    }

    /// Dialog title.
    pub fn title(&self) -> &'static str {
        if self.is_success() {
            SUCCESS_TITLE
        } else {
            PAY_TITLE
        }
    }

    pub fn message(&self) -> String {
        match self {
            CheckoutOutcome::Succeeded(_) => SUCCESS_MESSAGE.to_string(),
            CheckoutOutcome::Cancelled => CANCELLED_MESSAGE.to_string(),
            CheckoutOutcome::Failed(message) | CheckoutOutcome::NotAvailable(message) => message.clone(),
            CheckoutOutcome::CapturedButUnconfirmed(_) => UNCONFIRMED_MESSAGE.to_string(),
            CheckoutOutcome::Unsupported(name) => unsupported_message(name),
            CheckoutOutcome::AlreadyInProgress => IN_PROGRESS_MESSAGE.to_string(),
        }
    }

    fn from_error(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Cancelled => CheckoutOutcome::Cancelled,
            CheckoutError::Unconfirmed(pending) => CheckoutOutcome::CapturedButUnconfirmed(pending),
            other => CheckoutOutcome::Failed(other.user_message()),
        }
    }
}

/// Amount breakdown shown above the payment form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSummary {
    pub currency: Currency,
    pub invoice_amount: Decimal,
    pub platform_fee: Option<PlatformFee>,
}

impl PaymentSummary {
    pub fn new(invoice: &Invoice, session: Option<&PaymentSession>, currency: Currency) -> Self {
        Self {
            currency,
            invoice_amount: invoice.total,
            platform_fee: session.and_then(|s| s.platform_fee),
        }
    }

    pub fn total(&self) -> Decimal {
        match &self.platform_fee {
            Some(fee) if fee.total_with_fee > Decimal::ZERO => fee.total_with_fee,
            Some(fee) => self.invoice_amount + fee.fee,
            None => self.invoice_amount,
        }
    }

    /// Label/value rows. The fee row appears only for a positive fee.
    pub fn lines(&self) -> Vec<(String, String)> {
        let mut lines = vec![("Invoice Amount".to_string(), self.currency.format(self.invoice_amount))];
        if let Some(fee) = &self.platform_fee {
            lines.push((
                format!("Platform Fee ({}%)", fee.percentage.normalize()),
                self.currency.format(fee.fee),
            ));
        }
        lines.push(("Total".to_string(), self.currency.format(self.total())));
        lines
    }

    pub fn pay_label(&self) -> String {
        format!("Pay {}", self.currency.format(self.total()))
    }
}

/// Resolves the gateway for an invoice and runs its adapter.
///
/// One payment at a time: a second `pay` while one is running returns
/// [`CheckoutOutcome::AlreadyInProgress`] without touching the backend.
pub struct CheckoutFlow {
    api: ApiClient,
    resolver: GatewayResolver,
    coordinator: SessionCoordinator,
    reconciler: Reconciler,
    stripe_loader: Arc<dyn StripeSdkLoader>,
    card_form: Arc<dyn CardForm>,
    paypal_buttons: Arc<dyn PayPalButtons>,
    in_progress: AtomicBool,
}

struct InProgress<'a>(&'a AtomicBool);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl CheckoutFlow {
    pub fn new(
        api: ApiClient,
        stripe_loader: Arc<dyn StripeSdkLoader>,
        card_form: Arc<dyn CardForm>,
        paypal_buttons: Arc<dyn PayPalButtons>,
    ) -> Self {
        Self {
            resolver: GatewayResolver::new(api.clone()),
            coordinator: SessionCoordinator::new(api.clone()),
            reconciler: Reconciler::new(api.clone()),
            api,
            stripe_loader,
            card_form,
            paypal_buttons,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// The adapter for the invoice's gateway, or why there is none.
    pub async fn open(&self, invoice: &Invoice) -> Result<CheckoutView, CheckoutError> {
        let availability = self.resolver.resolve(invoice.id).await.map_err(|e| {
            tracing::error!(invoice_id = %invoice.id, error = %e, "Failed to resolve payment gateway");
            CheckoutError::Initialization(describe(&e, LOAD_FAILED_MESSAGE))
        })?;

        Ok(match availability {
            GatewayAvailability::NotConfigured => CheckoutView::NotAvailable(NO_GATEWAY_MESSAGE.to_string()),
            GatewayAvailability::Available(gateway) => self.adapter_for(gateway),
        })
    }

    fn adapter_for(&self, gateway: Gateway) -> CheckoutView {
        match gateway {
            Gateway::Stripe { publishable_key, .. } => CheckoutView::Ready(Box::new(StripeAdapter::new(
                publishable_key,
                self.coordinator.clone(),
                self.reconciler.clone(),
                Arc::clone(&self.stripe_loader),
                Arc::clone(&self.card_form),
            ))),
            Gateway::PayPal { client_id, .. } => CheckoutView::Ready(Box::new(PayPalAdapter::new(
                client_id,
                self.api.clone(),
                self.coordinator.clone(),
                self.reconciler.clone(),
                Arc::clone(&self.paypal_buttons),
            ))),
            Gateway::Unsupported(name) => CheckoutView::Unsupported(name),
        }
    }

    async fn currency(&self, options: &PayOptions) -> Currency {
        match options.currency {
            Some(currency) => currency,
            None => self
                .api
                .auth()
                .current_user()
                .await
                .map(|user| user.currency())
                .unwrap_or_default(),
        }
    }

    /// Pay the invoice with its owner's gateway.
    pub async fn pay(&self, invoice: &Invoice, options: &PayOptions) -> CheckoutOutcome {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            tracing::warn!(invoice_id = %invoice.id, "Payment already in progress");
            return CheckoutOutcome::AlreadyInProgress;
        }
        let _guard = InProgress(&self.in_progress);

        let mut adapter = match self.open(invoice).await {
            Ok(CheckoutView::Ready(adapter)) => adapter,
            Ok(CheckoutView::NotAvailable(message)) => return CheckoutOutcome::NotAvailable(message),
            Ok(CheckoutView::Unsupported(name)) => return CheckoutOutcome::Unsupported(name),
            Err(e) => return CheckoutOutcome::Failed(e.user_message()),
        };

        let currency = self.currency(options).await;
        let request = CheckoutRequest::for_invoice(invoice, currency, &options.return_url);

        let outcome = match self.run(adapter.as_mut(), &request, invoice, currency).await {
            Ok(receipt) => CheckoutOutcome::Succeeded(receipt),
            Err(e) => CheckoutOutcome::from_error(e),
        };

        tracing::info!(
            invoice_id = %invoice.id,
            gateway = adapter.gateway().name(),
            state = adapter.state().name(),
            "Checkout finished"
        );
        outcome
    }

    async fn run(
        &self,
        adapter: &mut dyn CheckoutAdapter,
        request: &CheckoutRequest,
        invoice: &Invoice,
        currency: Currency,
    ) -> Result<PaymentReceipt, CheckoutError> {
        adapter.initialize(request).await?;

        let summary = PaymentSummary::new(invoice, adapter.session(), currency);
        tracing::info!(
            invoice_id = %invoice.id,
            total = %summary.total(),
            currency = %currency,
            "Payment summary ready"
        );

        adapter.collect_instrument().await?;
        adapter.confirm().await
    }

    /// Tell the backend about a payment the gateway already captured.
    pub async fn retry_confirmation(&self, pending: &PendingReconciliation) -> CheckoutOutcome {
        match self
            .reconciler
            .confirm(pending.payment_id, &pending.gateway_reference)
            .await
        {
            Ok(receipt) => CheckoutOutcome::Succeeded(receipt),
            Err(e) => {
                tracing::error!(payment_id = %pending.payment_id, error = %e, "Reconciliation retry failed");
                CheckoutOutcome::CapturedButUnconfirmed(PendingReconciliation {
                    reason: e.user_message(),
                    ..pending.clone()
                })
            }
        }
    }
}
