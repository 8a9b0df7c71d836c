//! PayPal checkout: the backend creates the order with the session, the
//! payer approves it in the PayPal widget, and the backend captures it.

use super::{describe, retry_settlement, settled, CheckoutAdapter, CheckoutRequest};
use crate::gateway::Gateway;
use crate::reconcile::Reconciler;
use crate::session::{PaymentSession, SessionCoordinator};
use crate::state::{CheckoutError, CheckoutState, PaymentReceipt};
use api_client::ApiClient;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};

pub const UNAVAILABLE_MESSAGE: &str = "Unable to initialize PayPal payment. Please try again later.";
pub const INIT_FAILED_MESSAGE: &str = "Failed to initialize payment";
pub const WIDGET_ERROR_MESSAGE: &str = "PayPal payment error";
pub const CAPTURE_FAILED_MESSAGE: &str = "Failed to capture payment";

pub const DEFAULT_APPROVAL_BASE: &str = "https://www.sandbox.paypal.com/checkoutnow";

/// What the PayPal widget is rendered with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonsConfig {
    pub client_id: String,
    /// ISO code, upper case (`PKR`, `USD`).
    pub currency: String,
    /// Returned verbatim from the widget's create-order callback.
    pub order_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved {
        order_id: String,
        payer_id: Option<String>,
    },
    Cancelled,
    Error(Option<String>),
}

/// The PayPal buttons: render, wait for the payer, report what happened.
#[async_trait]
pub trait PayPalButtons: Send + Sync {
    async fn render(&self, config: &ButtonsConfig) -> ApprovalOutcome;
}

/// Terminal stand-in for the PayPal widget. Prints the approval link and
/// waits for `approve` or `cancel` on stdin.
pub struct PromptButtons {
    approval_base: String,
}

impl PromptButtons {
    pub fn new(approval_base: impl Into<String>) -> Self {
        Self {
            approval_base: approval_base.into(),
        }
    }

    pub fn approval_url(&self, order_id: &str) -> String {
        format!("{}?token={}", self.approval_base, order_id)
    }
}

impl Default for PromptButtons {
    fn default() -> Self {
        Self::new(DEFAULT_APPROVAL_BASE)
    }
}

#[async_trait]
impl PayPalButtons for PromptButtons {
    async fn render(&self, config: &ButtonsConfig) -> ApprovalOutcome {
        println!("Approve the PayPal order in your browser:");
        println!("  {}", self.approval_url(&config.order_id));
        println!("Type 'approve' once approved, or 'cancel' to abandon:");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match line.trim().to_ascii_lowercase().as_str() {
                    "approve" | "approved" | "a" => {
                        return ApprovalOutcome::Approved {
                            order_id: config.order_id.clone(),
                            payer_id: None,
                        }
                    }
                    "cancel" | "c" => return ApprovalOutcome::Cancelled,
                    _ => println!("Please type 'approve' or 'cancel':"),
                },
                Ok(None) => return ApprovalOutcome::Cancelled,
                Err(e) => return ApprovalOutcome::Error(Some(e.to_string())),
            }
        }
    }
}

/// Mock PayPal buttons for testing
pub struct MockPayPalButtons {
    outcome: MockOutcome,
    render_count: AtomicU64,
    last_config: Mutex<Option<ButtonsConfig>>,
}

enum MockOutcome {
    Approve,
    Cancel,
    Fail(Option<String>),
}

impl MockPayPalButtons {
    fn with(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            render_count: AtomicU64::new(0),
            last_config: Mutex::new(None),
        }
    }

    /// Approves whatever order it is rendered with.
    pub fn approving() -> Self {
        Self::with(MockOutcome::Approve)
    }

    pub fn cancelling() -> Self {
        Self::with(MockOutcome::Cancel)
    }

    pub fn failing(message: Option<&str>) -> Self {
        Self::with(MockOutcome::Fail(message.map(str::to_string)))
    }

    pub fn render_count(&self) -> u64 {
        self.render_count.load(Ordering::SeqCst)
    }

    pub fn last_config(&self) -> Option<ButtonsConfig> {
        self.last_config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl PayPalButtons for MockPayPalButtons {
    async fn render(&self, config: &ButtonsConfig) -> ApprovalOutcome {
        self.render_count.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock().unwrap_or_else(PoisonError::into_inner) = Some(config.clone());

        tracing::info!(order_id = %config.order_id, "[MOCK] PayPal buttons rendered");
        match &self.outcome {
            MockOutcome::Approve => ApprovalOutcome::Approved {
                order_id: config.order_id.clone(),
                payer_id: Some("MOCKPAYER".to_string()),
            },
            MockOutcome::Cancel => ApprovalOutcome::Cancelled,
            MockOutcome::Fail(message) => ApprovalOutcome::Error(message.clone()),
        }
    }
}

/// PayPal checkout: `Idle → Initializing → Ready → Approving → Capturing →
/// Succeeded | Cancelled | Failed | CapturedButUnconfirmed`.
pub struct PayPalAdapter {
    gateway: Gateway,
    coordinator: SessionCoordinator,
    reconciler: Reconciler,
    api: ApiClient,
    buttons: Arc<dyn PayPalButtons>,
    state: CheckoutState,
    session: Option<PaymentSession>,
    currency: String,
    approved_order: Option<String>,
}

impl PayPalAdapter {
    pub fn new(
        client_id: Option<String>,
        api: ApiClient,
        coordinator: SessionCoordinator,
        reconciler: Reconciler,
        buttons: Arc<dyn PayPalButtons>,
    ) -> Self {
        Self {
            gateway: Gateway::PayPal {
                client_id,
                display_name: "PayPal".to_string(),
            },
            coordinator,
            reconciler,
            api,
            buttons,
            state: CheckoutState::Idle,
            session: None,
            currency: String::new(),
            approved_order: None,
        }
    }

    fn client_id(&self) -> Option<String> {
        match &self.gateway {
            Gateway::PayPal { client_id, .. } => client_id.clone(),
            _ => None,
        }
    }

    fn fail(&mut self, message: String) -> CheckoutError {
        tracing::warn!(reason = %message, "PayPal checkout failed");
        self.state = CheckoutState::Failed(message.clone());
        CheckoutError::Payment(message)
    }
}

#[async_trait]
impl CheckoutAdapter for PayPalAdapter {
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
        self.currency = request.currency.iso_code().to_string();

        let session = match self.coordinator.create(request.session.clone()).await {
            Ok(session) => session,
            Err(e) => {
                let message = describe(&e, INIT_FAILED_MESSAGE);
                self.state = CheckoutState::Failed(message.clone());
                return Err(CheckoutError::Initialization(message));
            }
        };

        if self.client_id().is_none() || session.order_id.is_none() {
            tracing::warn!(
                payment_id = %session.payment_id,
                has_client_id = self.client_id().is_some(),
                has_order_id = session.order_id.is_some(),
                "PayPal checkout is missing its client id or order"
            );
            self.session = Some(session);
            self.state = CheckoutState::Failed(UNAVAILABLE_MESSAGE.to_string());
            return Err(CheckoutError::Initialization(UNAVAILABLE_MESSAGE.to_string()));
        }

        tracing::info!(
            invoice_id = %request.invoice_id,
            payment_id = %session.payment_id,
            "PayPal checkout ready"
        );
        self.session = Some(session);
        self.state = CheckoutState::Ready;
        Ok(())
    }

    async fn collect_instrument(&mut self) -> Result<(), CheckoutError> {
        if self.state != CheckoutState::Ready {
            return Err(CheckoutError::invalid(&self.state, "start PayPal approval"));
        }
        let (Some(client_id), Some(order_id)) = (
            self.client_id(),
            self.session.as_ref().and_then(|s| s.order_id.clone()),
        ) else {
            return Err(CheckoutError::NotReady(UNAVAILABLE_MESSAGE.to_string()));
        };

        self.state = CheckoutState::Approving;
        let config = ButtonsConfig {
            client_id,
            currency: self.currency.clone(),
            order_id,
        };

        match self.buttons.render(&config).await {
            ApprovalOutcome::Approved { order_id, payer_id } => {
                tracing::info!(order_id = %order_id, payer_id = ?payer_id, "PayPal order approved");
                self.approved_order = Some(order_id);
                Ok(())
            }
            ApprovalOutcome::Cancelled => {
                tracing::info!(order_id = %config.order_id, "PayPal payment cancelled by payer");
                self.state = CheckoutState::Cancelled;
                Err(CheckoutError::Cancelled)
            }
            ApprovalOutcome::Error(message) => {
                let message = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| WIDGET_ERROR_MESSAGE.to_string());
                Err(self.fail(message))
            }
        }
    }

    async fn confirm(&mut self) -> Result<PaymentReceipt, CheckoutError> {
        if self.state != CheckoutState::Approving {
            return Err(CheckoutError::invalid(&self.state, "capture"));
        }
        let (Some(session), Some(order_id)) = (self.session.clone(), self.approved_order.clone()) else {
            return Err(CheckoutError::NotReady(WIDGET_ERROR_MESSAGE.to_string()));
        };

        self.state = CheckoutState::Capturing;
        tracing::info!(payment_id = %session.payment_id, order_id = %order_id, "Capturing PayPal order");

        if let Err(e) = self
            .api
            .payments()
            .capture_payment(session.payment_id, &order_id)
            .await
        {
            tracing::error!(payment_id = %session.payment_id, error = %e, "PayPal capture failed");
            return Err(self.fail(describe(&e, CAPTURE_FAILED_MESSAGE)));
        }

        self.state = self.reconciler.settle(session.payment_id, &order_id).await;
        settled(&self.state)
    }

    async fn retry_reconciliation(&mut self) -> Result<PaymentReceipt, CheckoutError> {
        retry_settlement(&self.reconciler, &mut self.state).await
    }

    fn cancel(&mut self) {
        if !self.state.is_terminal() {
            tracing::info!("PayPal checkout cancelled");
            self.state = CheckoutState::Cancelled;
        }
    }

    fn reset(&mut self) {
        self.state = CheckoutState::Idle;
        self.session = None;
        self.approved_order = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_url_carries_the_order_token() {
        let buttons = PromptButtons::default();
        assert_eq!(
            buttons.approval_url("5O190127TN364715T"),
            "https://www.sandbox.paypal.com/checkoutnow?token=5O190127TN364715T"
        );
    }

    #[tokio::test]
    async fn mock_buttons_echo_the_order() {
        let buttons = MockPayPalButtons::approving();
        let config = ButtonsConfig {
            client_id: "client".into(),
            currency: "USD".into(),
            order_id: "ORDER-1".into(),
        };

        let outcome = buttons.render(&config).await;

        assert_eq!(
            outcome,
            ApprovalOutcome::Approved {
                order_id: "ORDER-1".into(),
                payer_id: Some("MOCKPAYER".into()),
            }
        );
        assert_eq!(buttons.render_count(), 1);
        assert_eq!(buttons.last_config(), Some(config));
    }
}
