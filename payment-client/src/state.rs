use api_client::models::payment::PaymentStatus;
use thiserror::Error;
use uuid::Uuid;

pub const CANCELLED_MESSAGE: &str = "Payment was cancelled";
pub const UNCONFIRMED_MESSAGE: &str =
    "Your payment was received but the invoice could not be updated yet. Please retry confirmation.";

/// Backend acknowledgement of a completed payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentReceipt {
    pub payment_id: Uuid,
    /// PaymentIntent id (Stripe) or order id (PayPal).
    pub gateway_reference: String,
    pub status: PaymentStatus,
}

/// The gateway took the money but the backend was not told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReconciliation {
    pub payment_id: Uuid,
    pub gateway_reference: String,
    /// Why the status update failed.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Initializing,
    Ready,
    Submitting,
    Approving,
    Capturing,
    Succeeded(PaymentReceipt),
    Cancelled,
    Failed(String),
    CapturedButUnconfirmed(PendingReconciliation),
}

impl CheckoutState {
    pub fn name(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::Initializing => "initializing",
            CheckoutState::Ready => "ready",
            CheckoutState::Submitting => "submitting",
            CheckoutState::Approving => "approving",
            CheckoutState::Capturing => "capturing",
            CheckoutState::Succeeded(_) => "succeeded",
            CheckoutState::Cancelled => "cancelled",
            CheckoutState::Failed(_) => "failed",
            CheckoutState::CapturedButUnconfirmed(_) => "captured_but_unconfirmed",
        }
    }

    /// No further gateway interaction happens from here without `reset`
    /// (or `retry_reconciliation` for the unconfirmed case).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutState::Succeeded(_)
                | CheckoutState::Cancelled
                | CheckoutState::Failed(_)
                | CheckoutState::CapturedButUnconfirmed(_)
        )
    }

    /// Sentence a UI shows for this state, if any.
    pub fn message(&self) -> Option<String> {
        match self {
            CheckoutState::Cancelled => Some(CANCELLED_MESSAGE.to_string()),
            CheckoutState::Failed(message) => Some(message.clone()),
            CheckoutState::CapturedButUnconfirmed(_) => Some(UNCONFIRMED_MESSAGE.to_string()),
            _ => None,
        }
    }
}

/// Failures of a checkout step. Every variant displays as the sentence the
/// payer should see.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// A step was attempted before its prerequisites were met; not terminal.
    #[error("{0}")]
    NotReady(String),

    /// Payer input is missing or invalid; not terminal.
    #[error("{0}")]
    MissingInput(String),

    #[error("{0}")]
    Initialization(String),

    #[error("{0}")]
    Payment(String),

    #[error("Payment was cancelled")]
    Cancelled,

    #[error("Your payment was received but the invoice could not be updated yet. Please retry confirmation.")]
    Unconfirmed(PendingReconciliation),

    #[error("Cannot {action} while the checkout is {from}")]
    InvalidState {
        from: &'static str,
        action: &'static str,
    },
}

impl CheckoutError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    pub(crate) fn invalid(state: &CheckoutState, action: &'static str) -> Self {
        CheckoutError::InvalidState {
            from: state.name(),
            action,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(!CheckoutState::Ready.is_terminal());
        assert!(CheckoutState::Cancelled.is_terminal());
        assert!(CheckoutState::Failed("x".into()).is_terminal());
    }

    #[test]
    fn errors_display_user_sentences() {
        assert_eq!(CheckoutError::Cancelled.user_message(), "Payment was cancelled");
        assert_eq!(
            CheckoutError::invalid(&CheckoutState::Idle, "confirm").user_message(),
            "Cannot confirm while the checkout is idle"
        );
    }
}
