use crate::state::{CheckoutState, PaymentReceipt, PendingReconciliation};
use api_client::models::payment::PaymentStatus;
use api_client::ApiClient;
use service_core::error::AppError;
use uuid::Uuid;

/// Records gateway confirmations on the backend.
#[derive(Clone)]
pub struct Reconciler {
    api: ApiClient,
}

impl Reconciler {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Mark the payment `completed`. Safe to repeat: a payment that is
    /// already completed simply reports completed again.
    pub async fn confirm(&self, payment_id: Uuid, gateway_reference: &str) -> Result<PaymentReceipt, AppError> {
        let record = self
            .api
            .payments()
            .update_payment_status(payment_id, PaymentStatus::Completed, gateway_reference)
            .await?;

        if record.status != PaymentStatus::Completed {
            tracing::warn!(
                payment_id = %payment_id,
                status = %record.status,
                "Backend did not report the payment as completed"
            );
        }
        tracing::info!(payment_id = %payment_id, "Payment reconciled");

        Ok(PaymentReceipt {
            payment_id,
            gateway_reference: record
                .gateway_payment_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| gateway_reference.to_string()),
            status: record.status,
        })
    }

    /// Reconcile after the gateway captured funds. A failure here is not a
    /// payment failure: the state becomes `CapturedButUnconfirmed`.
    pub async fn settle(&self, payment_id: Uuid, gateway_reference: &str) -> CheckoutState {
        match self.confirm(payment_id, gateway_reference).await {
            Ok(receipt) => CheckoutState::Succeeded(receipt),
            Err(e) => {
                tracing::error!(
                    payment_id = %payment_id,
                    error = %e,
                    "Gateway captured the payment but the status update failed"
                );
                CheckoutState::CapturedButUnconfirmed(PendingReconciliation {
                    payment_id,
                    gateway_reference: gateway_reference.to_string(),
                    reason: e.user_message(),
                })
            }
        }
    }
}
