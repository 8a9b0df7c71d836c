use crate::models::payment::{
    AvailableGateway, CaptureRequest, CreateSessionRequest, GatewayCheck, GatewayConfig,
    GatewayConfigDraft, GatewayInfo, Payment, PaymentRecord, PaymentStatus, PaymentStatusReport,
    PublicPaymentInfo, RefundResponse, SessionResponse, StatusUpdate,
};
use crate::models::{Listing, PageQuery};
use crate::ApiClient;
use service_core::error::AppError;
use uuid::Uuid;

/// Payment endpoints: gateway discovery, sessions, capture, status and
/// gateway configuration.
pub struct PaymentsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> PaymentsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn check_invoice_gateway(&self, invoice_id: Uuid) -> Result<GatewayCheck, AppError> {
        self.client
            .get(&format!("/payment/invoice/{}/gateway-check/", invoice_id))
            .await
    }

    pub async fn get_invoice_payment_gateway(&self, invoice_id: Uuid) -> Result<GatewayInfo, AppError> {
        self.client
            .get(&format!("/payment/invoice/{}/gateway/", invoice_id))
            .await
    }

    /// Create a session for the invoice.
    ///
    /// No de-duplication happens here: two calls create two sessions.
    /// A response carrying `error` is turned into [`AppError::BadRequest`].
    pub async fn create_payment_session(&self, request: &CreateSessionRequest) -> Result<SessionResponse, AppError> {
        let session: SessionResponse = self.client.post("/payment/create-session/", request).await?;
        if let Some(error) = session.error.as_ref().filter(|e| !e.trim().is_empty()) {
            tracing::warn!(invoice_id = %request.invoice_id, error = %error, "Payment session rejected");
            return Err(AppError::bad_request(error.clone()));
        }
        tracing::info!(
            invoice_id = %request.invoice_id,
            payment_id = ?session.payment_id,
            "Payment session created"
        );
        Ok(session)
    }

    pub async fn capture_payment(&self, payment_id: Uuid, order_id: &str) -> Result<PaymentRecord, AppError> {
        self.client
            .post(
                &format!("/payment/capture/{}/", payment_id),
                &CaptureRequest {
                    order_id: order_id.to_string(),
                },
            )
            .await
    }

    pub async fn get_payment_status(&self, payment_id: Uuid) -> Result<PaymentStatusReport, AppError> {
        self.client
            .get(&format!("/payment/status/{}/", payment_id))
            .await
    }

    pub async fn update_payment_status(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        gateway_payment_id: &str,
    ) -> Result<PaymentRecord, AppError> {
        self.client
            .patch(
                &format!("/payment/status/{}/", payment_id),
                &StatusUpdate {
                    status,
                    gateway_payment_id: gateway_payment_id.to_string(),
                },
            )
            .await
    }

    pub async fn refund_payment(&self, payment_id: Uuid) -> Result<RefundResponse, AppError> {
        self.client
            .post_empty(&format!("/payment/refund/{}/", payment_id))
            .await
    }

    pub async fn invoice_payments(&self, invoice_id: Uuid) -> Result<Listing<Payment>, AppError> {
        self.client
            .get(&format!("/payment/invoice/{}/payments/", invoice_id))
            .await
    }

    pub async fn all_payments(&self, page: &PageQuery) -> Result<Listing<Payment>, AppError> {
        self.client.get_with_query("/payment/all/", page).await
    }

    /// Unauthenticated; used by the public invoice page.
    pub async fn public_payment_info(&self, invoice_id: Uuid) -> Result<PublicPaymentInfo, AppError> {
        self.client
            .get_public(&format!("/payment/public/invoice/{}/", invoice_id))
            .await
    }

    pub async fn gateways(&self) -> Result<Vec<GatewayConfig>, AppError> {
        let listing: Listing<GatewayConfig> = self.client.get("/payment/gateways/").await?;
        Ok(listing.into_items())
    }

    pub async fn create_gateway(&self, draft: &GatewayConfigDraft) -> Result<GatewayConfig, AppError> {
        let config: GatewayConfig = self.client.post("/payment/gateways/", draft).await?;
        tracing::info!(gateway_id = %config.id, gateway = %config.gateway_name, "Gateway configured");
        Ok(config)
    }

    pub async fn update_gateway(&self, id: Uuid, draft: &GatewayConfigDraft) -> Result<GatewayConfig, AppError> {
        self.client
            .put(&format!("/payment/gateways/{}/", id), draft)
            .await
    }

    pub async fn delete_gateway(&self, id: Uuid) -> Result<(), AppError> {
        self.client
            .delete(&format!("/payment/gateways/{}/", id))
            .await
    }

    pub async fn available_gateways(&self) -> Result<Vec<AvailableGateway>, AppError> {
        self.client.get("/payment/available-gateways/").await
    }
}
