use crate::models::invoice::{Invoice, InvoiceDraft, InvoiceFilter, InvoiceStatus, StatusChange};
use crate::models::Listing;
use crate::ApiClient;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

pub struct InvoicesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> InvoicesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &InvoiceFilter) -> Result<Listing<Invoice>, AppError> {
        self.client.get_with_query("/invoice/", filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Invoice, AppError> {
        self.client.get(&format!("/invoice/{}/", id)).await
    }

    pub async fn create(&self, draft: &InvoiceDraft) -> Result<Invoice, AppError> {
        draft.validate()?;
        let invoice: Invoice = self.client.post("/invoice/", draft).await?;
        tracing::info!(invoice_id = %invoice.id, number = %invoice.invoice_number, "Invoice created");
        Ok(invoice)
    }

    pub async fn update(&self, id: Uuid, draft: &InvoiceDraft) -> Result<Invoice, AppError> {
        draft.validate()?;
        self.client.put(&format!("/invoice/{}/", id), draft).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.client.delete(&format!("/invoice/{}/", id)).await
    }

    pub async fn mark_as_paid(&self, id: Uuid) -> Result<Invoice, AppError> {
        self.client
            .patch(
                &format!("/invoice/{}/", id),
                &StatusChange {
                    status: InvoiceStatus::Paid,
                },
            )
            .await
    }
}
