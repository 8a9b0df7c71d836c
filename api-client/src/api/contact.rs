use crate::models::contact::{ContactMessage, ContactReceipt};
use crate::ApiClient;
use service_core::error::AppError;
use validator::Validate;

pub struct ContactApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ContactApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Sent without credentials; the form is open to anonymous visitors.
    pub async fn send(&self, message: &ContactMessage) -> Result<ContactReceipt, AppError> {
        message.validate()?;
        let receipt: ContactReceipt = self.client.post_public("/users/contact/", message).await?;
        tracing::info!(subject = %message.subject, "Contact message sent");
        Ok(receipt)
    }
}
