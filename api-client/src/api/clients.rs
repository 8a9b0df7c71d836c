use crate::models::client::{Client, ClientDraft, ClientFilter};
use crate::models::Listing;
use crate::ApiClient;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

pub struct ClientsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ClientsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &ClientFilter) -> Result<Listing<Client>, AppError> {
        self.client.get_with_query("/client/", filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Client, AppError> {
        self.client.get(&format!("/client/{}/", id)).await
    }

    pub async fn create(&self, draft: &ClientDraft) -> Result<Client, AppError> {
        draft.validate()?;
        self.client.post("/client/", draft).await
    }

    pub async fn update(&self, id: Uuid, draft: &ClientDraft) -> Result<Client, AppError> {
        draft.validate()?;
        self.client.put(&format!("/client/{}/", id), draft).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.client.delete(&format!("/client/{}/", id)).await
    }
}
