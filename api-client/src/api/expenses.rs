use crate::models::expense::{CategoryDraft, Expense, ExpenseCategory, ExpenseDraft, ExpenseFilter};
use crate::models::{Listing, Upload};
use crate::ApiClient;
use reqwest::Method;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

pub struct ExpensesApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ExpensesApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, filter: &ExpenseFilter) -> Result<Listing<Expense>, AppError> {
        self.client.get_with_query("/expense/", filter).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Expense, AppError> {
        self.client.get(&format!("/expense/{}/", id)).await
    }

    pub async fn create(&self, draft: &ExpenseDraft) -> Result<Expense, AppError> {
        draft.validate()?;
        self.client.post("/expense/", draft).await
    }

    /// Create an expense with a receipt attached (multipart).
    pub async fn create_with_receipt(&self, draft: &ExpenseDraft, receipt: &Upload) -> Result<Expense, AppError> {
        draft.validate()?;
        self.client
            .send_multipart(Method::POST, "/expense/", || draft.to_form(receipt))
            .await
    }

    pub async fn update(&self, id: Uuid, draft: &ExpenseDraft) -> Result<Expense, AppError> {
        draft.validate()?;
        self.client.put(&format!("/expense/{}/", id), draft).await
    }

    pub async fn update_with_receipt(
        &self,
        id: Uuid,
        draft: &ExpenseDraft,
        receipt: &Upload,
    ) -> Result<Expense, AppError> {
        draft.validate()?;
        self.client
            .send_multipart(Method::PUT, &format!("/expense/{}/", id), || {
                draft.to_form(receipt)
            })
            .await
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.client.delete(&format!("/expense/{}/", id)).await
    }

    pub async fn categories(&self) -> Result<Vec<ExpenseCategory>, AppError> {
        let listing: Listing<ExpenseCategory> = self.client.get("/expense/categories/").await?;
        Ok(listing.into_items())
    }

    pub async fn create_category(&self, draft: &CategoryDraft) -> Result<ExpenseCategory, AppError> {
        draft.validate()?;
        self.client.post("/expense/categories/", draft).await
    }

    pub async fn update_category(&self, id: i64, draft: &CategoryDraft) -> Result<ExpenseCategory, AppError> {
        draft.validate()?;
        self.client
            .put(&format!("/expense/categories/{}/", id), draft)
            .await
    }

    pub async fn delete_category(&self, id: i64) -> Result<(), AppError> {
        self.client
            .delete(&format!("/expense/categories/{}/", id))
            .await
    }
}
