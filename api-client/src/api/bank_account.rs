use crate::models::bank_account::{BankAccount, BankAccountDraft};
use crate::ApiClient;
use service_core::error::AppError;
use validator::Validate;

/// The signed-in user's single payout bank account.
pub struct BankAccountApi<'a> {
    client: &'a ApiClient,
}

impl<'a> BankAccountApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// `None` when no account has been added yet.
    pub async fn get(&self) -> Result<Option<BankAccount>, AppError> {
        match self.client.get("/users/bank-account/").await {
            Ok(account) => Ok(Some(account)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn create(&self, draft: &BankAccountDraft) -> Result<BankAccount, AppError> {
        draft.validate()?;
        self.client.post("/users/bank-account/", draft).await
    }

    pub async fn update(&self, draft: &BankAccountDraft) -> Result<BankAccount, AppError> {
        draft.validate()?;
        self.client.patch("/users/bank-account/", draft).await
    }

    pub async fn delete(&self) -> Result<(), AppError> {
        self.client.delete("/users/bank-account/").await
    }
}
