use crate::models::dashboard::{Dashboard, DateRange};
use crate::ApiClient;
use service_core::error::AppError;

pub struct DashboardApi<'a> {
    client: &'a ApiClient,
}

impl<'a> DashboardApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, range: Option<&DateRange>) -> Result<Dashboard, AppError> {
        match range {
            Some(range) => self.client.get_with_query("/users/dashboard/", range).await,
            None => self.client.get("/users/dashboard/").await,
        }
    }
}
