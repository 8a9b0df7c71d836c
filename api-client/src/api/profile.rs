use crate::models::user::{ProfileUpdate, User};
use crate::models::Upload;
use crate::ApiClient;
use reqwest::multipart::Form;
use reqwest::Method;
use service_core::error::AppError;

pub struct ProfileApi<'a> {
    client: &'a ApiClient,
}

impl<'a> ProfileApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Current user; also refreshes the cached user on the auth context.
    pub async fn me(&self) -> Result<User, AppError> {
        let user: User = self.client.get("/users/profile/").await?;
        self.client.auth().set_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn details(&self) -> Result<User, AppError> {
        self.client.get("/users/profile/details/").await
    }

    pub async fn update(&self, update: &ProfileUpdate) -> Result<User, AppError> {
        let user: User = self.client.patch("/users/profile/update/", update).await?;
        self.client.auth().set_user(user.clone()).await?;
        Ok(user)
    }

    pub async fn upload_picture(&self, picture: &Upload) -> Result<User, AppError> {
        let user: User = self
            .client
            .send_multipart(Method::PATCH, "/users/profile/update/", || {
                Form::new().part("profile_picture", picture.to_part())
            })
            .await?;
        self.client.auth().set_user(user.clone()).await?;
        Ok(user)
    }
}
