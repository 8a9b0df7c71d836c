use crate::models::user::{
    AuthResponse, LoginRequest, MessageResponse, RegisterRequest, ResendVerificationRequest, User,
};
use crate::ApiClient;
use service_core::error::AppError;
use validator::Validate;

/// Registration, sign-in and email verification.
pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Register and sign in with the returned tokens.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        request.validate()?;
        let response: AuthResponse = self.client.post_public("/users/register/", request).await?;
        self.establish(response).await
    }

    pub async fn login(&self, request: &LoginRequest) -> Result<User, AppError> {
        request.validate()?;
        let response: AuthResponse = self.client.post_public("/users/login/", request).await?;
        self.establish(response).await
    }

    pub async fn logout(&self) -> Result<(), AppError> {
        self.client.auth().sign_out().await?;
        tracing::info!("Signed out");
        Ok(())
    }

    pub async fn verify_email(&self, token: &str) -> Result<MessageResponse, AppError> {
        self.client
            .get_public(&format!("/users/verify-email/{}/", token))
            .await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<MessageResponse, AppError> {
        self.client
            .post_public("/users/resend-verification/", &ResendVerificationRequest { email })
            .await
    }

    async fn establish(&self, response: AuthResponse) -> Result<User, AppError> {
        let user = response.user;
        self.client
            .auth()
            .sign_in(response.tokens, Some(user.clone()))
            .await?;
        tracing::info!(user_id = user.id, "Signed in");
        Ok(user)
    }
}
