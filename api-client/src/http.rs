use crate::auth::AuthContext;
use crate::config::ApiSettings;
use crate::models::user::{RefreshRequest, RefreshResponse};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use service_core::error::AppError;
use service_core::observability::REQUEST_ID_HEADER;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Authenticated HTTP client for the backend.
///
/// Cheap to clone; clones share the connection pool and the auth context.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    settings: Arc<ApiSettings>,
    auth: Arc<AuthContext>,
}

impl ApiClient {
    pub fn new(settings: ApiSettings, auth: Arc<AuthContext>) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(secs) = settings.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings: Arc::new(settings),
            auth,
        })
    }

    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.auth
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self.execute(Method::GET, path, true, |r| r).await?;
        decode(response).await
    }

    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .execute(Method::GET, path, true, |r| r.query(query))
            .await?;
        decode(response).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::POST, path, body).await
    }

    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self.execute(Method::POST, path, true, |r| r).await?;
        decode(response).await
    }

    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PUT, path, body).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send_json(Method::PATCH, path, body).await
    }

    /// DELETE; any response body is ignored.
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        let response = self.execute(Method::DELETE, path, true, |r| r).await?;
        ensure_success(response).await
    }

    /// Multipart request. `form` is called again if the request is retried
    /// after a token refresh, since a sent form cannot be reused.
    pub async fn send_multipart<T, F>(&self, method: Method, path: &str, form: F) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        F: Fn() -> Form,
    {
        let response = self
            .execute(method, path, true, |r| r.multipart(form()))
            .await?;
        decode(response).await
    }

    /// Unauthenticated GET; never triggers a token refresh.
    pub async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let response = self.execute(Method::GET, path, false, |r| r).await?;
        decode(response).await
    }

    /// Unauthenticated POST, used by the sign-in endpoints.
    pub async fn post_public<T, B>(&self, path: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .execute(Method::POST, path, false, |r| r.json(body))
            .await?;
        decode(response).await
    }

    async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T, AppError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self.execute(method, path, true, |r| r.json(body)).await?;
        decode(response).await
    }

    /// Send a request, refreshing the access token and retrying once on 401.
    async fn execute<F>(
        &self,
        method: Method,
        path: &str,
        authenticated: bool,
        build: F,
    ) -> Result<Response, AppError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let url = self.url(path);
        let token = if authenticated {
            self.auth.access_token().await
        } else {
            None
        };

        let response = self.dispatch(&method, &url, token.as_deref(), &build).await?;
        if !authenticated || response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if self.auth.refresh_token().await.is_none() {
            if token.is_some() {
                self.auth.expire().await;
                return Err(AppError::SessionExpired);
            }
            // Never signed in: let the 401 surface as is.
            return Ok(response);
        }

        tracing::debug!(method = %method, url = %url, "Access token rejected, refreshing");
        let fresh = self.refresh_access_token(token.as_deref()).await?;
        self.dispatch(&method, &url, Some(&fresh), &build).await
    }

    async fn dispatch<F>(
        &self,
        method: &Method,
        url: &str,
        token: Option<&str>,
        build: &F,
    ) -> Result<Response, AppError>
    where
        F: Fn(RequestBuilder) -> RequestBuilder,
    {
        let mut request = self
            .client
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        if is_unsafe(method) {
            if let Some(csrf) = self.auth.csrf_token().await {
                request = request.header(self.settings.csrf_header.as_str(), csrf);
            }
        }

        let response = build(request).send().await.map_err(|e| {
            tracing::error!(method = %method, url = %url, error = %e, "HTTP request failed");
            AppError::from(e)
        })?;

        tracing::debug!(method = %method, url = %url, status = response.status().as_u16(), "API response");
        Ok(response)
    }

    /// Single-flight refresh. `stale` is the token the failed request used;
    /// if another task already replaced it, that token is reused.
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, AppError> {
        let _guard = self.auth.refresh_lock().lock().await;

        if let Some(current) = self.auth.access_token().await {
            if stale != Some(current.as_str()) {
                return Ok(current);
            }
        }

        let Some(refresh) = self.auth.refresh_token().await else {
            self.auth.expire().await;
            return Err(AppError::SessionExpired);
        };

        let url = self.url(&self.settings.refresh_path);
        let outcome = self
            .client
            .post(&url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string())
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await;

        let refreshed = match outcome {
            Ok(response) => decode::<RefreshResponse>(response).await,
            Err(e) => Err(AppError::from(e)),
        };

        match refreshed {
            Ok(tokens) => {
                let access = tokens.access.clone();
                self.auth.update_access(tokens.access, tokens.refresh).await?;
                tracing::info!("Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                self.auth.expire().await;
                Err(AppError::SessionExpired)
            }
        }
    }
}

fn is_unsafe(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

/// Decode a JSON response, mapping non-success statuses to [`AppError`].
/// An empty success body decodes as JSON `null`.
pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    let body = response.text().await.map_err(AppError::from)?;

    if !status.is_success() {
        return Err(AppError::from_status(status.as_u16(), &body));
    }

    let body = if body.trim().is_empty() { "null" } else { body.as_str() };
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(status = status.as_u16(), error = %e, "Failed to decode response body");
        AppError::Decode(e.to_string())
    })
}

async fn ensure_success(response: Response) -> Result<(), AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::from_status(status.as_u16(), &body))
}
