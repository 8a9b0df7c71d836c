//! Explicit session state for the API layer.
//!
//! Nothing reads tokens from ambient storage: an [`AuthContext`] is built
//! once (optionally restored from a [`TokenStore`]) and handed to the
//! [`ApiClient`](crate::ApiClient). Session changes are published on a watch
//! channel so a UI can show the "session expired" notice.

mod store;

pub use store::{FileTokenStore, MemoryTokenStore, StoredSession, TokenStore};

use crate::models::user::{Tokens, User};
use service_core::error::AppError;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Anonymous,
    Authenticated,
    /// Refresh failed; the user has to sign in again.
    Expired,
}

pub struct AuthContext {
    store: Arc<dyn TokenStore>,
    tokens: RwLock<Option<Tokens>>,
    user: RwLock<Option<User>>,
    csrf_token: RwLock<Option<String>>,
    refresh_lock: Mutex<()>,
    status: watch::Sender<SessionStatus>,
}

impl AuthContext {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        let (status, _) = watch::channel(SessionStatus::Anonymous);
        Self {
            store,
            tokens: RwLock::new(None),
            user: RwLock::new(None),
            csrf_token: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            status,
        }
    }

    /// Context without persistence.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStore::new()))
    }

    /// Build a context and load any previously stored session.
    pub async fn restore(store: Arc<dyn TokenStore>) -> Result<Self, AppError> {
        let context = Self::new(store);
        if let Some(session) = context.store.load().await? {
            tracing::info!("Restored stored session");
            *context.tokens.write().await = Some(session.tokens);
            *context.user.write().await = session.user;
            context.status.send_replace(SessionStatus::Authenticated);
        }
        Ok(context)
    }

    pub async fn access_token(&self) -> Option<String> {
        self.tokens.read().await.as_ref().map(|t| t.access.clone())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .await
            .as_ref()
            .and_then(|t| t.refresh.clone())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.tokens.read().await.is_some()
    }

    pub async fn sign_in(&self, tokens: Tokens, user: Option<User>) -> Result<(), AppError> {
        let session = StoredSession {
            tokens: tokens.clone(),
            user: user.clone(),
        };
        *self.tokens.write().await = Some(tokens);
        *self.user.write().await = user;
        self.store.save(&session).await?;
        self.status.send_replace(SessionStatus::Authenticated);
        Ok(())
    }

    /// Replace the access token after a refresh. A missing `refresh` keeps
    /// the current refresh token.
    pub async fn update_access(&self, access: String, refresh: Option<String>) -> Result<(), AppError> {
        let tokens = {
            let mut guard = self.tokens.write().await;
            let refresh = refresh.or_else(|| guard.as_ref().and_then(|t| t.refresh.clone()));
            let tokens = Tokens { access, refresh };
            *guard = Some(tokens.clone());
            tokens
        };
        let user = self.user.read().await.clone();
        self.store.save(&StoredSession { tokens, user }).await
    }

    pub async fn set_user(&self, user: User) -> Result<(), AppError> {
        *self.user.write().await = Some(user.clone());
        let tokens = self.tokens.read().await.clone();
        match tokens {
            Some(tokens) => {
                self.store
                    .save(&StoredSession {
                        tokens,
                        user: Some(user),
                    })
                    .await
            }
            None => Ok(()),
        }
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.forget().await;
        self.store.clear().await?;
        self.status.send_replace(SessionStatus::Anonymous);
        Ok(())
    }

    /// Drop the session after a failed refresh and publish `Expired`.
    pub async fn expire(&self) {
        self.forget().await;
        if let Err(e) = self.store.clear().await {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }
        self.status.send_replace(SessionStatus::Expired);
        tracing::warn!("Session expired, signed out");
    }

    pub async fn set_csrf_token(&self, token: Option<String>) {
        *self.csrf_token.write().await = token;
    }

    pub async fn csrf_token(&self) -> Option<String> {
        self.csrf_token.read().await.clone()
    }

    pub fn status(&self) -> SessionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    pub(crate) fn refresh_lock(&self) -> &Mutex<()> {
        &self.refresh_lock
    }

    async fn forget(&self) {
        *self.tokens.write().await = None;
        *self.user.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(access: &str) -> Tokens {
        Tokens {
            access: access.into(),
            refresh: Some("refresh-1".into()),
        }
    }

    #[tokio::test]
    async fn restore_loads_stored_session() {
        let store = Arc::new(MemoryTokenStore::with_session(StoredSession {
            tokens: tokens("access-1"),
            user: None,
        }));
        let context = AuthContext::restore(store).await.unwrap();

        assert_eq!(context.access_token().await.as_deref(), Some("access-1"));
        assert_eq!(context.status(), SessionStatus::Authenticated);
    }

    #[tokio::test]
    async fn update_access_keeps_refresh_token() {
        let store = Arc::new(MemoryTokenStore::new());
        let context = AuthContext::new(store.clone());
        context.sign_in(tokens("access-1"), None).await.unwrap();

        context.update_access("access-2".into(), None).await.unwrap();

        assert_eq!(context.refresh_token().await.as_deref(), Some("refresh-1"));
        let stored = store.snapshot().unwrap();
        assert_eq!(stored.tokens.access, "access-2");
    }

    #[tokio::test]
    async fn expire_clears_and_notifies() {
        let store = Arc::new(MemoryTokenStore::new());
        let context = AuthContext::new(store.clone());
        context.sign_in(tokens("access-1"), None).await.unwrap();
        let mut status = context.subscribe();

        context.expire().await;

        status.changed().await.unwrap();
        assert_eq!(*status.borrow(), SessionStatus::Expired);
        assert!(context.access_token().await.is_none());
        assert!(store.snapshot().is_none());
    }
}
