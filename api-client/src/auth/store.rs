use crate::models::user::{Tokens, User};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What survives a restart: the token pair and the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub tokens: Tokens,
    #[serde(default)]
    pub user: Option<User>,
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<StoredSession>, AppError>;
    async fn save(&self, session: &StoredSession) -> Result<(), AppError>;
    async fn clear(&self) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct MemoryTokenStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }

    /// Snapshot of what is stored right now.
    pub fn snapshot(&self) -> Option<StoredSession> {
        self.session.lock().ok().and_then(|guard| guard.clone())
    }

    fn with_lock<R>(&self, f: impl FnOnce(&mut Option<StoredSession>) -> R) -> Result<R, AppError> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| AppError::Storage("token store lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredSession>, AppError> {
        self.with_lock(|session| session.clone())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), AppError> {
        self.with_lock(|stored| *stored = Some(session.clone()))
    }

    async fn clear(&self) -> Result<(), AppError> {
        self.with_lock(|stored| *stored = None)
    }
}

/// JSON file on disk. A corrupt file is treated as no session.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredSession>, AppError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&raw) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Discarding unreadable session file");
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let body = serde_json::to_vec_pretty(session)?;
        let staging = self.path.with_extension("tmp");
        tokio::fs::write(&staging, body).await?;
        tokio::fs::rename(&staging, &self.path).await?;
        Ok(())
    }

    async fn clear(&self) -> Result<(), AppError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
