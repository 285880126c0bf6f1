//! Per-session upload directories.
//!
//! Files live under `{uploads_dir}/{session_id}/{file_name}` and are
//! referenced by the render tool as `uploads/{session_id}/{file_name}`,
//! relative to the public directory.

use std::path::{Path, PathBuf};

use estate_models::{PhotoRef, SessionId};
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::security::sanitize_file_name;

/// Prefix of every path handed to clients.
pub const UPLOADS_PREFIX: &str = "uploads";

/// Filesystem store for uploaded and scraped files.
#[derive(Debug, Clone)]
pub struct SessionStore {
    uploads_dir: PathBuf,
}

impl SessionStore {
    pub fn new(uploads_dir: impl Into<PathBuf>) -> Self {
        Self {
            uploads_dir: uploads_dir.into(),
        }
    }

    pub fn uploads_dir(&self) -> &Path {
        &self.uploads_dir
    }

    /// Use the client's session id, or generate one when none was given.
    pub fn resolve_session(&self, supplied: Option<&str>) -> ApiResult<SessionId> {
        match supplied.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(SessionId::new()),
            Some(raw) => SessionId::parse(raw)
                .ok_or_else(|| ApiError::bad_request("Nieprawidłowy identyfikator sesji")),
        }
    }

    fn session_dir(&self, session: &SessionId) -> PathBuf {
        self.uploads_dir.join(session.as_str())
    }

    /// Save a file under a sanitized name, replacing any previous file with
    /// the same name.
    pub async fn save_file(
        &self,
        session: &SessionId,
        file_name: &str,
        bytes: &[u8],
    ) -> ApiResult<PhotoRef> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| ApiError::bad_request(format!("Nieprawidłowa nazwa pliku: {}", file_name)))?;

        let dir = self.session_dir(session);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), bytes).await?;

        debug!(session_id = %session, file = %name, size = bytes.len(), "Saved upload");

        let path = format!("{}/{}/{}", UPLOADS_PREFIX, session, name);
        Ok(PhotoRef::new(name, path))
    }

    /// Remove a session directory. Returns whether anything was removed.
    pub async fn remove_session(&self, session: &SessionId) -> ApiResult<bool> {
        match tokio::fs::remove_dir_all(self.session_dir(session)).await {
            Ok(()) => {
                info!(session_id = %session, "Session uploads removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
