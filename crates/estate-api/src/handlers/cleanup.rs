//! Session cleanup handler.

use axum::extract::State;
use axum::Json;
use estate_models::SessionId;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CleanupRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Serialize)]
pub struct CleanupResponse {
    pub success: bool,
}

/// Remove a session's uploads. Without a session id this is a no-op.
pub async fn cleanup(
    State(state): State<AppState>,
    request: Option<Json<CleanupRequest>>,
) -> ApiResult<Json<CleanupResponse>> {
    let request = request.map(|Json(r)| r).unwrap_or_default();

    if let Some(raw) = request.session_id.as_deref().filter(|s| !s.trim().is_empty()) {
        let session = SessionId::parse(raw)
            .ok_or_else(|| ApiError::bad_request("Nieprawidłowy identyfikator sesji"))?;
        state.sessions.remove_session(&session).await?;
    }

    Ok(Json(CleanupResponse { success: true }))
}
