//! Photo and logo upload handlers.

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::Json;
use estate_models::PhotoRef;
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::security::sanitize_file_name;
use crate::state::AppState;

/// Multipart field carrying the session id.
const SESSION_FIELD: &str = "session_id";

/// Multipart field carrying the agency logo.
const LOGO_FIELD: &str = "logo";

struct UploadedFile {
    field: String,
    file_name: String,
    bytes: Bytes,
}

/// Parsed multipart form. Fields may arrive in any order.
struct UploadForm {
    session_id: Option<String>,
    files: Vec<UploadedFile>,
}

async fn read_form(mut multipart: Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm {
        session_id: None,
        files: Vec::new(),
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Nieprawidłowe dane formularza: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);

        match file_name {
            Some(file_name) if !file_name.trim().is_empty() => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Nie udało się odczytać pliku: {}", e)))?;
                form.files.push(UploadedFile {
                    field: name,
                    file_name,
                    bytes,
                });
            }
            Some(_) => {}
            None if name == SESSION_FIELD => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Nieprawidłowe dane formularza: {}", e)))?;
                form.session_id = Some(text);
            }
            None => {}
        }
    }

    Ok(form)
}

/// Upload response.
#[derive(Serialize)]
pub struct UploadResponse {
    pub session_id: String,
    pub files: Vec<PhotoRef>,
}

/// Save every file of the form into the session directory.
pub async fn upload_photos(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let form = read_form(multipart).await?;
    let session = state.sessions.resolve_session(form.session_id.as_deref())?;

    let mut files = Vec::with_capacity(form.files.len());
    for file in &form.files {
        files.push(state.sessions.save_file(&session, &file.file_name, &file.bytes).await?);
    }

    info!(session_id = %session, count = files.len(), "Photos uploaded");
    metrics::record_uploaded_files("photo", files.len());

    Ok(Json(UploadResponse {
        session_id: session.to_string(),
        files,
    }))
}

/// Logo upload response.
#[derive(Serialize)]
pub struct LogoResponse {
    pub session_id: String,
    #[serde(rename = "logoPath")]
    pub logo_path: String,
}

/// Save the agency logo under a `logo_` prefixed name.
pub async fn upload_logo(
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<LogoResponse>> {
    let form = read_form(multipart).await?;
    let session = state.sessions.resolve_session(form.session_id.as_deref())?;

    let logo = form
        .files
        .iter()
        .find(|f| f.field == LOGO_FIELD)
        .ok_or_else(|| ApiError::bad_request("Brak pliku logo"))?;

    let name = sanitize_file_name(&logo.file_name)
        .ok_or_else(|| ApiError::bad_request(format!("Nieprawidłowa nazwa pliku: {}", logo.file_name)))?;
    let saved = state
        .sessions
        .save_file(&session, &format!("logo_{}", name), &logo.bytes)
        .await?;

    info!(session_id = %session, file = %saved.name, "Logo uploaded");
    metrics::record_uploaded_files("logo", 1);

    Ok(Json(LogoResponse {
        session_id: session.to_string(),
        logo_path: saved.path,
    }))
}
