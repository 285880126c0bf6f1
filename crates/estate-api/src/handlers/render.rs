//! Render handler.

use std::time::Instant;

use axum::extract::State;
use axum::Json;
use estate_models::RenderRequest;
use serde::Serialize;
use tracing::warn;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::metrics;
use crate::state::AppState;

/// Render response.
#[derive(Serialize)]
pub struct RenderResponse {
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub download_url: String,
    /// Suggested download name
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slide_count: Option<usize>,
}

/// Render a listing video or carousel and wait for the result.
pub async fn render(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<RenderRequest>,
) -> ApiResult<Json<RenderResponse>> {
    let template = request.template().map(|t| t.as_str()).unwrap_or("unknown");
    let start = Instant::now();

    let result = state.renderer.render(&request).await;
    let elapsed = start.elapsed().as_secs_f64();

    match result {
        Ok(output) => {
            metrics::record_render(output.template.as_str(), "success", elapsed);
            Ok(Json(RenderResponse {
                success: true,
                kind: output.kind(),
                download_url: format!("/download/{}", output.file_name),
                filename: output.download_name,
                slide_count: output.slide_count,
            }))
        }
        Err(e) => {
            let status = if e.is_tool_failure() { "failed" } else { "rejected" };
            if e.is_tool_failure() {
                warn!(template = template, error = %e, "Render failed");
            }
            metrics::record_render(template, status, elapsed);
            Err(e.into())
        }
    }
}
