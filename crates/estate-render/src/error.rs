//! Error types for render operations.

use std::time::Duration;

use thiserror::Error;

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while building or rendering a composition.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Request rejected before any tool invocation
    #[error("{0}")]
    Validation(String),

    #[error("Render tool not found in PATH: {0}")]
    ToolNotFound(String),

    #[error("Render tool failed: {message}")]
    ToolFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Render timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RenderError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a tool failure error.
    pub fn tool_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::ToolFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether the tool itself failed (as opposed to a bad request).
    pub fn is_tool_failure(&self) -> bool {
        matches!(
            self,
            RenderError::ToolFailed { .. } | RenderError::ToolNotFound(_) | RenderError::Timeout(_)
        )
    }

    /// Diagnostic text for the client: captured stderr when available.
    pub fn details(&self) -> String {
        match self {
            RenderError::ToolFailed {
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => stderr.clone(),
            other => other.to_string(),
        }
    }
}
