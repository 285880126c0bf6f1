//! Renderer configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Renderer configuration.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Program launched for every render
    pub program: String,
    /// Arguments placed before the render subcommand
    pub program_args: Vec<String>,
    /// Working directory of the render tool
    pub project_dir: PathBuf,
    /// Directory receiving outputs and temporary parameter files
    pub output_dir: PathBuf,
    /// Maximum wait for a single invocation
    pub timeout: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            program: "npx".to_string(),
            program_args: vec!["remotion".to_string()],
            project_dir: PathBuf::from("."),
            output_dir: PathBuf::from("./out"),
            timeout: Duration::from_secs(300),
        }
    }
}

impl RendererConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            program: std::env::var("RENDER_PROGRAM").unwrap_or(defaults.program),
            program_args: std::env::var("RENDER_PROGRAM_ARGS")
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.program_args),
            project_dir: std::env::var("RENDER_PROJECT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.project_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            timeout: std::env::var("RENDER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}
