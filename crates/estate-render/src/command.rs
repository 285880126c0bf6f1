//! Render CLI command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::RendererConfig;
use crate::error::{RenderError, RenderResult};

/// Render CLI subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Full video render
    Render,
    /// Single still frame
    Still,
}

impl RenderMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Render => "render",
            RenderMode::Still => "still",
        }
    }
}

/// Builder for render CLI invocations.
#[derive(Debug, Clone)]
pub struct RenderCommand {
    mode: RenderMode,
    composition: String,
    output: PathBuf,
    props_file: PathBuf,
    frame: Option<u32>,
}

impl RenderCommand {
    /// Create a new command. Stills render frame 0 unless told otherwise.
    pub fn new(
        mode: RenderMode,
        composition: impl Into<String>,
        output: impl AsRef<Path>,
        props_file: impl AsRef<Path>,
    ) -> Self {
        Self {
            mode,
            composition: composition.into(),
            output: output.as_ref().to_path_buf(),
            props_file: props_file.as_ref().to_path_buf(),
            frame: (mode == RenderMode::Still).then_some(0),
        }
    }

    /// Set the still frame.
    pub fn frame(mut self, frame: u32) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn composition(&self) -> &str {
        &self.composition
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn props_file(&self) -> &Path {
        &self.props_file
    }

    /// Build the subcommand arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            self.mode.as_str().to_string(),
            self.composition.clone(),
            self.output.to_string_lossy().to_string(),
            "--props".to_string(),
            self.props_file.to_string_lossy().to_string(),
        ];

        if let Some(frame) = self.frame {
            args.push("--frame".to_string());
            args.push(frame.to_string());
        }

        args
    }
}

/// Something that can execute a render command.
#[async_trait]
pub trait CompositionRenderer: Send + Sync {
    /// Run the command to completion, producing its output file.
    async fn render(&self, cmd: &RenderCommand) -> RenderResult<()>;
}

/// Runs the render CLI as a child process with a bounded wait.
#[derive(Debug, Clone)]
pub struct RenderRunner {
    program: String,
    program_args: Vec<String>,
    project_dir: PathBuf,
    timeout: Duration,
}

impl RenderRunner {
    /// Create a runner from renderer configuration.
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            program: config.program.clone(),
            program_args: config.program_args.clone(),
            project_dir: config.project_dir.clone(),
            timeout: config.timeout,
        }
    }

    /// Full argument list passed to the program.
    pub fn command_line(&self, cmd: &RenderCommand) -> Vec<String> {
        let mut args = self.program_args.clone();
        args.extend(cmd.build_args());
        args
    }
}

#[async_trait]
impl CompositionRenderer for RenderRunner {
    async fn render(&self, cmd: &RenderCommand) -> RenderResult<()> {
        which::which(&self.program).map_err(|_| RenderError::ToolNotFound(self.program.clone()))?;

        let args = self.command_line(cmd);
        debug!("Running render tool: {} {}", self.program, args.join(" "));

        let start = Instant::now();
        let child = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    composition = cmd.composition(),
                    "Render tool timed out after {:?}, killing process", self.timeout
                );
                return Err(RenderError::Timeout(self.timeout));
            }
        };

        debug!(
            composition = cmd.composition(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Render tool finished"
        );

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(RenderError::tool_failed(
                "render tool exited with non-zero status",
                (!stderr.is_empty()).then_some(stderr),
                output.status.code(),
            ))
        }
    }
}

/// Check if the render program is available.
pub fn check_render_tool(program: &str) -> RenderResult<PathBuf> {
    which::which(program).map_err(|_| RenderError::ToolNotFound(program.to_string()))
}
