//! Structured render logging.

use std::path::Path;
use std::time::Instant;

use estate_models::{RenderId, Template};
use tracing::{error, info, warn, Span};

use crate::error::RenderError;
use crate::props::RenderJob;
use crate::service::RenderOutput;

/// Event log for one render.
///
/// The span carries the render id, template and job count. Job events add
/// the slide position, composition and produced file; the final event adds
/// the elapsed time.
#[derive(Debug)]
pub struct RenderLogger {
    render_id: RenderId,
    template: Template,
    total_jobs: usize,
    started: Instant,
}

impl RenderLogger {
    pub fn new(render_id: &RenderId, template: Template, total_jobs: usize) -> Self {
        Self {
            render_id: render_id.clone(),
            template,
            total_jobs,
            started: Instant::now(),
        }
    }

    /// Span covering the whole render.
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "render",
            render_id = %self.render_id,
            template = self.template.as_str(),
            jobs = self.total_jobs
        )
    }

    pub fn started(&self, photos: usize) {
        info!(
            composition = self.template.composition(),
            photos = photos,
            "Render started"
        );
    }

    /// Position of a job as shown in logs, e.g. `2/6`.
    fn position(&self, index: usize) -> String {
        format!("{}/{}", index + 1, self.total_jobs)
    }

    pub fn job_finished(&self, index: usize, job: &RenderJob, output: &Path) {
        let file = output.file_name().map(|f| f.to_string_lossy()).unwrap_or_default();
        info!(
            position = %self.position(index),
            composition = job.composition,
            slide = %job.name,
            file = %file,
            "Render job finished"
        );
    }

    pub fn archived(&self, archive: &str, slides: usize) {
        info!(archive = archive, slides = slides, "Slides archived");
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn completed(&self, output: &RenderOutput) {
        info!(
            file = %output.file_name,
            slides = ?output.slide_count,
            elapsed_ms = self.elapsed_ms(),
            "Render completed"
        );
    }

    pub fn failed(&self, err: &RenderError) {
        if err.is_tool_failure() {
            error!(
                error = %err,
                details = %err.details(),
                elapsed_ms = self.elapsed_ms(),
                "Render failed"
            );
        } else {
            warn!(error = %err, elapsed_ms = self.elapsed_ms(), "Render aborted");
        }
    }
}
