//! Render orchestration: parameters to files to finished output.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use estate_models::{RenderId, RenderRequest, Template};
use tempfile::NamedTempFile;
use tracing::Instrument;

use crate::archive::archive_stills;
use crate::command::{CompositionRenderer, RenderCommand, RenderRunner};
use crate::config::RendererConfig;
use crate::error::{RenderError, RenderResult};
use crate::logging::RenderLogger;
use crate::props::{render_jobs, RenderJob};

/// A finished render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub render_id: RenderId,
    pub template: Template,
    /// File name inside the output directory
    pub file_name: String,
    /// Name offered to the client
    pub download_name: String,
    /// Number of slides for carousels
    pub slide_count: Option<usize>,
}

impl RenderOutput {
    pub fn kind(&self) -> &'static str {
        self.template.output_kind()
    }
}

/// Renders requests into files under the output directory.
#[derive(Clone)]
pub struct RenderService {
    renderer: Arc<dyn CompositionRenderer>,
    output_dir: PathBuf,
}

impl RenderService {
    pub fn new(renderer: Arc<dyn CompositionRenderer>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            renderer,
            output_dir: output_dir.into(),
        }
    }

    /// Service backed by the render CLI.
    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(Arc::new(RenderRunner::new(config)), config.output_dir.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Render a request.
    ///
    /// The request is fully validated before the tool is invoked.
    pub async fn render(&self, request: &RenderRequest) -> RenderResult<RenderOutput> {
        let template = request
            .template()
            .map_err(|e| RenderError::validation(e.to_string()))?;
        let jobs = render_jobs(template, request)?;

        let render_id = RenderId::new();
        let logger = RenderLogger::new(&render_id, template, jobs.len());
        let span = logger.span();

        async {
            logger.started(request.photos.len());

            let result = match tokio::fs::create_dir_all(&self.output_dir).await {
                Err(e) => Err(e.into()),
                Ok(()) => match template {
                    Template::Carousel => self.render_carousel(&render_id, &jobs, &logger).await,
                    Template::Reel | Template::Sold => {
                        self.render_video(&render_id, template, &jobs, &logger).await
                    }
                },
            };

            match &result {
                Ok(output) => logger.completed(output),
                Err(e) => logger.failed(e),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn render_video(
        &self,
        render_id: &RenderId,
        template: Template,
        jobs: &[RenderJob],
        logger: &RenderLogger,
    ) -> RenderResult<RenderOutput> {
        let job = jobs
            .first()
            .ok_or_else(|| RenderError::internal("no render job for video template"))?;
        let file_name = template.output_file_name(render_id);
        let output = self.output_dir.join(&file_name);

        if let Err(e) = self.run_job(render_id, job, &output).await {
            remove_quietly(&output).await;
            return Err(e);
        }
        logger.job_finished(0, job, &output);

        Ok(RenderOutput {
            render_id: render_id.clone(),
            template,
            file_name,
            download_name: template.download_name(render_id),
            slide_count: None,
        })
    }

    async fn render_carousel(
        &self,
        render_id: &RenderId,
        jobs: &[RenderJob],
        logger: &RenderLogger,
    ) -> RenderResult<RenderOutput> {
        let mut stills = Vec::with_capacity(jobs.len());

        for (i, job) in jobs.iter().enumerate() {
            let still = self
                .output_dir
                .join(format!("{}-slide-{}-{}.png", render_id, i + 1, job.name));
            stills.push(still.clone());

            if let Err(e) = self.run_job(render_id, job, &still).await {
                remove_all_quietly(&stills).await;
                return Err(e);
            }
            logger.job_finished(i, job, &still);
        }

        let template = Template::Carousel;
        let file_name = template.output_file_name(render_id);
        let archive = self.output_dir.join(&file_name);

        let archived = archive_stills(stills.clone(), archive.clone()).await;
        remove_all_quietly(&stills).await;
        if let Err(e) = archived {
            remove_quietly(&archive).await;
            return Err(e);
        }
        logger.archived(&file_name, stills.len());

        Ok(RenderOutput {
            render_id: render_id.clone(),
            template,
            file_name,
            download_name: template.download_name(render_id),
            slide_count: Some(stills.len()),
        })
    }

    /// Run one job. The parameter file is removed when this returns.
    async fn run_job(&self, render_id: &RenderId, job: &RenderJob, output: &Path) -> RenderResult<()> {
        let props_file = self.write_props(render_id, job).await?;
        let cmd = RenderCommand::new(job.mode, job.composition, output, props_file.path());
        self.renderer.render(&cmd).await
    }

    async fn write_props(&self, render_id: &RenderId, job: &RenderJob) -> RenderResult<NamedTempFile> {
        let file = tempfile::Builder::new()
            .prefix(&format!("{}-props-", render_id))
            .suffix(".json")
            .tempfile_in(&self.output_dir)?;
        tokio::fs::write(file.path(), serde_json::to_vec(&job.props)?).await?;
        Ok(file)
    }
}

async fn remove_quietly(path: &Path) {
    let _ = tokio::fs::remove_file(path).await;
}

async fn remove_all_quietly(paths: &[PathBuf]) {
    for path in paths {
        remove_quietly(path).await;
    }
}
