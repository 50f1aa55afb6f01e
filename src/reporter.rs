use log::{info, warn};
use std::path::PathBuf;

use crate::config::{Config, ReportSettings};
use crate::error::{ReportError, Result};
use crate::output::{render_report, PhaseProgress, ReportContent, ReportHeader};
use crate::parser::parse_with_framing;
use crate::providers::{GitLabClient, PipelineStatus};

/// How a report run ended when nothing went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    /// The PDF was written.
    Generated { path: PathBuf, rows: usize },
    /// The latest pipeline did not succeed, so no report was attempted.
    PipelineNotReady(PipelineStatus),
}

/// Fetches the latest deployment log from GitLab and turns it into a PDF.
pub struct DeploymentReporter {
    client: GitLabClient,
    settings: ReportSettings,
    show_progress: bool,
}

impl DeploymentReporter {
    pub fn new(config: Config) -> Result<Self> {
        let client = GitLabClient::new(
            &config.gitlab.base_url,
            &config.gitlab.project_id,
            config.gitlab.token,
        )?;

        Ok(Self {
            client,
            settings: config.report,
            show_progress: true,
        })
    }

    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Runs pipeline → jobs → log → parse → render, one step at a time.
    ///
    /// A pipeline that has not succeeded ends the run early with
    /// [`ReportOutcome::PipelineNotReady`] and no further requests.
    ///
    /// # Errors
    ///
    /// Network, API and response-decoding errors are returned as they are.
    /// Parsing, an empty table and rendering failures are wrapped in
    /// [`ReportError::Generation`].
    pub async fn run(&self) -> Result<ReportOutcome> {
        let progress = PhaseProgress::start(self.show_progress);

        let pipeline = match self.client.latest_pipeline().await {
            Ok(pipeline) => pipeline,
            Err(e) => {
                progress.abandon("request failed");
                return Err(e);
            }
        };
        info!(
            "Latest pipeline {} on {} (success: {})",
            pipeline.pipeline_id, pipeline.source_ref, pipeline.is_success
        );

        if !pipeline.is_success {
            warn!("Pipeline {} did not succeed, skipping report", pipeline.pipeline_id);
            progress.abandon("pipeline did not succeed");
            return Ok(ReportOutcome::PipelineNotReady(pipeline));
        }

        let progress = progress.advance();
        let job_id = match self.client.latest_job_id(pipeline.pipeline_id).await {
            Ok(job_id) => job_id,
            Err(e) => {
                progress.abandon("request failed");
                return Err(e);
            }
        };
        info!("Reading log of job {job_id}");

        let progress = progress.advance();
        let log = match self.client.job_log(job_id).await {
            Ok(log) => log,
            Err(e) => {
                progress.abandon("request failed");
                return Err(e);
            }
        };

        let progress = progress.advance();
        match self.generate(&pipeline.source_ref, &log) {
            Ok(outcome) => {
                progress.finish();
                Ok(outcome)
            }
            Err(e) => {
                progress.abandon("report not generated");
                Err(e)
            }
        }
    }

    fn generate(&self, source: &str, log: &str) -> Result<ReportOutcome> {
        let (path, rows) = generate_report(&self.settings, source, log)
            .map_err(|e| ReportError::Generation(Box::new(e)))?;
        Ok(ReportOutcome::Generated { path, rows })
    }
}

/// Parses `log`, refuses a table without data rows, then renders and writes
/// the PDF. Returns the written path and the number of data rows.
pub fn generate_report(
    settings: &ReportSettings,
    source: &str,
    log: &str,
) -> Result<(PathBuf, usize)> {
    let table = parse_with_framing(log, settings.framing)?;
    if table.is_insufficient() {
        return Err(ReportError::InsufficientData);
    }

    write_report(settings, source, ReportContent::Table(&table))?;
    Ok((settings.output.clone(), table.data_rows().len()))
}

/// Renders `content` with the configured header and assets and writes it to
/// the configured output path, replacing any earlier report.
pub fn write_report(
    settings: &ReportSettings,
    source: &str,
    content: ReportContent<'_>,
) -> Result<()> {
    let timestamp = settings.timestamp();
    let header = ReportHeader {
        source,
        target: &settings.target,
        timestamp: Some(&timestamp),
    };

    let bytes = render_report(&header, content, &settings.assets)?;
    std::fs::write(&settings.output, bytes)?;
    info!("Report written to: {}", settings.output.display());

    Ok(())
}
