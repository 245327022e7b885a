//! Video presentation analysis pipeline
//!
//! One run uploads a video, waits for the service to finish processing it,
//! asks the model for coaching feedback and turns the answer into:
//! - a text report (optionally JSON or Markdown)
//! - up to two score charts recovered from the loosely formatted answer

pub mod chart;
pub mod extract;
pub mod poll;
pub mod prompt;
pub mod report;
pub mod series;

#[cfg(test)]
pub(crate) mod testing;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::config::ConfigError;
use crate::gemini::{GeminiError, MediaService};

pub use chart::{render_charts, ChartError, ChartFormat, ChartRenderer};
pub use extract::{extract_series, ExtractedSeries, ExtractionLayer};
pub use poll::{await_ready, PollConfig, PollError, PollOutcome};
pub use prompt::PromptProfile;
pub use report::{report_file_name, AnalysisReport, FeedbackReport, ReportFormat};
pub use series::{Series, SeriesKind, SeriesStats, TimeSeriesPoint};

/// Analysis pipeline errors
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Gemini API error: {0}")]
    Remote(#[from] GeminiError),

    #[error(transparent)]
    Poll(#[from] PollError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Model id used for `generateContent`
    pub model: String,
    pub profile: PromptProfile,
    pub poll: PollConfig,
    /// Where report and charts go; the video's directory when unset
    pub output_dir: Option<PathBuf>,
    pub report_format: ReportFormat,
    pub chart_format: ChartFormat,
    /// Render charts for recovered series
    pub charts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            profile: PromptProfile::default(),
            poll: PollConfig::default(),
            output_dir: None,
            report_format: ReportFormat::default(),
            chart_format: ChartFormat::default(),
            charts: true,
        }
    }
}

/// Artifacts of one successful run
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub report: FeedbackReport,
    pub report_path: PathBuf,
    pub chart_paths: Vec<PathBuf>,
    pub poll: PollOutcome,
}

/// Upload → wait → generate → extract → report → charts
pub struct AnalysisPipeline<S> {
    service: S,
    config: PipelineConfig,
    renderer: ChartRenderer,
}

impl<S: MediaService> AnalysisPipeline<S> {
    pub fn new(service: S, config: PipelineConfig) -> Self {
        Self {
            service,
            config,
            renderer: ChartRenderer::default(),
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: ChartRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run full analysis on a video file
    pub async fn analyze(&self, video: &Path) -> Result<AnalysisOutcome> {
        if !video.is_file() {
            return Err(ConfigError::InputNotFound(video.to_path_buf()).into());
        }
        let size = std::fs::metadata(video)?.len();
        info!(
            path = %video.display(),
            size_mb = format_args!("{:.2}", size as f64 / (1024.0 * 1024.0)),
            "Uploading video"
        );

        let uploaded = self.service.upload(video).await?;
        info!(name = %uploaded.name, state = %uploaded.state, "Upload complete");

        let poll = await_ready(&self.service, uploaded, &self.config.poll).await?;

        info!(model = %self.config.model, profile = self.config.profile.as_str(), "Generating feedback");
        let text = self
            .service
            .generate(
                &self.config.model,
                &poll.asset,
                self.config.profile.template(),
            )
            .await?;

        let series = if self.config.profile.expects_series() {
            let extracted = extract_series(&text);
            for kind in extracted.missing() {
                warn!(%kind, "Could not find {} data in response", kind.value_key());
            }
            for series in extracted.iter() {
                if let Some(stats) = series.stats() {
                    info!(
                        kind = %series.kind,
                        points = stats.count,
                        mean = format_args!("{:.1}", stats.mean),
                        "Series recovered"
                    );
                }
            }
            extracted
        } else {
            ExtractedSeries::default()
        };

        let report = FeedbackReport::new(
            video,
            &self.config.model,
            self.config.profile,
            text,
            series,
        );

        let out_dir = self.output_dir(video);
        std::fs::create_dir_all(&out_dir)?;
        let stem = file_stem(video);

        let report_path = out_dir.join(report_file_name(&stem, self.config.report_format));
        AnalysisReport::save(&report, self.config.report_format, &report_path)?;
        info!(path = %report_path.display(), "Report saved");

        let chart_paths = if self.config.charts {
            render_charts(
                &self.renderer,
                &report.series,
                &out_dir,
                &stem,
                self.config.chart_format,
            )
        } else {
            if !report.series.is_empty() {
                warn!("Chart rendering disabled, skipping graphs");
            }
            Vec::new()
        };

        Ok(AnalysisOutcome {
            report,
            report_path,
            chart_paths,
            poll,
        })
    }

    fn output_dir(&self, video: &Path) -> PathBuf {
        match &self.config.output_dir {
            Some(dir) => dir.clone(),
            None => video
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), Path::to_path_buf),
        }
    }
}

/// File name without extension, `video` when there is none
#[must_use]
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map_or_else(|| "video".to_string(), |s| s.to_string_lossy().into_owned())
}
