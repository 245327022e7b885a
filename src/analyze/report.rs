//! Feedback report generation
//!
//! The text report is the primary artifact: a banner, the source video and
//! the model's answer verbatim. JSON and Markdown variants add the score
//! series and their statistics.

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::extract::{ExtractedSeries, ExtractionLayer};
use super::prompt::PromptProfile;
use super::series::{Series, SeriesStats};
use super::Result;

/// Banner at the top of the text report
pub const REPORT_BANNER: &str = "VIDEO PRESENTATION FEEDBACK";

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Banner + source metadata + raw model text (default)
    #[default]
    Text,
    /// JSON (machine-readable, includes series)
    Json,
    /// Markdown (human-readable, includes statistics)
    Markdown,
}

impl ReportFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// `{stem}_feedback.{ext}`
#[must_use]
pub fn report_file_name(stem: &str, format: ReportFormat) -> String {
    format!("{stem}_feedback.{}", format.extension())
}

/// Everything known after one analysis run
#[derive(Debug, Clone, Serialize)]
pub struct FeedbackReport {
    pub source_name: String,
    pub source_path: PathBuf,
    pub model: String,
    pub profile: PromptProfile,
    pub generated_at: DateTime<Utc>,
    pub response_text: String,
    pub series: ExtractedSeries,
}

impl FeedbackReport {
    /// Report for `video` with generation time set to now
    #[must_use]
    pub fn new(
        video: &Path,
        model: &str,
        profile: PromptProfile,
        response_text: String,
        series: ExtractedSeries,
    ) -> Self {
        Self {
            source_name: video
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            source_path: video.to_path_buf(),
            model: model.to_string(),
            profile,
            generated_at: Utc::now(),
            response_text,
            series,
        }
    }
}

#[derive(Serialize)]
struct SeriesView<'a> {
    #[serde(flatten)]
    series: &'a Series,
    stats: Option<SeriesStats>,
}

#[derive(Serialize)]
struct ReportView<'a> {
    source_name: &'a str,
    source_path: &'a Path,
    model: &'a str,
    profile: PromptProfile,
    generated_at: DateTime<Utc>,
    extraction_layer: Option<ExtractionLayer>,
    confidence: Option<SeriesView<'a>>,
    engagement: Option<SeriesView<'a>>,
    feedback: &'a str,
}

/// Report generator
pub struct AnalysisReport;

impl AnalysisReport {
    /// Generate report in specified format
    pub fn generate(report: &FeedbackReport, format: ReportFormat) -> Result<String> {
        match format {
            ReportFormat::Text => Self::to_text(report),
            ReportFormat::Json => Self::to_json(report),
            ReportFormat::Markdown => Self::to_markdown(report),
        }
    }

    /// Save report to file
    pub fn save(report: &FeedbackReport, format: ReportFormat, path: &Path) -> Result<()> {
        let content = Self::generate(report, format)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn to_text(report: &FeedbackReport) -> Result<String> {
        let mut out = String::new();

        writeln!(out, "{REPORT_BANNER}")?;
        writeln!(out, "{}\n", "=".repeat(80))?;
        writeln!(out, "Source Video: {}", report.source_name)?;
        writeln!(out, "File Path: {}\n", report.source_path.display())?;
        out.push_str(&report.response_text);

        Ok(out)
    }

    fn to_json(report: &FeedbackReport) -> Result<String> {
        let view = ReportView {
            source_name: &report.source_name,
            source_path: &report.source_path,
            model: &report.model,
            profile: report.profile,
            generated_at: report.generated_at,
            extraction_layer: report.series.layer,
            confidence: report.series.confidence.as_ref().map(series_view),
            engagement: report.series.engagement.as_ref().map(series_view),
            feedback: &report.response_text,
        };
        Ok(serde_json::to_string_pretty(&view)?)
    }

    fn to_markdown(report: &FeedbackReport) -> Result<String> {
        let mut md = String::new();

        writeln!(md, "# Presentation Feedback\n")?;

        writeln!(md, "## Source\n")?;
        writeln!(md, "- **Video**: {}", report.source_name)?;
        writeln!(md, "- **Path**: {}", report.source_path.display())?;
        writeln!(md, "- **Model**: {}", report.model)?;
        writeln!(
            md,
            "- **Generated**: {}",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(md)?;

        if report.profile.expects_series() {
            writeln!(md, "## Scores\n")?;
            writeln!(md, "| Series | Points | Mean | Min | Max | Span |")?;
            writeln!(md, "|---|---|---|---|---|---|")?;
            for kind in super::series::SeriesKind::ALL {
                match report.series.get(kind).and_then(Series::stats) {
                    Some(s) => writeln!(
                        md,
                        "| {kind} | {} | {:.0}/100 | {:.0} | {:.0} | {}s-{}s |",
                        s.count, s.mean, s.min, s.max, s.first_timestamp, s.last_timestamp
                    )?,
                    None => writeln!(md, "| {kind} | - | not recovered | - | - | - |")?,
                }
            }
            if let Some(layer) = report.series.layer {
                writeln!(md, "\n_Scores recovered from {layer}._")?;
            }
            writeln!(md)?;
        }

        writeln!(md, "## Feedback\n")?;
        writeln!(md, "{}", report.response_text.trim_end())?;

        Ok(md)
    }
}

fn series_view(series: &Series) -> SeriesView<'_> {
    SeriesView {
        series,
        stats: series.stats(),
    }
}
