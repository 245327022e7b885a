//! `vidcoach` - AI feedback on recorded presentations
//!
//! # Features
//!
//! - **Upload and wait**: resumable upload to the Gemini Files API, bounded polling until `ACTIVE`
//! - **Feedback**: one `generateContent` call with a coaching prompt
//! - **Lenient extraction**: per-second confidence and engagement scores recovered from loosely formatted model text
//! - **Artifacts**: text/JSON/Markdown report plus PNG or SVG score charts
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use vidcoach::{AnalysisPipeline, GeminiClient, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = GeminiClient::new(std::env::var("GEMINI_API_KEY")?)?;
//!     let pipeline = AnalysisPipeline::new(client, PipelineConfig::default());
//!     let outcome = pipeline.analyze(Path::new("talk.mp4")).await?;
//!     println!("Report written to {}", outcome.report_path.display());
//!     Ok(())
//! }
//! ```

pub mod analyze;
pub mod config;
pub mod gemini;

pub use analyze::{
    extract_series, AnalysisError, AnalysisOutcome, AnalysisPipeline, ExtractedSeries,
    PipelineConfig, PromptProfile, ReportFormat, Series, SeriesKind,
};
pub use config::{Config, ConfigError};
pub use gemini::{FileState, GeminiClient, GeminiError, MediaService, RemoteAsset};

/// Version of vidcoach
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
