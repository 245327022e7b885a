//! `vidcoach` CLI - AI feedback on recorded presentations

mod cmd;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use vidcoach::analyze::{ChartFormat, PromptProfile, ReportFormat};

#[derive(Parser)]
#[command(name = "vidcoach")]
#[command(about = "Upload a presentation video to Gemini and get scored coaching feedback")]
#[command(version)]
struct Cli {
    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.config/vidcoach/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a video and write the feedback report and charts
    Analyze {
        /// Video file to analyze
        video: PathBuf,

        /// Which prompt to send
        #[arg(short, long, value_enum, default_value = "feedback")]
        profile: ProfileArg,

        /// Report format
        #[arg(short, long, value_enum, default_value = "text")]
        format: AnalyzeOutputFormat,

        /// Chart image format
        #[arg(long, value_enum, default_value = "png")]
        chart_format: ChartFormatArg,

        /// Skip chart rendering
        #[arg(long)]
        no_charts: bool,

        /// Directory for report and charts (default: next to the video)
        #[arg(short, long, value_name = "DIR")]
        output_dir: Option<PathBuf>,

        /// Gemini model id
        #[arg(short, long)]
        model: Option<String>,

        /// Gemini API key (overrides environment and config file)
        #[arg(long)]
        api_key: Option<String>,

        /// Seconds between processing status checks
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u64>,

        /// Give up waiting for processing after this many seconds
        #[arg(long, value_name = "SECS")]
        max_wait: Option<u64>,
    },

    /// Re-run score extraction on a saved model response (offline)
    Extract {
        /// File containing the raw model response
        response_file: PathBuf,

        /// Render charts into this directory
        #[arg(long, value_name = "DIR")]
        chart_dir: Option<PathBuf>,

        /// Chart image format
        #[arg(long, value_enum, default_value = "png")]
        chart_format: ChartFormatArg,

        /// Print the recovered series as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the prompt sent with the video
    Prompt {
        #[arg(short, long, value_enum, default_value = "feedback")]
        profile: ProfileArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum AnalyzeOutputFormat {
    Text,
    Json,
    Markdown,
}

impl From<AnalyzeOutputFormat> for ReportFormat {
    fn from(format: AnalyzeOutputFormat) -> Self {
        match format {
            AnalyzeOutputFormat::Text => ReportFormat::Text,
            AnalyzeOutputFormat::Json => ReportFormat::Json,
            AnalyzeOutputFormat::Markdown => ReportFormat::Markdown,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ChartFormatArg {
    Png,
    Svg,
}

impl From<ChartFormatArg> for ChartFormat {
    fn from(format: ChartFormatArg) -> Self {
        match format {
            ChartFormatArg::Png => ChartFormat::Png,
            ChartFormatArg::Svg => ChartFormat::Svg,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ProfileArg {
    /// Coaching feedback with per-second scores
    Feedback,
    /// Summary and qualitative feedback only
    Summary,
}

impl From<ProfileArg> for PromptProfile {
    fn from(profile: ProfileArg) -> Self {
        match profile {
            ProfileArg::Feedback => PromptProfile::Feedback,
            ProfileArg::Summary => PromptProfile::Summary,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match cli.command {
        Commands::Analyze {
            video,
            profile,
            format,
            chart_format,
            no_charts,
            output_dir,
            model,
            api_key,
            poll_interval,
            max_wait,
        } => {
            let overrides = vidcoach::config::Overrides {
                api_key,
                model,
                poll_interval_secs: poll_interval,
                max_wait_secs: max_wait,
                output_dir,
            };
            cmd::cmd_analyze(
                &video,
                cli.config.as_deref(),
                overrides,
                profile.into(),
                format.into(),
                chart_format.into(),
                !no_charts,
            )
            .await?;
        }
        Commands::Extract {
            response_file,
            chart_dir,
            chart_format,
            json,
        } => {
            cmd::cmd_extract(&response_file, chart_dir.as_deref(), chart_format.into(), json)?;
        }
        Commands::Prompt { profile } => {
            cmd::cmd_prompt(profile.into());
        }
    }

    Ok(())
}
