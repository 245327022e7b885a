use std::path::Path;

use anyhow::Result;

use vidcoach::analyze::{
    AnalysisError, AnalysisPipeline, ChartFormat, PipelineConfig, PromptProfile, ReportFormat,
};
use vidcoach::config::{Config, Overrides};
use vidcoach::{ConfigError, GeminiClient};

pub async fn cmd_analyze(
    video: &Path,
    config_path: Option<&Path>,
    overrides: Overrides,
    profile: PromptProfile,
    format: ReportFormat,
    chart_format: ChartFormat,
    charts: bool,
) -> Result<()> {
    let config = Config::load(config_path, overrides)?;
    let api_key = config.require_api_key()?;
    if !video.is_file() {
        return Err(ConfigError::InputNotFound(video.to_path_buf()).into());
    }

    eprintln!("🎬 Analyzing: {}", video.display());
    eprintln!("   Model: {}", config.model);
    eprintln!("   Profile: {}", profile.as_str());
    eprintln!(
        "   Max wait: {}s (checking every {}s)",
        config.poll.max_wait.as_secs(),
        config.poll.interval.as_secs()
    );

    let client = GeminiClient::with_base_url(api_key, &config.base_url)?;
    let pipeline = AnalysisPipeline::new(
        client,
        PipelineConfig {
            model: config.model.clone(),
            profile,
            poll: config.poll,
            output_dir: config.output_dir.clone(),
            report_format: format,
            chart_format,
            charts,
        },
    );

    let start = std::time::Instant::now();
    let outcome = match pipeline.analyze(video).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("\n❌ Error processing video: {e}");
            print_hints(&e);
            return Err(e.into());
        }
    };

    eprintln!(
        "\n✅ Analysis complete in {:.1}s (processing wait {}s)",
        start.elapsed().as_secs_f64(),
        outcome.poll.elapsed.as_secs()
    );

    if format == ReportFormat::Text {
        println!("{}", "=".repeat(80));
        println!("{}", outcome.report.response_text);
        println!("{}", "=".repeat(80));
    }

    eprintln!("📄 Report: {}", outcome.report_path.display());
    for series in outcome.report.series.iter() {
        if let Some(stats) = series.stats() {
            eprintln!(
                "📊 {}: avg {:.1}/100 over {} points",
                series.kind.title(),
                stats.mean,
                stats.count
            );
        }
    }
    for path in &outcome.chart_paths {
        eprintln!("🖼  Chart: {}", path.display());
    }

    Ok(())
}

fn print_hints(error: &AnalysisError) {
    eprintln!("\nTroubleshooting tips:");
    match error {
        AnalysisError::Poll(_) => {
            eprintln!("  - Long videos can take several minutes to process; try --max-wait");
            eprintln!("  - Check that the video plays locally and is not corrupted");
        }
        AnalysisError::Io(_) => {
            eprintln!("  - Check that the output directory is writable");
        }
        _ => {
            eprintln!("  - Check that your API key is valid");
            eprintln!("  - Make sure you have API quota remaining");
            eprintln!("  - Verify the video format is supported (MP4, MOV, AVI, WEBM, ...)");
            eprintln!("  - Check that the video file is not corrupted");
            eprintln!("  - Check your internet connection");
        }
    }
}
