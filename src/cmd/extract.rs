use std::path::Path;

use anyhow::{Context, Result};

use vidcoach::analyze::{
    extract_series, file_stem, render_charts, ChartFormat, ChartRenderer, SeriesKind,
};

pub fn cmd_extract(
    response_file: &Path,
    chart_dir: Option<&Path>,
    chart_format: ChartFormat,
    json: bool,
) -> Result<()> {
    let text = std::fs::read_to_string(response_file)
        .with_context(|| format!("failed to read {}", response_file.display()))?;

    let extracted = extract_series(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&extracted)?);
    } else {
        match extracted.layer {
            Some(layer) => println!("Recovered via {layer}"),
            None => println!("No score data found"),
        }
        for kind in SeriesKind::ALL {
            match extracted.get(kind).and_then(|s| s.stats()) {
                Some(stats) => println!(
                    "{kind}: {} points, {}s-{}s, avg {:.1}, min {:.0}, max {:.0}",
                    stats.count,
                    stats.first_timestamp,
                    stats.last_timestamp,
                    stats.mean,
                    stats.min,
                    stats.max
                ),
                None => println!("{kind}: missing"),
            }
        }
    }

    if let Some(dir) = chart_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let written = render_charts(
            &ChartRenderer::default(),
            &extracted,
            dir,
            &file_stem(response_file),
            chart_format,
        );
        for path in written {
            eprintln!("🖼  Chart: {}", path.display());
        }
    }

    Ok(())
}
