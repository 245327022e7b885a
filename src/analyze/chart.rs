//! Score-over-time line charts
//!
//! Each series becomes one chart: y fixed to 0-100, x padded one second on
//! both sides, dashed reference lines at 50 ("Baseline") and 75 ("Good"),
//! and a translucent fill under the curve. PNG output is rasterized with
//! tiny-skia and carries no text; SVG output adds titles and tick labels.

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Stroke, StrokeDash, Transform,
};
use tracing::{info, warn};

use super::extract::ExtractedSeries;
use super::series::{Series, SeriesKind, SCORE_MAX, SCORE_MIN};

/// Reference lines drawn on every chart: (score, label, rgb, alpha)
const REFERENCE_LINES: [(f64, &str, (u8, u8, u8), f32); 2] = [
    (50.0, "Baseline", (0x80, 0x80, 0x80), 0.5),
    (75.0, "Good", (0x00, 0x80, 0x00), 0.3),
];

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Cannot chart an empty series")]
    EmptySeries,

    #[error("Invalid canvas size {0}x{1}")]
    Canvas(u32, u32),

    #[error("PNG encoding failed: {0}")]
    Encode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, ChartError>;

/// Upper bound on generated x ticks
const MAX_X_TICKS: f64 = 20.0;

/// Chart image format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartFormat {
    /// Raster, no text
    #[default]
    Png,
    /// Vector with labels
    Svg,
}

impl ChartFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

/// `{stem}_{kind}_graph.{ext}`
#[must_use]
pub fn chart_file_name(stem: &str, kind: SeriesKind, format: ChartFormat) -> String {
    format!("{stem}_{kind}_graph.{}", format.extension())
}

/// Data-space bounds and points of one chart.
///
/// Computed only from the series, so identical input always yields the
/// same extremes and axis bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartGeometry {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub points: Vec<(f64, f64)>,
}

impl ChartGeometry {
    #[must_use]
    pub fn from_series(series: &Series) -> Option<Self> {
        let first = series.points.first()?;
        let last = series.points.last()?;

        Some(Self {
            x_min: first.timestamp as f64 - 1.0,
            x_max: last.timestamp as f64 + 1.0,
            y_min: SCORE_MIN,
            y_max: SCORE_MAX,
            points: series
                .points
                .iter()
                .map(|p| (p.timestamp as f64, p.value))
                .collect(),
        })
    }

    /// Roughly ten evenly spaced x ticks on a 1/2/5 step.
    ///
    /// Empty when the span is not a positive finite number.
    #[must_use]
    pub fn x_ticks(&self) -> Vec<f64> {
        let span = self.x_max - self.x_min;
        if !span.is_finite() || span <= 0.0 {
            return Vec::new();
        }
        let raw = span / 10.0;
        let magnitude = 10f64.powf(raw.log10().floor());
        let step = match raw / magnitude {
            n if n <= 1.0 => magnitude,
            n if n <= 2.0 => 2.0 * magnitude,
            n if n <= 5.0 => 5.0 * magnitude,
            _ => 10.0 * magnitude,
        }
        .max(1.0);

        let start = (self.x_min / step).ceil() * step;
        let count = ((self.x_max - start) / step).floor();
        if !count.is_finite() || count < 0.0 {
            return Vec::new();
        }

        (0..=count.min(MAX_X_TICKS) as usize)
            .map(|i| start + i as f64 * step)
            // ceil() of a small negative gives -0.0
            .map(|tick| if tick == 0.0 { 0.0 } else { tick })
            .collect()
    }
}

/// Pixel rectangle the data is drawn into
#[derive(Debug, Clone, Copy)]
struct PlotArea {
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl PlotArea {
    fn x(&self, g: &ChartGeometry, x: f64) -> f32 {
        self.left + ((x - g.x_min) / (g.x_max - g.x_min)) as f32 * self.width
    }

    fn y(&self, g: &ChartGeometry, y: f64) -> f32 {
        self.top + (1.0 - ((y - g.y_min) / (g.y_max - g.y_min)) as f32) * self.height
    }

    fn right(&self) -> f32 {
        self.left + self.width
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Renders one series per image
#[derive(Debug, Clone, Copy)]
pub struct ChartRenderer {
    width: u32,
    height: u32,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new(1200, 600)
    }
}

impl ChartRenderer {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Render `series` and write it to `path`
    pub fn render(&self, series: &Series, format: ChartFormat, path: &Path) -> Result<()> {
        match format {
            ChartFormat::Png => std::fs::write(path, self.render_png(series)?)?,
            ChartFormat::Svg => std::fs::write(path, self.render_svg(series)?)?,
        }
        Ok(())
    }

    fn plot_area(&self) -> PlotArea {
        // Extra right margin leaves room for the reference line labels
        let (left, right, top, bottom) = (80.0, 90.0, 60.0, 70.0);
        PlotArea {
            left,
            top,
            width: (self.width as f32 - left - right).max(1.0),
            height: (self.height as f32 - top - bottom).max(1.0),
        }
    }

    /// Encoded PNG bytes
    pub fn render_png(&self, series: &Series) -> Result<Vec<u8>> {
        self.rasterize(series)?
            .encode_png()
            .map_err(|e| ChartError::Encode(e.to_string()))
    }

    fn rasterize(&self, series: &Series) -> Result<Pixmap> {
        let geometry = ChartGeometry::from_series(series).ok_or(ChartError::EmptySeries)?;
        let area = self.plot_area();
        let mut pixmap =
            Pixmap::new(self.width, self.height).ok_or(ChartError::Canvas(self.width, self.height))?;
        pixmap.fill(Color::WHITE);

        let identity = Transform::identity();
        let (r, g, b) = series.kind.rgb();

        // Grid
        let grid_paint = paint((0x80, 0x80, 0x80), 0.3);
        let grid_stroke = dashed(1.0);
        for score in (0..=100).step_by(20) {
            let y = area.y(&geometry, f64::from(score));
            if let Some(path) = line_path(area.left, y, area.right(), y) {
                pixmap.stroke_path(&path, &grid_paint, &grid_stroke, identity, None);
            }
        }
        for tick in geometry.x_ticks() {
            let x = area.x(&geometry, tick);
            if let Some(path) = line_path(x, area.top, x, area.bottom()) {
                pixmap.stroke_path(&path, &grid_paint, &grid_stroke, identity, None);
            }
        }

        // Reference lines
        for (score, _, rgb, alpha) in REFERENCE_LINES {
            let y = area.y(&geometry, score);
            if let Some(path) = line_path(area.left, y, area.right(), y) {
                pixmap.stroke_path(&path, &paint(rgb, alpha), &dashed(1.5), identity, None);
            }
        }

        // Area under the curve
        let baseline = area.y(&geometry, geometry.y_min);
        let mut fill = PathBuilder::new();
        let (first_x, _) = geometry.points[0];
        fill.move_to(area.x(&geometry, first_x), baseline);
        for &(x, y) in &geometry.points {
            fill.line_to(area.x(&geometry, x), area.y(&geometry, y));
        }
        if let Some(&(last_x, _)) = geometry.points.last() {
            fill.line_to(area.x(&geometry, last_x), baseline);
        }
        fill.close();
        if let Some(path) = fill.finish() {
            pixmap.fill_path(&path, &paint((r, g, b), 0.3), FillRule::Winding, identity, None);
        }

        // Curve
        let line_paint = paint((r, g, b), 0.7);
        let mut line = PathBuilder::new();
        for (i, &(x, y)) in geometry.points.iter().enumerate() {
            let (px, py) = (area.x(&geometry, x), area.y(&geometry, y));
            if i == 0 {
                line.move_to(px, py);
            } else {
                line.line_to(px, py);
            }
        }
        if let Some(path) = line.finish() {
            let stroke = Stroke {
                width: 2.0,
                ..Stroke::default()
            };
            pixmap.stroke_path(&path, &line_paint, &stroke, identity, None);
        }

        // Markers
        for &(x, y) in &geometry.points {
            if let Some(dot) =
                PathBuilder::from_circle(area.x(&geometry, x), area.y(&geometry, y), 4.0)
            {
                pixmap.fill_path(&dot, &line_paint, FillRule::Winding, identity, None);
            }
        }

        // Frame
        if let Some(frame) = Rect::from_xywh(area.left, area.top, area.width, area.height)
            .map(PathBuilder::from_rect)
        {
            let stroke = Stroke {
                width: 1.0,
                ..Stroke::default()
            };
            pixmap.stroke_path(&frame, &paint((0x33, 0x33, 0x33), 1.0), &stroke, identity, None);
        }

        Ok(pixmap)
    }

    /// SVG document with titles and tick labels
    pub fn render_svg(&self, series: &Series) -> Result<String> {
        let geometry = ChartGeometry::from_series(series).ok_or(ChartError::EmptySeries)?;
        let area = self.plot_area();
        let color = hex(series.kind.rgb());
        let mut svg = String::new();

        writeln!(
            svg,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" font-family="sans-serif">"#,
            w = self.width,
            h = self.height
        )?;
        writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#)?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="30" text-anchor="middle" font-size="18" font-weight="bold">{}</text>"#,
            self.width as f32 / 2.0,
            series.kind.title()
        )?;

        // Grid and y labels
        for score in (0..=100).step_by(20) {
            let y = area.y(&geometry, f64::from(score));
            writeln!(
                svg,
                r##"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#808080" stroke-opacity="0.3" stroke-dasharray="6 4"/>"##,
                area.left,
                area.right()
            )?;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" text-anchor="end" font-size="11">{score}</text>"#,
                area.left - 8.0,
                y + 4.0
            )?;
        }
        for tick in geometry.x_ticks() {
            let x = area.x(&geometry, tick);
            writeln!(
                svg,
                r##"<line x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="#808080" stroke-opacity="0.3" stroke-dasharray="6 4"/>"##,
                area.top,
                area.bottom()
            )?;
            writeln!(
                svg,
                r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="11">{tick}</text>"#,
                area.bottom() + 18.0
            )?;
        }

        // Reference lines
        for (score, label, rgb, alpha) in REFERENCE_LINES {
            let y = area.y(&geometry, score);
            let stroke = hex(rgb);
            writeln!(
                svg,
                r#"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="{stroke}" stroke-opacity="{alpha}" stroke-dasharray="6 4"/>"#,
                area.left,
                area.right()
            )?;
            writeln!(
                svg,
                r#"<text x="{:.1}" y="{:.1}" font-size="11" fill="{stroke}" opacity="0.7">{label}</text>"#,
                area.right() + 8.0,
                y + 4.0
            )?;
        }

        // Fill, curve, markers
        let baseline = area.y(&geometry, geometry.y_min);
        let coords: Vec<String> = geometry
            .points
            .iter()
            .map(|&(x, y)| format!("{:.1},{:.1}", area.x(&geometry, x), area.y(&geometry, y)))
            .collect();
        let (first_x, _) = geometry.points[0];
        let (last_x, _) = geometry.points[geometry.points.len() - 1];
        writeln!(
            svg,
            r#"<polygon points="{:.1},{baseline:.1} {} {:.1},{baseline:.1}" fill="{color}" fill-opacity="0.3"/>"#,
            area.x(&geometry, first_x),
            coords.join(" "),
            area.x(&geometry, last_x)
        )?;
        writeln!(
            svg,
            r#"<polyline points="{}" fill="none" stroke="{color}" stroke-opacity="0.7" stroke-width="2"/>"#,
            coords.join(" ")
        )?;
        for &(x, y) in &geometry.points {
            writeln!(
                svg,
                r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{color}" fill-opacity="0.7"/>"#,
                area.x(&geometry, x),
                area.y(&geometry, y)
            )?;
        }

        // Frame and axis titles
        writeln!(
            svg,
            r##"<rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="none" stroke="#333333"/>"##,
            area.left, area.top, area.width, area.height
        )?;
        writeln!(
            svg,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="13" font-weight="bold">Time (seconds)</text>"#,
            area.left + area.width / 2.0,
            self.height as f32 - 20.0
        )?;
        let label_y = area.top + area.height / 2.0;
        writeln!(
            svg,
            r#"<text x="24" y="{label_y:.1}" text-anchor="middle" font-size="13" font-weight="bold" transform="rotate(-90 24 {label_y:.1})">{}</text>"#,
            series.kind.axis_label()
        )?;
        writeln!(svg, "</svg>")?;

        Ok(svg)
    }
}

/// Render every present series into `dir`.
///
/// Failures are logged and skipped; returns the files written.
pub fn render_charts(
    renderer: &ChartRenderer,
    extracted: &ExtractedSeries,
    dir: &Path,
    stem: &str,
    format: ChartFormat,
) -> Vec<PathBuf> {
    let mut written = Vec::new();

    for series in extracted.iter() {
        let path = dir.join(chart_file_name(stem, series.kind, format));
        match renderer.render(series, format, &path) {
            Ok(()) => {
                info!(
                    kind = %series.kind,
                    points = series.len(),
                    path = %path.display(),
                    "Chart written"
                );
                written.push(path);
            }
            Err(e) => warn!(kind = %series.kind, error = %e, "Could not write chart"),
        }
    }

    written
}

fn paint((r, g, b): (u8, u8, u8), alpha: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8);
    paint.anti_alias = true;
    paint
}

fn dashed(width: f32) -> Stroke {
    Stroke {
        width,
        dash: StrokeDash::new(vec![6.0, 4.0], 0.0),
        ..Stroke::default()
    }
}

fn line_path(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(x1, y1);
    pb.line_to(x2, y2);
    pb.finish()
}

fn hex((r, g, b): (u8, u8, u8)) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::series::{TimeSeriesPoint, MAX_TIMESTAMP};

    fn sample(kind: SeriesKind) -> Series {
        Series::new(
            kind,
            (0..30)
                .map(|t| TimeSeriesPoint {
                    timestamp: t,
                    value: 40.0 + (t % 7) as f64 * 5.0,
                })
                .collect(),
        )
    }

    #[test]
    fn test_geometry_bounds() {
        let series = Series::new(
            SeriesKind::Confidence,
            vec![
                TimeSeriesPoint { timestamp: 3, value: 10.0 },
                TimeSeriesPoint { timestamp: 9, value: 90.0 },
            ],
        );
        let geometry = ChartGeometry::from_series(&series).unwrap();

        assert_eq!(geometry.x_min, 2.0);
        assert_eq!(geometry.x_max, 10.0);
        assert_eq!(geometry.y_min, 0.0);
        assert_eq!(geometry.y_max, 100.0);
        assert_eq!(geometry.points, vec![(3.0, 10.0), (9.0, 90.0)]);
    }

    #[test]
    fn test_geometry_is_deterministic() {
        let a = ChartGeometry::from_series(&sample(SeriesKind::Engagement)).unwrap();
        let b = ChartGeometry::from_series(&sample(SeriesKind::Engagement)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_series_rejected() {
        let empty = Series::new(SeriesKind::Confidence, vec![]);
        assert!(ChartGeometry::from_series(&empty).is_none());
        assert!(matches!(
            ChartRenderer::default().render_png(&empty),
            Err(ChartError::EmptySeries)
        ));
    }

    #[test]
    fn test_x_ticks() {
        let geometry = ChartGeometry::from_series(&sample(SeriesKind::Confidence)).unwrap();
        let ticks = geometry.x_ticks();

        // span 31 -> step 5 -> 0, 5, ..., 30
        assert_eq!(ticks, vec![0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0]);
    }

    #[test]
    fn test_x_ticks_terminate_for_huge_timestamps() {
        // 1e17 - 1 and 1e17 + 1 round to the same f64
        let series = Series::new(
            SeriesKind::Confidence,
            vec![TimeSeriesPoint { timestamp: 100_000_000_000_000_000, value: 50.0 }],
        );
        let geometry = ChartGeometry::from_series(&series).unwrap();
        assert!(geometry.x_ticks().len() <= 21);

        let wide = ChartGeometry {
            x_min: 0.0,
            x_max: f64::MAX,
            ..geometry.clone()
        };
        assert!(wide.x_ticks().len() <= 21);

        let degenerate = ChartGeometry {
            x_min: 5.0,
            x_max: 5.0,
            ..geometry
        };
        assert!(degenerate.x_ticks().is_empty());
    }

    #[test]
    fn test_largest_timestamp_renders() {
        let series = Series::new(
            SeriesKind::Engagement,
            vec![TimeSeriesPoint { timestamp: MAX_TIMESTAMP, value: 80.0 }],
        );
        let ticks = ChartGeometry::from_series(&series).unwrap().x_ticks();
        assert!(!ticks.is_empty() && ticks.len() <= 21);
        assert!(ChartRenderer::default().render_svg(&series).is_ok());
    }

    #[test]
    fn test_png_render() {
        let renderer = ChartRenderer::new(400, 200);
        let pixmap = renderer.rasterize(&sample(SeriesKind::Confidence)).unwrap();

        // Corner is outside the plot area and stays white
        let corner = pixmap.pixel(1, 1).unwrap();
        assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 255, 255));

        let png = renderer.render_png(&sample(SeriesKind::Confidence)).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }

    #[test]
    fn test_single_point_renders() {
        let series = Series::new(
            SeriesKind::Engagement,
            vec![TimeSeriesPoint { timestamp: 0, value: 50.0 }],
        );
        assert!(ChartRenderer::default().render_png(&series).is_ok());
        assert!(ChartRenderer::default().render_svg(&series).is_ok());
    }

    #[test]
    fn test_svg_render() {
        let svg = ChartRenderer::default()
            .render_svg(&sample(SeriesKind::Engagement))
            .unwrap();

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Presentation Engagement Over Time"));
        assert!(svg.contains("Baseline"));
        assert!(svg.contains(">Good<"));
        assert!(svg.contains("#10b981"));
        assert_eq!(svg.matches("<circle").count(), 30);
    }

    #[test]
    fn test_render_charts_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let extracted = ExtractedSeries {
            confidence: Some(sample(SeriesKind::Confidence)),
            engagement: None,
            layer: None,
        };

        let written = render_charts(
            &ChartRenderer::default(),
            &extracted,
            dir.path(),
            "talk",
            ChartFormat::Png,
        );

        assert_eq!(written, vec![dir.path().join("talk_confidence_graph.png")]);
        assert!(written[0].exists());
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            chart_file_name("talk", SeriesKind::Engagement, ChartFormat::Svg),
            "talk_engagement_graph.svg"
        );
    }
}
