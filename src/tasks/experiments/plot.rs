use crate::{
    error::{AnalysisError, Result},
    tasks::experiments::color::{FONT_SIZE, STROKE_WIDTH, get_series_color},
};
use clap::ValueEnum;
use log::{error, info};
use plotters::{coord::Shift, element::ErrorBar, prelude::*};
use std::{fmt, fs, ops::Range, path::Path};

/// Bars of all series at one x value share this fraction of the slot
/// between neighbouring x values.
const BAR_GROUP_FILL: f64 = 0.8;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ImageFormat {
    #[default]
    Png,
    Svg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Svg => "svg",
        }
    }

    /// Pick the backend from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("png") => Ok(ImageFormat::Png),
            Some("svg") => Ok(ImageFormat::Svg),
            _ => Err(AnalysisError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    /// Symmetric error drawn as `y - err ..= y + err`.
    pub err: Option<f64>,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, err: None }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    fn lowest(&self) -> f64 {
        self.y - self.err.filter(|e| e.is_finite()).unwrap_or(0.0)
    }

    fn highest(&self) -> f64 {
        self.y + self.err.filter(|e| e.is_finite()).unwrap_or(0.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<Point>,
}

impl Series {
    pub fn new(label: impl Into<String>, points: Vec<Point>) -> Self {
        Self {
            label: label.into(),
            points,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ChartSpec {
    pub title: String,
    pub x_desc: String,
    pub y_desc: String,
    pub kind: ChartKind,
    pub markers: bool,
    pub legend: bool,
    /// Fixed y-axis limits. Derived from the data when unset.
    pub y_range: Option<(f64, f64)>,
    pub size: (u32, u32),
}

impl ChartSpec {
    pub fn new(title: &str, x_desc: &str, y_desc: &str) -> Self {
        Self {
            title: title.to_string(),
            x_desc: x_desc.to_string(),
            y_desc: y_desc.to_string(),
            kind: ChartKind::Line,
            markers: false,
            legend: true,
            y_range: None,
            size: (640, 480),
        }
    }

    pub fn kind(mut self, kind: ChartKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn markers(mut self, markers: bool) -> Self {
        self.markers = markers;
        self
    }

    pub fn legend(mut self, legend: bool) -> Self {
        self.legend = legend;
        self
    }

    pub fn y_range(mut self, lo: f64, hi: f64) -> Self {
        self.y_range = Some((lo, hi));
        self
    }
}

fn finite_points(series: &[Series]) -> impl Iterator<Item = &Point> {
    series
        .iter()
        .flat_map(|s| s.points.iter())
        .filter(|p| p.is_finite())
}

/// Smallest distance between two distinct x values, or 1 with fewer than two.
fn x_slot(series: &[Series]) -> f64 {
    let mut xs: Vec<f64> = finite_points(series).map(|p| p.x).collect();
    xs.sort_by(f64::total_cmp);
    xs.dedup();

    xs.windows(2)
        .map(|w| w[1] - w[0])
        .fold(None, |acc: Option<f64>, gap| Some(acc.map_or(gap, |a| a.min(gap))))
        .unwrap_or(1.0)
}

/// Horizontal extent of the bar for series `idx` (out of `num_series`) at `x`.
fn bar_span(x: f64, idx: usize, num_series: usize, slot: f64) -> (f64, f64) {
    let group_width = slot * BAR_GROUP_FILL;
    let bar_width = group_width / num_series.max(1) as f64;
    let x0 = x - group_width / 2.0 + idx as f64 * bar_width;
    (x0, x0 + bar_width)
}

fn x_range(kind: ChartKind, series: &[Series]) -> Range<f64> {
    let (lo, hi) = finite_points(series).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.x), hi.max(p.x))
    });
    if lo > hi {
        return 0.0..1.0;
    }

    let pad = match kind {
        ChartKind::Bar => x_slot(series) / 2.0,
        ChartKind::Line if hi > lo => (hi - lo) * 0.05,
        ChartKind::Line => 1.0,
    };
    (lo - pad)..(hi + pad)
}

fn y_range(spec: &ChartSpec, series: &[Series]) -> Range<f64> {
    if let Some((lo, hi)) = spec.y_range {
        return lo..hi;
    }

    let (lo, hi) = finite_points(series).fold((0.0_f64, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.lowest()), hi.max(p.highest()))
    });
    let top = if hi > 0.0 { hi * 1.1 } else { 0.0 };
    if top <= lo { lo..(lo + 1.0) } else { lo..top }
}

fn reason<E: fmt::Debug>(e: E) -> String {
    format!("{e:?}")
}

fn draw<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    spec: &ChartSpec,
    series: &[Series],
) -> std::result::Result<(), String> {
    root.fill(&WHITE).map_err(reason)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", FONT_SIZE).into_font())
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range(spec.kind, series), y_range(spec, series))
        .map_err(reason)?;

    chart
        .configure_mesh()
        .light_line_style(WHITE)
        .x_desc(spec.x_desc.as_str())
        .y_desc(spec.y_desc.as_str())
        .axis_desc_style(("sans-serif", FONT_SIZE - 6).into_font())
        .label_style(("sans-serif", FONT_SIZE - 8).into_font())
        .draw()
        .map_err(reason)?;

    let slot = x_slot(series);
    for (idx, s) in series.iter().enumerate() {
        let color = get_series_color(idx).map_err(reason)?;
        let points: Vec<&Point> = s.points.iter().filter(|p| p.is_finite()).collect();

        // Centre of each point's mark, where its error bar goes.
        let centre = |p: &Point| match spec.kind {
            ChartKind::Line => p.x,
            ChartKind::Bar => {
                let (x0, x1) = bar_span(p.x, idx, series.len(), slot);
                (x0 + x1) / 2.0
            }
        };

        match spec.kind {
            ChartKind::Line => {
                let anno = chart
                    .draw_series(LineSeries::new(
                        points.iter().map(|p| (p.x, p.y)),
                        color.stroke_width(STROKE_WIDTH),
                    ))
                    .map_err(reason)?;
                if spec.legend {
                    anno.label(s.label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(STROKE_WIDTH))
                    });
                }

                if spec.markers {
                    chart
                        .draw_series(
                            points
                                .iter()
                                .map(|p| Circle::new((p.x, p.y), 5, color.filled())),
                        )
                        .map_err(reason)?;
                }
            }
            ChartKind::Bar => {
                let anno = chart
                    .draw_series(points.iter().map(|p| {
                        let (x0, x1) = bar_span(p.x, idx, series.len(), slot);
                        Rectangle::new([(x0, 0.0), (x1, p.y)], color.filled())
                    }))
                    .map_err(reason)?;
                if spec.legend {
                    anno.label(s.label.as_str()).legend(move |(x, y)| {
                        Rectangle::new([(x, y - 6), (x + 20, y + 6)], color.filled())
                    });
                }
            }
        }

        chart
            .draw_series(points.iter().filter_map(|p| {
                let err = p.err.filter(|e| e.is_finite())?;
                Some(ErrorBar::new_vertical(
                    centre(p),
                    p.y - err,
                    p.y,
                    p.y + err,
                    BLACK.stroke_width(2),
                    10,
                ))
            }))
            .map_err(reason)?;
    }

    if spec.legend {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .label_font(("sans-serif", FONT_SIZE - 8).into_font())
            .draw()
            .map_err(reason)?;
    }

    root.present().map_err(reason)?;
    Ok(())
}

/// Render `series` to `path`. The image format follows the file extension.
pub fn render(spec: &ChartSpec, series: &[Series], path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).inspect_err(|e| error!("{e}"))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| {
            error!("error creating plot directory (path={}, error={e:?})", parent.display());
            AnalysisError::Io {
                path: parent.to_path_buf(),
                source: e,
            }
        })?;
    }

    let result = match format {
        ImageFormat::Png => draw(
            BitMapBackend::new(path, spec.size).into_drawing_area(),
            spec,
            series,
        ),
        ImageFormat::Svg => draw(
            SVGBackend::new(path, spec.size).into_drawing_area(),
            spec,
            series,
        ),
    };
    result.map_err(|reason| {
        error!("error drawing chart (path={}, error={reason})", path.display());
        AnalysisError::Render {
            path: path.to_path_buf(),
            reason,
        }
    })?;

    info!("render(): generated plot at: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn series(points: &[(f64, f64, Option<f64>)]) -> Series {
        Series::new(
            "test",
            points
                .iter()
                .map(|&(x, y, err)| Point { x, y, err })
                .collect(),
        )
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ImageFormat::from_path(&PathBuf::from("out/plot.png")).unwrap(),
            ImageFormat::Png
        );
        assert_eq!(
            ImageFormat::from_path(&PathBuf::from("plot.SVG")).unwrap(),
            ImageFormat::Svg
        );
        assert!(matches!(
            ImageFormat::from_path(&PathBuf::from("plot.pdf")),
            Err(AnalysisError::UnsupportedFormat(_))
        ));
        assert!(ImageFormat::from_path(&PathBuf::from("plot")).is_err());
    }

    #[test]
    fn test_render_rejects_unknown_format_before_drawing() {
        let path = std::env::temp_dir().join("netfra-plot-test.jpeg");
        let spec = ChartSpec::new("t", "x", "y");
        let err = render(&spec, &[series(&[(1.0, 1.0, None)])], &path).unwrap_err();

        assert!(matches!(err, AnalysisError::UnsupportedFormat(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_render_every_chart_option() {
        let temp_dir = tempfile::tempdir().unwrap();
        let data = [
            series(&[(1.0, 2.0, Some(0.5)), (2.0, 3.0, None), (3.0, f64::NAN, None)]),
            Series::new("other", vec![Point::new(1.0, 1.0), Point::new(2.0, 4.0)]),
        ];

        for (kind, file) in [(ChartKind::Line, "line.png"), (ChartKind::Bar, "nested/bar.svg")] {
            let path = temp_dir.path().join(file);
            let spec = ChartSpec::new("t", "x", "y").kind(kind).markers(true);
            render(&spec, &data, &path).unwrap();
            assert!(fs::metadata(&path).unwrap().len() > 0);
        }

        let svg = fs::read_to_string(temp_dir.path().join("nested/bar.svg")).unwrap();
        assert!(svg.contains("other"));
    }

    #[test]
    fn test_fixed_y_range_ignores_data() {
        let spec = ChartSpec::new("t", "x", "y").y_range(0.0, 140.0);
        let data = [series(&[(1.0, 11.0, None), (2.0, 500.0, Some(50.0))])];
        assert_eq!(y_range(&spec, &data), 0.0..140.0);
    }

    #[test]
    fn test_auto_y_range_includes_error_bars() {
        let spec = ChartSpec::new("t", "x", "y");
        let data = [series(&[(1.0, 10.0, Some(2.0)), (2.0, 20.0, Some(5.0))])];
        let range = y_range(&spec, &data);

        assert_eq!(range.start, 0.0);
        assert!((range.end - 27.5).abs() < 1e-9);
    }

    #[test]
    fn test_auto_y_range_skips_non_finite_values() {
        let spec = ChartSpec::new("t", "x", "y");
        let data = [series(&[(1.0, f64::NAN, None), (2.0, 4.0, Some(f64::NAN))])];
        let range = y_range(&spec, &data);
        assert!((range.end - 4.4).abs() < 1e-9);

        let empty = [series(&[])];
        assert_eq!(y_range(&spec, &empty), 0.0..1.0);
    }

    #[test]
    fn test_x_range() {
        let data = [series(&[(0.0, 1.0, None), (10.0, 1.0, None)])];
        assert_eq!(x_range(ChartKind::Line, &data), -0.5..10.5);
        assert_eq!(x_range(ChartKind::Bar, &data), -5.0..15.0);

        let single = [series(&[(3.0, 1.0, None)])];
        assert_eq!(x_range(ChartKind::Line, &single), 2.0..4.0);
    }

    #[test]
    fn test_bar_spans_do_not_overlap() {
        let slot = 2.0;
        let spans: Vec<(f64, f64)> = (0..3).map(|idx| bar_span(4.0, idx, 3, slot)).collect();

        assert!((spans[0].0 - 3.2).abs() < 1e-9);
        assert!((spans[2].1 - 4.8).abs() < 1e-9);
        for w in spans.windows(2) {
            assert!(w[0].1 <= w[1].0 + 1e-9);
        }
    }

    #[test]
    fn test_x_slot() {
        let data = [
            series(&[(1.0, 0.0, None), (5.0, 0.0, None)]),
            series(&[(2.0, 0.0, None), (5.0, 0.0, None)]),
        ];
        assert_eq!(x_slot(&data), 1.0);
        assert_eq!(x_slot(&[series(&[(7.0, 0.0, None)])]), 1.0);
    }
}
