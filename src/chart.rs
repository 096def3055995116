//! Chart preparation: turn collected records into a renderer-independent
//! [`ChartSpec`].
//!
//! Everything that decides *what* is drawn (ordering, gaps, tick positions,
//! labels, colours) lives here so it can be checked without producing an
//! image. The [`ChartRenderer`] trait is the seam to the drawing library.

use crate::collect::MetricRecord;
use crate::config::ThroughputMode;
use crate::sweep::XField;
use std::path::{Path, PathBuf};

/// 24-bit colour, matching the benchmark dashboard palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLUE: Rgb = Rgb(0x3b, 0x82, 0xf6);
pub const EMERALD: Rgb = Rgb(0x10, 0xb9, 0x81);
pub const RED: Rgb = Rgb(0xef, 0x44, 0x44);
pub const ORANGE: Rgb = Rgb(0xf9, 0x73, 0x16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegendPosition {
    /// Let the renderer pick a corner away from the data.
    Best,
    UpperLeft,
}

/// One y-axis worth of data.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub color: Rgb,
    pub line: LineStyle,
    pub marker: Marker,
    /// Aligned with [`ChartSpec::x_values`]; `None` leaves a gap.
    pub points: Vec<Option<f64>>,
}

impl Series {
    fn new(
        label: &str,
        color: Rgb,
        line: LineStyle,
        marker: Marker,
        points: Vec<Option<f64>>,
    ) -> Self {
        Self {
            label: label.to_string(),
            color,
            line,
            marker,
            points,
        }
    }

    /// Smallest and largest present value.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        self.points.iter().flatten().fold(None, |acc, &v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }
}

/// Complete description of one dual-axis line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub output: PathBuf,
    /// Ascending, one entry per record.
    pub x_values: Vec<f64>,
    /// Distinct x-values; the only tick positions on the x-axis.
    pub ticks: Vec<f64>,
    pub left: Series,
    pub right: Option<Series>,
    pub legend: LegendPosition,
}

impl ChartSpec {
    /// Split a series into runs of consecutive present points.
    ///
    /// A missing value ends the current line segment; the x-value still
    /// keeps its tick.
    pub fn segments(&self, series: &Series) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (&x, y) in self.x_values.iter().zip(&series.points) {
            match y {
                Some(y) => current.push((x, *y)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// All present `(x, y)` points of a series, for marker drawing.
    pub fn points(&self, series: &Series) -> Vec<(f64, f64)> {
        self.x_values
            .iter()
            .zip(&series.points)
            .filter_map(|(&x, y)| y.map(|y| (x, y)))
            .collect()
    }
}

/// Draws a [`ChartSpec`] to its output path.
pub trait ChartRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<(), RenderError>;
}

/// Errors produced while drawing or saving a chart.
#[derive(Debug)]
pub enum RenderError {
    /// Chart has nothing drawable (e.g. no x-values).
    Empty { title: String },
    /// The drawing backend rejected an operation.
    Draw { path: PathBuf, detail: String },
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Empty { title } => write!(f, "no data to plot for {title}"),
            RenderError::Draw { path, detail } => {
                write!(f, "failed to draw chart {}: {detail}", path.display())
            }
        }
    }
}

impl std::error::Error for RenderError {}

/// Records ordered ascending by `x_field`. The input is left untouched.
pub fn sorted_by(records: &[MetricRecord], x_field: XField) -> Vec<&MetricRecord> {
    let mut sorted: Vec<&MetricRecord> = records.iter().collect();
    sorted.sort_by_key(|r| x_field.value(r));
    sorted
}

/// Common frame shared by both chart kinds: sorted x-values and tick set.
struct Frame<'a> {
    sorted: Vec<&'a MetricRecord>,
    x_values: Vec<f64>,
    ticks: Vec<f64>,
}

impl<'a> Frame<'a> {
    fn new(records: &'a [MetricRecord], x_field: XField) -> Self {
        let sorted = sorted_by(records, x_field);
        let x_values: Vec<f64> = sorted.iter().map(|r| x_field.value(r) as f64).collect();
        let mut ticks = x_values.clone();
        ticks.dedup();
        Self {
            sorted,
            x_values,
            ticks,
        }
    }

    fn column(&self, field: impl Fn(&MetricRecord) -> Option<f64>) -> Vec<Option<f64>> {
        self.sorted.iter().map(|r| field(*r)).collect()
    }
}

/// Mean TTFT (left) and mean ITL (right) against `x_field`.
///
/// Returns `None` when there is nothing to plot.
pub fn latency_chart(
    records: &[MetricRecord],
    title: &str,
    x_field: XField,
    x_label: &str,
    output: &Path,
) -> Option<ChartSpec> {
    if records.is_empty() {
        tracing::warn!(title, "no data to plot, skipping");
        return None;
    }
    let frame = Frame::new(records, x_field);

    let left = Series::new(
        "Mean TTFT (ms)",
        BLUE,
        LineStyle::Solid,
        Marker::Circle,
        frame.column(|r| r.ttft),
    );
    let right = Series::new(
        "Mean ITL (ms)",
        EMERALD,
        LineStyle::Dashed,
        Marker::Square,
        frame.column(|r| r.itl),
    );

    Some(ChartSpec {
        title: title.to_string(),
        x_label: x_label.to_string(),
        output: output.to_path_buf(),
        x_values: frame.x_values,
        ticks: frame.ticks,
        left,
        right: Some(right),
        legend: LegendPosition::Best,
    })
}

/// Throughput against `x_field`, shaped by `mode`.
///
/// [`ThroughputMode::Dual`] puts prefill throughput on the left axis and
/// output token throughput on the right; [`ThroughputMode::TokenOnly`] plots
/// output token throughput alone.
pub fn throughput_chart(
    records: &[MetricRecord],
    title: &str,
    x_field: XField,
    x_label: &str,
    output: &Path,
    mode: ThroughputMode,
) -> Option<ChartSpec> {
    if records.is_empty() {
        tracing::warn!(title, "no data to plot, skipping");
        return None;
    }
    let frame = Frame::new(records, x_field);
    let token_label = "Output Token Throughput (tok/s)";

    let (left, right) = match mode {
        ThroughputMode::Dual => (
            Series::new(
                "Prefill Throughput (tok/s)",
                RED,
                LineStyle::Solid,
                Marker::Circle,
                frame.column(|r| r.prefill_throughput),
            ),
            Some(Series::new(
                token_label,
                ORANGE,
                LineStyle::Dashed,
                Marker::Square,
                frame.column(|r| r.token_throughput),
            )),
        ),
        ThroughputMode::TokenOnly => (
            Series::new(
                token_label,
                ORANGE,
                LineStyle::Solid,
                Marker::Circle,
                frame.column(|r| r.token_throughput),
            ),
            None,
        ),
    };

    Some(ChartSpec {
        title: title.to_string(),
        x_label: x_label.to_string(),
        output: output.to_path_buf(),
        x_values: frame.x_values,
        ticks: frame.ticks,
        left,
        right,
        legend: LegendPosition::UpperLeft,
    })
}
