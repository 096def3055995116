//! PNG rendering of [`ChartSpec`]s with plotters.
//!
//! Charts are laid out on a 10x6 inch canvas; the pixel size, fonts and line
//! widths scale with the configured DPI so a 300 DPI render looks like the
//! 100 DPI one, only sharper.

use crate::chart::{
    ChartRenderer, ChartSpec, LegendPosition, LineStyle, Marker, RenderError, Rgb, Series,
};
use crate::config::MAX_DPI;
use plotters::coord::combinators::BindKeyPoints;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

const WIDTH_IN: f64 = 10.0;
const HEIGHT_IN: f64 = 6.0;

// Sizes in typographic points (1/72 inch).
const TITLE_PT: f64 = 16.0;
const AXIS_LABEL_PT: f64 = 12.0;
const TICK_LABEL_PT: f64 = 10.0;
const LEGEND_PT: f64 = 10.0;
const LINE_PT: f64 = 2.0;
const MARKER_PT: f64 = 3.0;

/// Multiplicative padding around the outermost x ticks on the log axis.
const X_PADDING: f64 = 1.25;
/// Fraction of the y span added above and below the data.
const Y_PADDING: f64 = 0.08;

/// Pixel measurements derived from the DPI.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Layout {
    canvas: (u32, u32),
    title: f64,
    axis_label: f64,
    tick_label: f64,
    legend: f64,
    line: u32,
    marker: i32,
    dash: u32,
    gap: u32,
    margin: u32,
    x_label_area: u32,
    y_label_area: u32,
}

impl Layout {
    fn for_dpi(dpi: u32) -> Self {
        let px = |pt: f64| pt * dpi as f64 / 72.0;
        let line = px(LINE_PT).round().max(1.0) as u32;
        Self {
            canvas: (
                (WIDTH_IN * dpi as f64).round() as u32,
                (HEIGHT_IN * dpi as f64).round() as u32,
            ),
            title: px(TITLE_PT),
            axis_label: px(AXIS_LABEL_PT),
            tick_label: px(TICK_LABEL_PT),
            legend: px(LEGEND_PT),
            line,
            marker: px(MARKER_PT).round().max(2.0) as i32,
            dash: line * 3,
            gap: line * 2,
            margin: px(14.0).round() as u32,
            x_label_area: px(40.0).round() as u32,
            y_label_area: px(60.0).round() as u32,
        }
    }
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Tick label for an x position: plain integer, never scientific notation.
fn format_tick(x: f64) -> String {
    if x.fract() == 0.0 {
        format!("{}", x as u64)
    } else {
        format!("{x}")
    }
}

/// Linear y range covering the series, padded; `0..1` when it has no data.
fn y_range(series: &Series) -> std::ops::Range<f64> {
    match series.bounds() {
        None => 0.0..1.0,
        Some((lo, hi)) if lo == hi => {
            let pad = (lo.abs() * 0.1).max(1.0);
            (lo - pad)..(hi + pad)
        }
        Some((lo, hi)) => {
            let pad = (hi - lo) * Y_PADDING;
            (lo - pad)..(hi + pad)
        }
    }
}

/// Legend corner for `spec`. "Best" avoids the corner the left series ends in.
fn legend_corner(spec: &ChartSpec) -> SeriesLabelPosition {
    match spec.legend {
        LegendPosition::UpperLeft => SeriesLabelPosition::UpperLeft,
        LegendPosition::Best => {
            let points = spec.points(&spec.left);
            match (points.first(), points.last()) {
                (Some(first), Some(last)) if last.1 < first.1 => SeriesLabelPosition::UpperRight,
                _ => SeriesLabelPosition::UpperLeft,
            }
        }
    }
}

/// Draw one series' line segments and markers with `$chart.$draw`, then
/// attach its legend entry.
macro_rules! plot_series {
    ($chart:ident . $draw:ident, $spec:expr, $series:expr, $layout:expr) => {{
        let series: &Series = $series;
        let layout: &Layout = $layout;
        let color = rgb(series.color);
        let line = color.stroke_width(layout.line);
        let fill = color.filled();
        let m = layout.marker;

        for segment in $spec.segments(series) {
            match series.line {
                LineStyle::Solid => {
                    $chart.$draw(LineSeries::new(segment, line))?;
                }
                LineStyle::Dashed => {
                    $chart.$draw(DashedLineSeries::new(segment, layout.dash, layout.gap, line))?;
                }
            }
        }

        let points = $spec.points(series);
        let reach = m * 4;
        match series.marker {
            Marker::Circle => {
                $chart
                    .$draw(
                        points
                            .into_iter()
                            .map(|p| EmptyElement::at(p) + Circle::new((0, 0), m, fill)),
                    )?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(-reach, 0), (reach, 0)], line)
                            + Circle::new((0, 0), m, fill)
                    });
            }
            Marker::Square => {
                $chart
                    .$draw(points.into_iter().map(|p| {
                        EmptyElement::at(p) + Rectangle::new([(-m, -m), (m, m)], fill)
                    }))?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| {
                        EmptyElement::at((x, y))
                            + PathElement::new(vec![(-reach, 0), (reach, 0)], line)
                            + Rectangle::new([(-m, -m), (m, m)], fill)
                    });
            }
        }
    }};
}

/// Renders charts to PNG files through plotters' bitmap backend.
#[derive(Debug, Clone, Copy)]
pub struct PlottersRenderer {
    dpi: u32,
}

impl PlottersRenderer {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi: dpi.clamp(1, MAX_DPI),
        }
    }

    fn draw(&self, spec: &ChartSpec) -> Result<(), Box<dyn std::error::Error>> {
        let layout = Layout::for_dpi(self.dpi);
        let lo = spec.ticks.first().copied().unwrap_or(1.0);
        let hi = spec.ticks.last().copied().unwrap_or(lo);
        let x_axis = || {
            ((lo / X_PADDING)..(hi * X_PADDING))
                .log_scale()
                .with_key_points(spec.ticks.clone())
        };

        let root = BitMapBackend::new(&spec.output, layout.canvas).into_drawing_area();
        root.fill(&WHITE)?;

        let right_area = if spec.right.is_some() {
            layout.y_label_area
        } else {
            0
        };

        let mut chart = ChartBuilder::on(&root)
            .caption(
                &spec.title,
                ("sans-serif", layout.title)
                    .into_font()
                    .style(FontStyle::Bold),
            )
            .margin(layout.margin)
            .x_label_area_size(layout.x_label_area)
            .y_label_area_size(layout.y_label_area)
            .right_y_label_area_size(right_area)
            .build_cartesian_2d(x_axis(), y_range(&spec.left))?;

        let left_color = rgb(spec.left.color);
        chart
            .configure_mesh()
            .bold_line_style(BLACK.mix(0.15).stroke_width(1))
            .light_line_style(TRANSPARENT.stroke_width(0))
            .x_label_formatter(&|x| format_tick(*x))
            .x_desc(spec.x_label.as_str())
            .y_desc(spec.left.label.as_str())
            .x_label_style(("sans-serif", layout.tick_label).into_font())
            .y_label_style(
                ("sans-serif", layout.tick_label)
                    .into_font()
                    .color(&left_color),
            )
            .axis_desc_style(("sans-serif", layout.axis_label).into_font())
            .draw()?;

        plot_series!(chart.draw_series, spec, &spec.left, &layout);

        let legend_font = ("sans-serif", layout.legend).into_font();
        let corner = legend_corner(spec);

        match &spec.right {
            Some(right) => {
                let mut chart = chart.set_secondary_coord(x_axis(), y_range(right));
                let right_color = rgb(right.color);
                chart
                    .configure_secondary_axes()
                    .y_desc(right.label.as_str())
                    .label_style(
                        ("sans-serif", layout.tick_label)
                            .into_font()
                            .color(&right_color),
                    )
                    .axis_desc_style(("sans-serif", layout.axis_label).into_font())
                    .draw()?;

                plot_series!(chart.draw_secondary_series, spec, right, &layout);

                chart
                    .configure_series_labels()
                    .position(corner)
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .label_font(legend_font)
                    .draw()?;
            }
            None => {
                chart
                    .configure_series_labels()
                    .position(corner)
                    .background_style(WHITE.mix(0.8))
                    .border_style(BLACK)
                    .label_font(legend_font)
                    .draw()?;
            }
        }

        root.present()?;
        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, spec: &ChartSpec) -> Result<(), RenderError> {
        if spec.x_values.is_empty() {
            return Err(RenderError::Empty {
                title: spec.title.clone(),
            });
        }

        self.draw(spec).map_err(|e| RenderError::Draw {
            path: spec.output.clone(),
            detail: e.to_string(),
        })?;

        tracing::info!(path = %spec.output.display(), "figure saved");
        Ok(())
    }
}
