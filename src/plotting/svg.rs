//! Standalone SVG charts written to disk

use anyhow::Context;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::debug;

use super::{AxisFormat, BarChart, DrawingSurface, Plotter};
use crate::error::Result;
use crate::reports::returns::CumulativeReturns;
use crate::utils::{format_currency, slugify};

const PADDING: f64 = 48.0;
const TITLE_HEIGHT: f64 = 24.0;
const LEGEND_WIDTH: f64 = 110.0;
const TICK_COUNT: usize = 5;
const GRID_COLOR: &str = "#e5e5e5";
const AXIS_COLOR: &str = "#8c8c8c";
const PALETTE: [&str; 8] = [
    "#e24a33", "#348abd", "#988ed5", "#777777", "#fbc15e", "#8eba42", "#ffb5b8", "#17becf",
];

/// Writes charts as `<slug-of-title>.svg` into the surface's directory.
#[derive(Debug, Clone, Default)]
pub struct SvgPlotter;

impl SvgPlotter {
    pub fn new() -> Self {
        Self
    }

    fn write(&self, surface: &DrawingSurface, title: &str, svg: String) -> Result<PathBuf> {
        std::fs::create_dir_all(&surface.output_dir).with_context(|| {
            format!("Failed to create chart directory {:?}", surface.output_dir)
        })?;
        let path = surface.output_dir.join(format!("{}.svg", slugify(title)));
        std::fs::write(&path, svg).with_context(|| format!("Failed to write chart {:?}", path))?;
        debug!("Wrote chart {:?}", path);
        Ok(path)
    }
}

impl Plotter for SvgPlotter {
    fn render_bar(&self, surface: &DrawingSurface, chart: &BarChart) -> Result<PathBuf> {
        let svg = draw_bar_chart(surface, chart);
        self.write(surface, &chart.title, svg)
    }

    fn render_line(
        &self,
        surface: &DrawingSurface,
        series: &CumulativeReturns,
        title: &str,
    ) -> Result<PathBuf> {
        let svg = draw_line_chart(surface, series, title);
        self.write(surface, title, svg)
    }
}

/// Plot area in pixels: (left, top, right, bottom)
struct Frame {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Frame {
    fn new(surface: &DrawingSurface, legend: bool) -> Self {
        let width = surface.width as f64;
        let height = surface.height as f64;
        let right = width - PADDING - if legend { LEGEND_WIDTH } else { 0.0 };
        Self {
            left: PADDING,
            top: PADDING / 2.0 + TITLE_HEIGHT,
            right: right.max(PADDING + 1.0),
            bottom: (height - PADDING).max(PADDING / 2.0 + TITLE_HEIGHT + 1.0),
        }
    }

    fn y(&self, value: f64, min_v: f64, max_v: f64) -> f64 {
        if (max_v - min_v).abs() < f64::EPSILON {
            return (self.top + self.bottom) / 2.0;
        }
        let norm = (value - min_v) / (max_v - min_v);
        self.top + (1.0 - norm) * (self.bottom - self.top)
    }
}

/// Value range of a chart, always including zero; flat ranges are widened
fn extent(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (mut min_v, mut max_v) = values
        .filter(|v| v.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if min_v == max_v {
        min_v -= 1.0;
        max_v += 1.0;
    }
    let pad = (max_v - min_v) * 0.05;
    (min_v - pad, max_v + pad)
}

fn tick_label(value: f64, axis: AxisFormat) -> String {
    match axis {
        AxisFormat::Percent => format!("{:.1}%", value * 100.0),
        AxisFormat::Dollar => {
            format_currency(Decimal::from_f64_retain(value).unwrap_or(Decimal::ZERO), 0)
        }
    }
}

fn svg_header(surface: &DrawingSurface, title: &str) -> String {
    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><style>text{{font-family:Arial,sans-serif;font-size:11px;fill:#555}}</style><rect width="100%" height="100%" fill="#ffffff" /><text x="{cx:.2}" y="{ty:.2}" text-anchor="middle" style="font-size:14px;fill:#222">{title}</text>"##,
        w = surface.width,
        h = surface.height,
        cx = surface.width as f64 / 2.0,
        ty = PADDING / 2.0 + 4.0,
        title = escape_xml(title)
    )
}

fn svg_footer() -> &'static str {
    "</svg>"
}

fn draw_y_axis(svg: &mut String, frame: &Frame, min_v: f64, max_v: f64, axis: AxisFormat) {
    for i in 0..TICK_COUNT {
        let value = min_v + (max_v - min_v) * i as f64 / (TICK_COUNT - 1) as f64;
        let y = frame.y(value, min_v, max_v);
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{c}" stroke-width="1" />"#,
            x1 = frame.left,
            x2 = frame.right,
            y = y,
            c = GRID_COLOR
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{label}</text>"#,
            x = frame.left - 6.0,
            y = y + 4.0,
            label = escape_xml(&tick_label(value, axis))
        ));
    }
    let zero = frame.y(0.0, min_v, max_v);
    svg.push_str(&format!(
        r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{c}" stroke-width="1" />"#,
        x1 = frame.left,
        x2 = frame.right,
        y = zero,
        c = AXIS_COLOR
    ));
}

fn draw_bar_chart(surface: &DrawingSurface, chart: &BarChart) -> String {
    let frame = Frame::new(surface, false);
    let (min_v, max_v) = extent(chart.values.iter().copied());

    let mut svg = svg_header(surface, &chart.title);
    draw_y_axis(&mut svg, &frame, min_v, max_v, chart.axis);

    let n = chart.values.len();
    if n == 0 {
        svg.push_str(svg_footer());
        return svg;
    }

    let slot = (frame.right - frame.left) / n as f64;
    let bar_width = slot * 0.7;
    let zero = frame.y(0.0, min_v, max_v);

    for (i, &value) in chart.values.iter().enumerate() {
        if !value.is_finite() {
            continue;
        }
        let center = frame.left + slot * (i as f64 + 0.5);
        let y = frame.y(value, min_v, max_v);
        let (top, bottom) = if y < zero { (y, zero) } else { (zero, y) };
        let fill = chart
            .colors
            .get(i)
            .map(|c| c.to_css())
            .unwrap_or_else(|| AXIS_COLOR.to_string());
        svg.push_str(&format!(
            r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="{fill}" />"#,
            x = center - bar_width / 2.0,
            y = top,
            w = bar_width,
            h = bottom - top,
            fill = fill
        ));
        if let Some(label) = chart.labels.get(i) {
            svg.push_str(&format!(
                r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end" transform="rotate(-90 {x:.2} {y:.2})">{label}</text>"#,
                x = center + 4.0,
                y = frame.bottom + 6.0,
                label = escape_xml(label)
            ));
        }
    }

    svg.push_str(svg_footer());
    svg
}

fn draw_line_chart(surface: &DrawingSurface, series: &CumulativeReturns, title: &str) -> String {
    let frame = Frame::new(surface, true);
    let (min_v, max_v) = extent(
        series
            .rows
            .iter()
            .flat_map(|row| row.iter())
            .filter_map(|v| rust_decimal::prelude::ToPrimitive::to_f64(v)),
    );

    let mut svg = svg_header(surface, title);
    draw_y_axis(&mut svg, &frame, min_v, max_v, AxisFormat::Percent);

    let n = series.dates.len();
    let x_at = |i: usize| {
        if n <= 1 {
            (frame.left + frame.right) / 2.0
        } else {
            frame.left + (frame.right - frame.left) * i as f64 / (n - 1) as f64
        }
    };

    for (k, symbol) in series.symbols.iter().enumerate() {
        let color = PALETTE[k % PALETTE.len()];
        let values = series.series(symbol).unwrap_or_default();
        let coords: Vec<String> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| format!("{:.2},{:.2}", x_at(i), frame.y(v, min_v, max_v)))
            .collect();
        if !coords.is_empty() {
            svg.push_str(&format!(
                r#"<polyline fill="none" stroke="{color}" stroke-width="1.5" points="{coords}" />"#,
                color = color,
                coords = coords.join(" ")
            ));
        }

        // Legend outside the plot area, right side
        let ly = frame.top + 14.0 + 16.0 * k as f64;
        let lx = frame.right + 16.0;
        svg.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y:.2}" x2="{x2:.2}" y2="{y:.2}" stroke="{color}" stroke-width="2" />"#,
            x1 = lx,
            x2 = lx + 18.0,
            y = ly - 4.0,
            color = color
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="start">{label}</text>"#,
            x = lx + 24.0,
            y = ly,
            label = escape_xml(symbol)
        ));
    }

    // First and last date under the axis
    if let (Some(first), Some(last)) = (series.dates.first(), series.dates.last()) {
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="start">{d}</text>"#,
            x = frame.left,
            y = frame.bottom + 16.0,
            d = first
        ));
        svg.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" text-anchor="end">{d}</text>"#,
            x = frame.right,
            y = frame.bottom + 16.0,
            d = last
        ));
    }

    svg.push_str(svg_footer());
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
