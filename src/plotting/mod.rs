// Plotting module - chart artifacts attached to reports

pub mod svg;

pub use svg::SvgPlotter;

use std::path::PathBuf;

use crate::config::PlotConfig;
use crate::error::Result;
use crate::reports::colors::Rgba;
use crate::reports::returns::CumulativeReturns;

/// Explicit drawing target handed to every plotting call.
///
/// Charts never share hidden state: each call receives the surface it draws
/// on and returns the file it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingSurface {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl DrawingSurface {
    pub fn new(output_dir: impl Into<PathBuf>, width: u32, height: u32) -> Self {
        Self {
            output_dir: output_dir.into(),
            width,
            height,
        }
    }

    pub fn from_config(config: &PlotConfig) -> Self {
        Self::new(config.output_dir.clone(), config.width, config.height)
    }
}

/// How y-axis tick values are labeled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisFormat {
    /// Fractions shown as percentages (0.012 -> "1.2%")
    Percent,
    /// Currency amounts ("$1,200")
    Dollar,
}

/// One bar per symbol, each with its own color
#[derive(Debug, Clone)]
pub struct BarChart {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub colors: Vec<Rgba>,
    pub axis: AxisFormat,
}

pub trait Plotter {
    /// Draw a bar chart and return the written file
    fn render_bar(&self, surface: &DrawingSurface, chart: &BarChart) -> Result<PathBuf>;

    /// Draw one line per symbol of a cumulative return series
    fn render_line(
        &self,
        surface: &DrawingSurface,
        series: &CumulativeReturns,
        title: &str,
    ) -> Result<PathBuf>;
}
