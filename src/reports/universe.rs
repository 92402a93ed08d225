use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::info;

use crate::config::UniverseReportConfig;
use crate::mailer::ReportPayload;
use crate::market::PriceMatrix;
use crate::reports::format_subject;
use crate::reports::returns::percent_return;
use crate::text::{join, render_column, render_histogram, HistogramOptions};

/// Distribution of returns across every symbol in the matrix, with the
/// biggest movers listed next to each other. Text only.
pub struct UniverseReport<'a> {
    config: &'a UniverseReportConfig,
    daily: &'a PriceMatrix,
}

impl<'a> UniverseReport<'a> {
    pub fn new(config: &'a UniverseReportConfig, daily: &'a PriceMatrix) -> Self {
        Self { config, daily }
    }

    fn histogram_options(&self) -> HistogramOptions {
        HistogramOptions {
            bins: self.config.bins.clone(),
            bins_decimals: self.config.bins_decimals,
            bins_is_percent: self.config.bins_is_percent,
            block_count: self.config.block_count,
        }
    }

    pub fn build(&self) -> Result<ReportPayload> {
        let subject = format_subject(&self.config.subject_format, self.daily.latest_date());
        info!(
            "Building universe report '{}' over {} symbols",
            subject,
            self.daily.symbols().len()
        );

        // Percent bins are expressed in percentage points
        let scale = if self.config.bins_is_percent { 100.0 } else { 1.0 };
        let options = self.histogram_options();
        let mut body = String::new();

        for &offset in &self.config.offsets {
            let returns = percent_return(self.daily, offset)
                .with_context(|| format!("percent return over {} day(s)", offset))?;
            let values: Vec<f64> = returns.values().iter().map(|v| v * scale).collect();

            body.push_str(&format!("{} Day Change %\n", offset));
            body.push_str(&render_histogram(&values, &options)?);
            body.push('\n');

            let ranked = returns.ranked();
            let n = self.config.top_count.min(ranked.len());
            let to_pct = |(s, v): &(String, Decimal)| {
                (s.clone(), v.to_f64().unwrap_or(f64::NAN) * 100.0)
            };
            let top: Vec<(String, f64)> = ranked.iter().take(n).map(to_pct).collect();
            let bottom: Vec<(String, f64)> = ranked.iter().rev().take(n).map(to_pct).collect();

            body.push_str(&join(
                &[render_column(&top, 2, true)?, render_column(&bottom, 2, true)?],
                "    ",
            ));
            body.push('\n');
        }

        Ok(ReportPayload {
            subject,
            plain_body: body,
            files: Vec::new(),
        })
    }
}
