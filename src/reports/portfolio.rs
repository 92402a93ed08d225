use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use tracing::{debug, info, warn};

use crate::config::PortfolioReportConfig;
use crate::mailer::ReportPayload;
use crate::market::PriceMatrix;
use crate::plotting::{AxisFormat, BarChart, DrawingSurface, Plotter};
use crate::reports::colors::colors_for;
use crate::reports::format_subject;
use crate::reports::returns::{cumulative_return, dollar_return, percent_return, ReturnSeries};
use crate::text::{join, render_column};
use crate::utils::format_currency;

/// Separator between side-by-side text columns
const COLUMN_SEPARATOR: &str = "  ";

/// Past performance of a fixed portfolio of instruments: percent and dollar
/// change bars, cumulative return lines, and the same numbers as text.
pub struct PortfolioReport<'a> {
    config: &'a PortfolioReportConfig,
    daily: &'a PriceMatrix,
}

impl<'a> PortfolioReport<'a> {
    pub fn new(config: &'a PortfolioReportConfig, daily: &'a PriceMatrix) -> Self {
        Self { config, daily }
    }

    /// Creates the entire report. Charts are drawn on `surface` and attached.
    pub fn build(&self, plotter: &dyn Plotter, surface: &DrawingSurface) -> Result<ReportPayload> {
        let subject = format_subject(&self.config.subject_format, self.daily.latest_date());
        let (effective_date, holdings) = self.config.effective_holdings()?;
        info!(
            "Building portfolio report '{}' with holdings from {}",
            subject, effective_date
        );

        let mut body = String::new();
        let mut files = Vec::new();

        let unpriced: Vec<&str> = holdings
            .symbols
            .keys()
            .filter(|s| self.daily.symbol_index(s).is_none())
            .map(String::as_str)
            .collect();
        if !unpriced.is_empty() {
            warn!(
                "Holdings without price data are left out of the totals: {}",
                unpriced.join(", ")
            );
            body.push_str(&format!("Holdings without prices: {}\n\n", unpriced.join(", ")));
        }

        for &offset in &self.config.offsets {
            let percent = percent_return(self.daily, offset)
                .with_context(|| format!("percent return over {} day(s)", offset))?;
            let dollars = dollar_return(self.daily, offset, holdings, self.config.value_ratio)
                .with_context(|| format!("dollar return over {} day(s)", offset))?;
            let total = format_currency(dollars.total(), 2);

            files.push(plotter.render_bar(
                surface,
                &bar_chart(format!("{} Day Change %", offset), &percent, AxisFormat::Percent),
            )?);
            files.push(plotter.render_bar(
                surface,
                &bar_chart(
                    format!("{} Day Change | {}", offset, total),
                    &dollars,
                    AxisFormat::Dollar,
                ),
            )?);

            let percent_column = render_column(&percent.to_labeled(100.0), 2, true)?;
            let dollar_column = render_column(&dollars.to_labeled(1.0), 2, false)?;
            body.push_str(&format!("{} Day Change | {}\n", offset, total));
            body.push_str(&join(&[percent_column, dollar_column], COLUMN_SEPARATOR));
            body.push('\n');
            debug!("Rendered {} day change for {} symbols", offset, percent.len());
        }

        let cumulative = cumulative_return(self.daily).context("cumulative return")?;
        files.push(plotter.render_line(surface, &cumulative, "Change %")?);

        let last = cumulative.rows.len() - 1;
        let since_start: Vec<(String, f64)> = cumulative
            .symbols
            .iter()
            .zip(&cumulative.rows[last])
            .map(|(s, v)| (s.clone(), v.to_f64().unwrap_or(f64::NAN) * 100.0))
            .collect();
        body.push_str(&format!("Change % since {}\n", self.daily.dates()[0]));
        body.push_str(&render_column(&since_start, 2, true)?);

        Ok(ReportPayload {
            subject,
            plain_body: body,
            files,
        })
    }
}

fn bar_chart(title: String, series: &ReturnSeries, axis: AxisFormat) -> BarChart {
    BarChart {
        title,
        labels: series.symbols().into_iter().map(String::from).collect(),
        values: series.values(),
        colors: colors_for(series),
        axis,
    }
}
