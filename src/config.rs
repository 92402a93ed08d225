//! Report configuration
//!
//! The configuration is a TOML file deserialized into explicit structures and
//! validated eagerly: every malformed value is reported at load time, never
//! deep inside a renderer.

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ReportError;

/// Date formats accepted for `start_date` / `end_date`
const DATE_FORMATS: [&str; 2] = ["%Y%m%d", "%Y-%m-%d"];

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub historical_data: HistoricalDataConfig,
    #[serde(default)]
    pub mailer: MailerConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    pub portfolio_report: Option<PortfolioReportConfig>,
    pub universe_report: Option<UniverseReportConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HistoricalDataConfig {
    pub symbols_file: PathBuf,
    /// Price cache directory; defaults to the user cache dir
    pub output_dir: Option<PathBuf>,
    pub start_date: String,
    pub end_date: Option<String>,
    #[serde(default)]
    pub offline: bool,
    /// Proxy URL for price downloads, e.g. a local SOCKS proxy
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MailerConfig {
    #[serde(default = "default_from")]
    pub from: String,
    #[serde(default)]
    pub to: Vec<String>,
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            from: default_from(),
            to: Vec::new(),
            outbox_dir: default_outbox_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlotConfig {
    #[serde(default = "default_chart_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            output_dir: default_chart_dir(),
            width: default_width(),
            height: default_height(),
        }
    }
}

/// Share counts per symbol in effect from a given date
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HoldingsSnapshot {
    pub symbols: BTreeMap<String, Decimal>,
}

impl HoldingsSnapshot {
    pub fn shares(&self, symbol: &str) -> Option<Decimal> {
        self.symbols.get(symbol).copied()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortfolioReportConfig {
    pub subject_format: String,
    /// Holdings snapshots keyed by effective date (e.g. `20160104`)
    pub dates: BTreeMap<String, HoldingsSnapshot>,
    #[serde(default = "default_value_ratio")]
    pub value_ratio: Decimal,
    #[serde(default = "default_offsets")]
    pub offsets: Vec<usize>,
}

impl PortfolioReportConfig {
    /// The snapshot with the latest effective date.
    pub fn effective_holdings(&self) -> Result<(i64, &HoldingsSnapshot), ReportError> {
        let mut latest: Option<(i64, &HoldingsSnapshot)> = None;
        for (key, snapshot) in &self.dates {
            let effective = parse_effective_date(key)?;
            match latest {
                Some((best, _)) if best >= effective => {}
                _ => latest = Some((effective, snapshot)),
            }
        }
        latest.ok_or_else(|| ReportError::Config("no holdings snapshots configured".to_string()))
    }

    fn validate(&self) -> Result<(), ReportError> {
        validate_subject_format(&self.subject_format)?;
        validate_offsets(&self.offsets)?;

        if self.dates.is_empty() {
            return Err(ReportError::Config(
                "portfolio_report.dates must hold at least one snapshot".to_string(),
            ));
        }

        let mut seen: BTreeMap<i64, &str> = BTreeMap::new();
        for (key, snapshot) in &self.dates {
            let effective = parse_effective_date(key)?;
            if let Some(other) = seen.insert(effective, key) {
                return Err(ReportError::Config(format!(
                    "holdings keys '{}' and '{}' name the same effective date",
                    other, key
                )));
            }
            if snapshot.symbols.is_empty() {
                return Err(ReportError::Config(format!(
                    "holdings snapshot '{}' has no symbols",
                    key
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UniverseReportConfig {
    pub subject_format: String,
    #[serde(default = "default_offsets")]
    pub offsets: Vec<usize>,
    pub bins: Vec<f64>,
    #[serde(default)]
    pub bins_decimals: usize,
    #[serde(default)]
    pub bins_is_percent: bool,
    #[serde(default = "default_block_count")]
    pub block_count: usize,
    #[serde(default = "default_top_count")]
    pub top_count: usize,
}

impl UniverseReportConfig {
    fn validate(&self) -> Result<(), ReportError> {
        validate_subject_format(&self.subject_format)?;
        validate_offsets(&self.offsets)?;
        crate::text::histogram::validate_bins(&self.bins)
            .map_err(|e| ReportError::Config(format!("universe_report.bins: {}", e)))?;
        if self.block_count == 0 {
            return Err(ReportError::Config(
                "universe_report.block_count must be positive".to_string(),
            ));
        }
        if self.top_count == 0 {
            return Err(ReportError::Config(
                "universe_report.top_count must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Command-line values that take precedence over the `[historical_data]` section
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub symbols_file: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub offline: bool,
}

impl AppConfig {
    /// Parse configuration text without validating it
    pub fn from_toml_str(text: &str) -> Result<Self, ReportError> {
        toml::from_str(text).map_err(|e| ReportError::Config(e.to_string()))
    }

    /// Load, apply command-line overrides, then validate.
    pub fn load(path: &Path, overrides: &ConfigOverrides) -> Result<Self, ReportError> {
        debug!("Loading config from {:?}", path);
        let text = std::fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        let data = &mut self.historical_data;
        if let Some(ref f) = overrides.symbols_file {
            data.symbols_file = f.clone();
        }
        if let Some(ref d) = overrides.output_dir {
            data.output_dir = Some(d.clone());
        }
        if let Some(ref s) = overrides.start_date {
            data.start_date = s.clone();
        }
        if let Some(ref e) = overrides.end_date {
            data.end_date = Some(e.clone());
        }
        if overrides.offline {
            data.offline = true;
        }
    }

    pub fn validate(&self) -> Result<(), ReportError> {
        let (start, end) = self.historical_data.date_range()?;
        if start > end {
            return Err(ReportError::Config(format!(
                "start_date {} is after end_date {}",
                start, end
            )));
        }
        if let Some(ref portfolio) = self.portfolio_report {
            portfolio.validate()?;
        }
        if let Some(ref universe) = self.universe_report {
            universe.validate()?;
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(ReportError::Config(
                "plot width and height must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl HistoricalDataConfig {
    /// Start and end dates; end defaults to today
    pub fn date_range(&self) -> Result<(NaiveDate, NaiveDate), ReportError> {
        let start = parse_config_date(&self.start_date)?;
        let end = match self.end_date {
            Some(ref e) => parse_config_date(e)?,
            None => Local::now().date_naive(),
        };
        Ok((start, end))
    }

    /// Resolved price cache directory
    pub fn cache_dir(&self) -> Result<PathBuf, ReportError> {
        match self.output_dir {
            Some(ref dir) => Ok(dir.clone()),
            None => dir_spec::cache_home()
                .map(|d| d.join("market-report").join("prices"))
                .ok_or_else(|| {
                    ReportError::Config("could not determine cache directory".to_string())
                }),
        }
    }
}

pub fn parse_config_date(s: &str) -> Result<NaiveDate, ReportError> {
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s.trim(), f).ok())
        .ok_or_else(|| ReportError::Config(format!("invalid date '{}', use YYYYMMDD", s)))
}

fn parse_effective_date(key: &str) -> Result<i64, ReportError> {
    key.trim().parse::<i64>().map_err(|_| {
        ReportError::Config(format!(
            "holdings key '{}' is not an integer effective date",
            key
        ))
    })
}

fn validate_subject_format(format: &str) -> Result<(), ReportError> {
    match format.matches("%s").count() {
        1 => Ok(()),
        n => Err(ReportError::Config(format!(
            "subject_format '{}' must contain exactly one %s placeholder (found {})",
            format, n
        ))),
    }
}

fn validate_offsets(offsets: &[usize]) -> Result<(), ReportError> {
    if offsets.is_empty() {
        return Err(ReportError::Config("offsets must not be empty".to_string()));
    }
    if offsets.contains(&0) {
        return Err(ReportError::Config("offsets must be >= 1".to_string()));
    }
    Ok(())
}

fn default_from() -> String {
    "market-report@localhost".to_string()
}

fn default_outbox_dir() -> PathBuf {
    PathBuf::from("outbox")
}

fn default_chart_dir() -> PathBuf {
    PathBuf::from("charts")
}

fn default_width() -> u32 {
    800
}

fn default_height() -> u32 {
    400
}

fn default_value_ratio() -> Decimal {
    Decimal::ONE
}

fn default_offsets() -> Vec<usize> {
    vec![1]
}

fn default_block_count() -> usize {
    100
}

fn default_top_count() -> usize {
    5
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"
[historical_data]
symbols_file = "symbols.txt"
output_dir = "data"
start_date = "20240101"
end_date = "20240131"

[portfolio_report]
subject_format = "Portfolio Report -- %s"
value_ratio = 0.5

[portfolio_report.dates.20160104.symbols]
AAPL = 10
MSFT = 5

[portfolio_report.dates.9000101.symbols]
AAPL = 1

[universe_report]
subject_format = "Universe -- %s"
bins = [-5, -1, 0, 1, 5]
bins_is_percent = true
"#;

    #[test]
    fn test_sample_config_parses_and_validates() {
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.validate().unwrap();

        let portfolio = config.portfolio_report.as_ref().unwrap();
        assert_eq!(portfolio.value_ratio, dec!(0.5));
        assert_eq!(portfolio.offsets, vec![1]);

        let universe = config.universe_report.as_ref().unwrap();
        assert_eq!(universe.block_count, 100);
        assert_eq!(universe.bins_decimals, 0);
        assert_eq!(config.plot.width, 800);
    }

    #[test]
    fn test_effective_holdings_uses_numeric_not_lexical_order() {
        // "9000101" sorts after "20160104" as a string but is the older date
        let config = AppConfig::from_toml_str(SAMPLE).unwrap();
        let (date, holdings) = config
            .portfolio_report
            .as_ref()
            .unwrap()
            .effective_holdings()
            .unwrap();
        assert_eq!(date, 20160104);
        assert_eq!(holdings.shares("MSFT"), Some(dec!(5)));
    }

    #[test]
    fn test_non_integer_holdings_key_is_config_error() {
        let text = SAMPLE.replace("dates.9000101", "dates.latest");
        let config = AppConfig::from_toml_str(&text).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
        assert!(err.to_string().contains("latest"));
    }

    #[test]
    fn test_subject_format_needs_one_placeholder() {
        let text = SAMPLE.replace("Portfolio Report -- %s", "Portfolio Report");
        let config = AppConfig::from_toml_str(&text).unwrap();
        assert!(config.validate().is_err());

        let text = SAMPLE.replace("Universe -- %s", "%s %s");
        let config = AppConfig::from_toml_str(&text).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_descending_bins_rejected_at_load() {
        let text = SAMPLE.replace("[-5, -1, 0, 1, 5]", "[5, 1, 0]");
        let config = AppConfig::from_toml_str(&text).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("bins"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let text = SAMPLE.replace("value_ratio = 0.5", "value_ration = 0.5");
        assert!(AppConfig::from_toml_str(&text).is_err());
    }

    #[test]
    fn test_overrides_replace_historical_fields() {
        let mut config = AppConfig::from_toml_str(SAMPLE).unwrap();
        config.apply_overrides(&ConfigOverrides {
            start_date: Some("20230601".to_string()),
            offline: true,
            ..Default::default()
        });
        let (start, end) = config.historical_data.date_range().unwrap();
        assert_eq!(start, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert!(config.historical_data.offline);
    }

    #[test]
    fn test_start_after_end_rejected() {
        let text = SAMPLE.replace("20240131", "20231231");
        let config = AppConfig::from_toml_str(&text).unwrap();
        assert!(config.validate().is_err());
    }
}
