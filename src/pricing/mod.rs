// Pricing module - daily price history from Yahoo Finance with a CSV cache

pub mod cache;
pub mod yahoo;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate};
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use reqwest::Client;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::HistoricalDataConfig;
use crate::market::{PriceField, PriceMatrix};

/// One trading session for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Decimal,
    pub adj_close: Decimal,
    pub volume: Option<i64>,
}

impl DailyBar {
    fn field(&self, field: PriceField) -> Option<Decimal> {
        match field {
            PriceField::Open => self.open,
            PriceField::High => self.high,
            PriceField::Low => self.low,
            PriceField::Close => Some(self.close),
            PriceField::AdjClose => Some(self.adj_close),
            PriceField::Volume => self.volume.map(Decimal::from),
        }
    }
}

/// First cached session may trail the start date by this many days
/// (weekend plus a holiday) and still count as covering it
const START_SLACK_DAYS: i64 = 4;

const FIELDS: [PriceField; 6] = [
    PriceField::Open,
    PriceField::High,
    PriceField::Low,
    PriceField::Close,
    PriceField::AdjClose,
    PriceField::Volume,
];

/// Read the symbol universe: one symbol per line, `#` starts a comment.
/// Duplicates are dropped, first occurrence wins.
pub fn read_symbols_file(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read symbols file {:?}", path))?;
    Ok(parse_symbols(&text))
}

fn parse_symbols(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .unique()
        .collect()
}

/// Build a matrix over the dates every remaining symbol traded on.
///
/// Symbols without bars are dropped with a warning. A field is included only
/// when every cell has it; adjusted and raw closes always are. Returns `None`
/// when no symbol or no common date is left.
pub fn assemble_matrix(series: BTreeMap<String, Vec<DailyBar>>) -> Result<Option<PriceMatrix>> {
    let mut by_symbol: BTreeMap<String, BTreeMap<NaiveDate, DailyBar>> = BTreeMap::new();
    for (symbol, bars) in series {
        if bars.is_empty() {
            warn!("No price data for {}, dropping it", symbol);
            continue;
        }
        by_symbol.insert(symbol, bars.into_iter().map(|b| (b.date, b)).collect());
    }

    if by_symbol.is_empty() {
        return Ok(None);
    }

    let mut common: Option<BTreeSet<NaiveDate>> = None;
    for bars in by_symbol.values() {
        let dates: BTreeSet<NaiveDate> = bars.keys().copied().collect();
        common = Some(match common {
            Some(c) => c.intersection(&dates).copied().collect(),
            None => dates,
        });
    }
    let dates: Vec<NaiveDate> = common.unwrap_or_default().into_iter().collect();

    let widest = by_symbol.values().map(BTreeMap::len).max().unwrap_or(0);
    if dates.len() < widest {
        warn!(
            "Using {} dates common to all {} symbols ({} dropped)",
            dates.len(),
            by_symbol.len(),
            widest - dates.len()
        );
    }
    if dates.is_empty() {
        warn!("Symbols share no trading dates");
        return Ok(None);
    }

    let symbols: Vec<String> = by_symbol.keys().cloned().collect();
    let mut values = BTreeMap::new();
    for field in FIELDS {
        let rows: Option<Vec<Vec<Decimal>>> = dates
            .iter()
            .map(|date| {
                by_symbol
                    .values()
                    .map(|bars| bars.get(date).and_then(|b| b.field(field)))
                    .collect()
            })
            .collect();
        match rows {
            Some(rows) => {
                values.insert(field, rows);
            }
            None => debug!("Field {} is incomplete, leaving it out", field),
        }
    }

    Ok(Some(PriceMatrix::new(dates, symbols, values)?))
}

/// Daily price history for the configured symbol universe
pub struct HistoricalData {
    symbols: Vec<String>,
    cache_dir: PathBuf,
    start: NaiveDate,
    end: NaiveDate,
    offline: bool,
    client: Option<Client>,
}

impl HistoricalData {
    pub fn new(config: &HistoricalDataConfig) -> Result<Self> {
        let (start, end) = config.date_range()?;
        let symbols = read_symbols_file(&config.symbols_file)?;
        let cache_dir = config.cache_dir()?;
        let client = if config.offline {
            None
        } else {
            Some(yahoo::build_client(config.proxy.as_deref())?)
        };

        info!(
            "{} symbols, {} to {}, cache {:?}{}",
            symbols.len(),
            start,
            end,
            cache_dir,
            if config.offline { " (offline)" } else { "" }
        );

        Ok(Self {
            symbols,
            cache_dir,
            start,
            end,
            offline: config.offline,
            client,
        })
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Latest daily prices for every symbol, or `None` when nothing is
    /// available in the requested range.
    pub async fn get_daily(&self) -> Result<Option<PriceMatrix>> {
        let progress = ProgressBar::new(self.symbols.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );

        let mut series = BTreeMap::new();
        for symbol in &self.symbols {
            progress.set_message(symbol.clone());
            let bars = self.load_symbol(symbol).await?;
            let in_range: Vec<DailyBar> = bars
                .into_iter()
                .filter(|b| b.date >= self.start && b.date <= self.end)
                .collect();
            series.insert(symbol.clone(), in_range);
            progress.inc(1);
        }
        progress.finish_and_clear();

        assemble_matrix(series)
    }

    async fn load_symbol(&self, symbol: &str) -> Result<Vec<DailyBar>> {
        let path = cache::cache_path(&self.cache_dir, symbol);
        let cached = if path.exists() {
            Some(cache::read_bars(&path)?)
        } else {
            None
        };

        let client = match self.client {
            Some(ref client) if !self.is_fresh(&path, cached.as_deref()) => client,
            _ => {
                if cached.is_none() {
                    warn!("No cached prices for {} at {:?}", symbol, path);
                }
                return Ok(cached.unwrap_or_default());
            }
        };

        match yahoo::fetch_daily_bars(client, symbol, self.start, self.end).await {
            Ok(bars) => {
                cache::write_bars(&path, &bars)?;
                Ok(bars)
            }
            Err(e) => {
                warn!("Failed to fetch {}: {:#}", symbol, e);
                Ok(cached.unwrap_or_default())
            }
        }
    }

    /// A cache is fresh when it starts at the start date (give or take a
    /// market holiday weekend) and either reaches the end date or was
    /// written today.
    fn is_fresh(&self, path: &Path, cached: Option<&[DailyBar]>) -> bool {
        let Some(bars) = cached else {
            return false;
        };
        let covers_start = bars
            .first()
            .is_some_and(|b| b.date <= self.start + Duration::days(START_SLACK_DAYS));
        if !covers_start {
            debug!("Cache {:?} starts after {}, refetching", path, self.start);
            return false;
        }
        if bars.last().is_some_and(|b| b.date >= self.end) {
            return true;
        }
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(|t| DateTime::<Local>::from(t).date_naive() == Local::now().date_naive())
            .unwrap_or(false)
    }
}
