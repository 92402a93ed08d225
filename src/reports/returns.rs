//! Return series derived from a price matrix
//!
//! All calculations use the adjusted close. Percent returns are fractional
//! (0.05 = 5%); dollar returns are percent returns scaled by the base price,
//! the share count held and the configured value ratio.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::HoldingsSnapshot;
use crate::error::ReportError;
use crate::market::PriceMatrix;

/// Per-symbol returns, always ordered by symbol ascending
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnSeries {
    entries: Vec<(String, Decimal)>,
}

impl ReturnSeries {
    /// Build from arbitrary entries; they are sorted by symbol.
    pub fn new(mut entries: Vec<(String, Decimal)>) -> Self {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Decimal)> + '_ {
        self.entries.iter().map(|(s, v)| (s.as_str(), *v))
    }

    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.entries
            .binary_search_by(|(s, _)| s.as_str().cmp(symbol))
            .ok()
            .map(|i| self.entries[i].1)
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.entries.iter().map(|(s, _)| s.as_str()).collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, v)| as_f64(*v)).collect()
    }

    pub fn total(&self) -> Decimal {
        self.entries.iter().map(|(_, v)| *v).sum()
    }

    pub fn max_abs(&self) -> Decimal {
        self.entries
            .iter()
            .map(|(_, v)| v.abs())
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// `(symbol, value * scale)` pairs for the text renderers
    pub fn to_labeled(&self, scale: f64) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|(s, v)| (s.clone(), as_f64(*v) * scale))
            .collect()
    }

    /// Entries ordered by value descending, ties by symbol
    pub fn ranked(&self) -> Vec<(String, Decimal)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }
}

/// Cumulative return of every symbol on every date, relative to the first date
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CumulativeReturns {
    pub dates: Vec<NaiveDate>,
    pub symbols: Vec<String>,
    /// rows[date_idx][symbol_idx]
    pub rows: Vec<Vec<Decimal>>,
}

impl CumulativeReturns {
    /// One symbol's cumulative return over time
    pub fn series(&self, symbol: &str) -> Option<Vec<f64>> {
        let col = self.symbols.iter().position(|s| s == symbol)?;
        Some(self.rows.iter().map(|row| as_f64(row[col])).collect())
    }
}

fn as_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}

/// Fractional return of every symbol over the last `offset` trading days.
pub fn percent_return(prices: &PriceMatrix, offset: usize) -> Result<ReturnSeries, ReportError> {
    let date_count = prices.date_count();
    if offset < 1 || offset >= date_count {
        return Err(ReportError::InvalidOffset { offset, date_count });
    }
    let last = adj_close(prices, date_count - 1)?;
    let base = adj_close(prices, date_count - 1 - offset)?;

    let mut entries = Vec::with_capacity(prices.symbols().len());
    for ((symbol, &end), &start) in prices.symbols().iter().zip(last).zip(base) {
        if start.is_zero() {
            return Err(ReportError::DivisionByZero {
                symbol: symbol.clone(),
            });
        }
        entries.push((symbol.clone(), (end - start) / start));
    }
    Ok(ReturnSeries::new(entries))
}

/// Currency-denominated return of every symbol over the last `offset` days.
pub fn dollar_return(
    prices: &PriceMatrix,
    offset: usize,
    holdings: &HoldingsSnapshot,
    value_ratio: Decimal,
) -> Result<ReturnSeries, ReportError> {
    let percent = percent_return(prices, offset)?;
    let base = adj_close(prices, prices.date_count() - 1 - offset)?;

    let mut entries = Vec::with_capacity(percent.len());
    for ((symbol, pct), &base_price) in percent.iter().zip(base) {
        let shares = holdings
            .shares(symbol)
            .ok_or_else(|| ReportError::MissingHolding {
                symbol: symbol.to_string(),
            })?;
        entries.push((symbol.to_string(), pct * base_price * shares * value_ratio));
    }
    Ok(ReturnSeries::new(entries))
}

/// `price[date] / price[first] - 1` for every date and symbol.
pub fn cumulative_return(prices: &PriceMatrix) -> Result<CumulativeReturns, ReportError> {
    let first = adj_close(prices, 0)?;
    if let Some(i) = first.iter().position(|p| p.is_zero()) {
        return Err(ReportError::DivisionByZero {
            symbol: prices.symbols()[i].clone(),
        });
    }

    let rows = (0..prices.date_count())
        .map(|d| {
            adj_close(prices, d).map(|row| {
                row.iter()
                    .zip(first)
                    .map(|(&p, &p0)| p / p0 - Decimal::ONE)
                    .collect()
            })
        })
        .collect::<Result<Vec<Vec<Decimal>>, ReportError>>()?;

    Ok(CumulativeReturns {
        dates: prices.dates().to_vec(),
        symbols: prices.symbols().to_vec(),
        rows,
    })
}

fn adj_close(prices: &PriceMatrix, date_idx: usize) -> Result<&[Decimal], ReportError> {
    prices.adj_close_row(date_idx).ok_or_else(|| {
        ReportError::InvalidPriceMatrix(format!("no adj_close row at index {}", date_idx))
    })
}
