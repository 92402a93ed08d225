//! Typed daily price matrix
//!
//! A `PriceMatrix` is an ordered sequence of trading dates crossed with a set
//! of instrument symbols, holding one value per named field in every cell.
//! All shape checks happen in the constructor so that accessors never have to
//! deal with ragged or unordered data.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::error::ReportError;

/// Named numeric field of a daily bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
    AdjClose,
    Volume,
}

impl PriceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceField::Open => "open",
            PriceField::High => "high",
            PriceField::Low => "low",
            PriceField::Close => "close",
            PriceField::AdjClose => "adj_close",
            PriceField::Volume => "volume",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily prices indexed by date (rows), symbol (columns) and field.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceMatrix {
    dates: Vec<NaiveDate>,
    symbols: Vec<String>,
    /// field -> rows[date_idx][symbol_idx]
    values: BTreeMap<PriceField, Vec<Vec<Decimal>>>,
}

impl PriceMatrix {
    /// Build a matrix from per-field tables laid out as `rows[date][symbol]`,
    /// with columns in the order of `symbols`.
    ///
    /// Symbols are re-ordered ascending so every derived series comes out
    /// in a reproducible order.
    pub fn new(
        dates: Vec<NaiveDate>,
        symbols: Vec<String>,
        values: BTreeMap<PriceField, Vec<Vec<Decimal>>>,
    ) -> Result<Self, ReportError> {
        if dates.is_empty() {
            return Err(ReportError::InvalidPriceMatrix("no dates".to_string()));
        }
        if symbols.is_empty() {
            return Err(ReportError::InvalidPriceMatrix("no symbols".to_string()));
        }
        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ReportError::InvalidPriceMatrix(format!(
                "dates must be strictly ascending ({} followed by {})",
                w[0], w[1]
            )));
        }

        let mut seen = HashSet::new();
        for symbol in &symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(ReportError::InvalidPriceMatrix(format!(
                    "duplicate symbol {}",
                    symbol
                )));
            }
        }

        if !values.contains_key(&PriceField::AdjClose) {
            return Err(ReportError::InvalidPriceMatrix(
                "missing adj_close field".to_string(),
            ));
        }

        for (field, rows) in &values {
            if rows.len() != dates.len() {
                return Err(ReportError::InvalidPriceMatrix(format!(
                    "{} has {} rows, expected {}",
                    field,
                    rows.len(),
                    dates.len()
                )));
            }
            for (row, date) in rows.iter().zip(&dates) {
                if row.len() != symbols.len() {
                    return Err(ReportError::InvalidPriceMatrix(format!(
                        "{} on {} has {} values, expected {}",
                        field,
                        date,
                        row.len(),
                        symbols.len()
                    )));
                }
                if let Some(v) = row.iter().find(|v| v.is_sign_negative() && !v.is_zero()) {
                    return Err(ReportError::InvalidPriceMatrix(format!(
                        "negative {} {} on {}",
                        field, v, date
                    )));
                }
            }
        }

        // Sort columns by symbol
        let mut order: Vec<usize> = (0..symbols.len()).collect();
        order.sort_by(|&a, &b| symbols[a].cmp(&symbols[b]));
        let sorted_symbols = order.iter().map(|&i| symbols[i].clone()).collect();
        let values = values
            .into_iter()
            .map(|(field, rows)| {
                let rows = rows
                    .into_iter()
                    .map(|row| order.iter().map(|&i| row[i]).collect())
                    .collect();
                (field, rows)
            })
            .collect();

        Ok(Self {
            dates,
            symbols: sorted_symbols,
            values,
        })
    }

    /// Convenience constructor for a matrix holding only adjusted closes,
    /// given as one price column per symbol.
    pub fn from_adj_close(
        dates: Vec<NaiveDate>,
        columns: BTreeMap<String, Vec<Decimal>>,
    ) -> Result<Self, ReportError> {
        let symbols: Vec<String> = columns.keys().cloned().collect();
        for (symbol, column) in &columns {
            if column.len() != dates.len() {
                return Err(ReportError::InvalidPriceMatrix(format!(
                    "{} has {} prices, expected {}",
                    symbol,
                    column.len(),
                    dates.len()
                )));
            }
        }
        let rows = (0..dates.len())
            .map(|d| columns.values().map(|c| c[d]).collect())
            .collect();
        let mut values = BTreeMap::new();
        values.insert(PriceField::AdjClose, rows);
        Self::new(dates, symbols, values)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn date_count(&self) -> usize {
        self.dates.len()
    }

    pub fn latest_date(&self) -> NaiveDate {
        // Constructor guarantees at least one date
        self.dates[self.dates.len() - 1]
    }

    pub fn fields(&self) -> impl Iterator<Item = PriceField> + '_ {
        self.values.keys().copied()
    }

    pub fn symbol_index(&self, symbol: &str) -> Option<usize> {
        self.symbols
            .binary_search_by(|s| s.as_str().cmp(symbol))
            .ok()
    }

    /// Single cell lookup
    pub fn get(&self, field: PriceField, date_idx: usize, symbol: &str) -> Option<Decimal> {
        let col = self.symbol_index(symbol)?;
        self.values
            .get(&field)?
            .get(date_idx)
            .map(|row| row[col])
    }

    /// All symbols' values for one date, in symbol order
    pub fn row(&self, field: PriceField, date_idx: usize) -> Option<&[Decimal]> {
        self.values
            .get(&field)?
            .get(date_idx)
            .map(|row| row.as_slice())
    }

    /// One symbol's values across all dates
    pub fn column(&self, field: PriceField, symbol: &str) -> Option<Vec<Decimal>> {
        let col = self.symbol_index(symbol)?;
        let rows = self.values.get(&field)?;
        Some(rows.iter().map(|row| row[col]).collect())
    }

    /// Shorthand for the adjusted close row used by every return calculation
    pub fn adj_close_row(&self, date_idx: usize) -> Option<&[Decimal]> {
        self.row(PriceField::AdjClose, date_idx)
    }
}
