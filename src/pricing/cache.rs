//! On-disk price cache: one CSV file of daily bars per symbol.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::DailyBar;

pub const HEADER: [&str; 7] = ["date", "open", "high", "low", "close", "adj_close", "volume"];

/// `<dir>/<SYMBOL>.csv`
pub fn cache_path(dir: &Path, symbol: &str) -> PathBuf {
    dir.join(format!("{}.csv", symbol))
}

#[derive(Debug)]
struct CsvColumnMapping {
    date: usize,
    open: Option<usize>,
    high: Option<usize>,
    low: Option<usize>,
    close: Option<usize>,
    adj_close: usize,
    volume: Option<usize>,
}

fn find_columns(headers: &StringRecord) -> Result<CsvColumnMapping> {
    let find = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };

    Ok(CsvColumnMapping {
        date: find("date").ok_or_else(|| anyhow!("Missing 'date' column"))?,
        open: find("open"),
        high: find("high"),
        low: find("low"),
        close: find("close"),
        adj_close: find("adj_close").ok_or_else(|| anyhow!("Missing 'adj_close' column"))?,
        volume: find("volume"),
    })
}

fn optional_decimal(record: &StringRecord, idx: Option<usize>) -> Result<Option<Decimal>> {
    match idx.and_then(|i| record.get(i)).map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Ok(Some(
            Decimal::from_str(s).with_context(|| format!("Invalid number '{}'", s))?,
        )),
    }
}

fn parse_record(record: &StringRecord, columns: &CsvColumnMapping) -> Result<DailyBar> {
    let date_str = record.get(columns.date).unwrap_or("").trim();
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}'", date_str))?;
    let adj_close = optional_decimal(record, Some(columns.adj_close))?
        .ok_or_else(|| anyhow!("Missing adj_close on {}", date))?;
    let close = optional_decimal(record, columns.close)?.unwrap_or(adj_close);
    let volume = match columns.volume.and_then(|i| record.get(i)).map(str::trim) {
        None | Some("") => None,
        Some(s) => Some(
            s.parse::<i64>()
                .with_context(|| format!("Invalid volume '{}'", s))?,
        ),
    };

    Ok(DailyBar {
        date,
        open: optional_decimal(record, columns.open)?,
        high: optional_decimal(record, columns.high)?,
        low: optional_decimal(record, columns.low)?,
        close,
        adj_close,
        volume,
    })
}

/// Read cached bars, sorted by date
pub fn read_bars(path: &Path) -> Result<Vec<DailyBar>> {
    debug!("Reading price cache {:?}", path);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open price cache {:?}", path))?;

    let headers = reader
        .headers()
        .context("Failed to read CSV headers")?
        .clone();
    let columns = find_columns(&headers).with_context(|| format!("Bad header in {:?}", path))?;

    let mut bars = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read {:?}", path))?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        // +2: header line and 1-based numbering
        let bar = parse_record(&record, &columns)
            .with_context(|| format!("{:?} line {}", path, line + 2))?;
        bars.push(bar);
    }

    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    Ok(bars)
}

/// Overwrite the cache file with `bars`
pub fn write_bars(path: &Path, bars: &[DailyBar]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache directory {:?}", parent))?;
    }

    let mut writer = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("Failed to create price cache {:?}", path))?;
    writer.write_record(HEADER)?;

    let opt = |d: Option<Decimal>| d.map(|v| v.to_string()).unwrap_or_default();
    for bar in bars {
        writer.write_record([
            bar.date.format("%Y-%m-%d").to_string(),
            opt(bar.open),
            opt(bar.high),
            opt(bar.low),
            bar.close.to_string(),
            bar.adj_close.to_string(),
            bar.volume.map(|v| v.to_string()).unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    info!("Cached {} bars in {:?}", bars.len(), path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn bar(day: u32, adj: Decimal) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            open: Some(dec!(10.5)),
            high: None,
            low: None,
            close: adj + dec!(1),
            adj_close: adj,
            volume: Some(1200),
        }
    }

    #[test]
    fn test_written_cache_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = cache_path(dir.path(), "MSFT");
        let bars = vec![bar(4, dec!(400.25)), bar(5, dec!(401))];

        write_bars(&path, &bars).unwrap();
        assert_eq!(path.file_name().unwrap(), "MSFT.csv");

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("date,open,high,low,close,adj_close,volume\n"));
        assert!(text.contains("2024-03-04,10.5,,,401.25,400.25,1200\n"));

        assert_eq!(read_bars(&path).unwrap(), bars);
    }

    #[test]
    fn test_read_minimal_columns_sorts_by_date() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("X.csv");
        std::fs::write(&path, "date,adj_close\n2024-03-05,2\n2024-03-04,1\n\n").unwrap();

        let bars = read_bars(&path).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].adj_close, dec!(1));
        assert_eq!(bars[0].close, dec!(1));
        assert_eq!(bars[1].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(bars[1].volume, None);
    }

    #[test]
    fn test_missing_adj_close_column() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("X.csv");
        std::fs::write(&path, "date,close\n2024-03-05,2\n").unwrap();

        let err = read_bars(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("adj_close"));
    }

    #[test]
    fn test_bad_number_reports_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("X.csv");
        std::fs::write(&path, "date,adj_close\n2024-03-04,1\n2024-03-05,abc\n").unwrap();

        let err = read_bars(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("line 3"));
    }
}
