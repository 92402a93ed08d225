use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{debug, info};

use super::DailyBar;

/// Decimal places kept from Yahoo's float prices
const PRICE_DP: u32 = 6;

/// Yahoo Finance chart response
#[derive(Debug, Deserialize)]
pub(crate) struct YahooChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    /// Exchange offset from UTC in seconds
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Option<Vec<Option<f64>>>,
    high: Option<Vec<Option<f64>>>,
    low: Option<Vec<Option<f64>>>,
    close: Option<Vec<Option<f64>>>,
    volume: Option<Vec<Option<i64>>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: String,
    description: String,
}

/// HTTP client used for all chart downloads, optionally through a proxy
pub fn build_client(proxy: Option<&str>) -> Result<Client> {
    let mut builder = Client::builder().user_agent("Mozilla/5.0 (compatible; MarketReport/1.0)");
    if let Some(url) = proxy {
        builder = builder.proxy(
            reqwest::Proxy::all(url).with_context(|| format!("Invalid proxy URL {}", url))?,
        );
    }
    Ok(builder.build()?)
}

/// Fetch daily bars from Yahoo Finance
///
/// # Arguments
/// * `symbol` - Ticker symbol as Yahoo lists it (e.g. `AAPL`, `PETR4.SA`)
/// * `from` - Start date
/// * `to` - End date
pub async fn fetch_daily_bars(
    client: &Client,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyBar>> {
    info!(
        "Fetching historical prices for {} from {} to {}",
        symbol, from, to
    );

    // Convert dates to Unix timestamps
    let from_timestamp = from
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid from date"))?
        .and_utc()
        .timestamp();

    let to_timestamp = to
        .and_hms_opt(23, 59, 59)
        .ok_or_else(|| anyhow!("Invalid to date"))?
        .and_utc()
        .timestamp();

    let url = format!(
        "https://query1.finance.yahoo.com/v8/finance/chart/{}?period1={}&period2={}&interval=1d&events=div%2Csplit",
        symbol, from_timestamp, to_timestamp
    );

    let response = client
        .get(&url)
        .send()
        .await
        .context("Failed to send request to Yahoo Finance")?;

    if !response.status().is_success() {
        return Err(anyhow!(
            "Yahoo Finance returned error status: {}",
            response.status()
        ));
    }

    let data: YahooChartResponse = response
        .json()
        .await
        .context("Failed to parse Yahoo Finance response")?;

    let bars = parse_chart(data)?;
    debug!("Fetched {} daily bars for {}", bars.len(), symbol);
    Ok(bars)
}

fn to_decimal(v: f64) -> Option<Decimal> {
    Decimal::from_f64_retain(v).map(|d| d.round_dp(PRICE_DP).normalize())
}

/// Turn a chart response into bars. Days without a close (Yahoo reports
/// nulls for halted sessions) are skipped.
pub(crate) fn parse_chart(data: YahooChartResponse) -> Result<Vec<DailyBar>> {
    if let Some(error) = data.chart.error {
        return Err(anyhow!(
            "Yahoo Finance API error: {} - {}",
            error.code,
            error.description
        ));
    }

    let result = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| anyhow!("No data returned from Yahoo Finance"))?;

    let timestamps = result.timestamp.unwrap_or_default();
    // Session dates are local to the exchange
    let gmtoffset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("No quote data"))?;

    let opens = quote.open.unwrap_or_default();
    let highs = quote.high.unwrap_or_default();
    let lows = quote.low.unwrap_or_default();
    let closes = quote.close.ok_or_else(|| anyhow!("No close prices"))?;
    let volumes = quote.volume.unwrap_or_default();
    // Without an adjusted series (no dividends/splits), adjusted close == close
    let adj_closes = result
        .indicators
        .adjclose
        .and_then(|a| a.into_iter().next())
        .and_then(|a| a.adjclose);

    let mut bars = Vec::with_capacity(timestamps.len());

    for (i, &timestamp) in timestamps.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(timestamp + gmtoffset, 0)
            .ok_or_else(|| anyhow!("Invalid timestamp"))?
            .date_naive();

        let Some(close) = closes.get(i).and_then(|&v| v).and_then(to_decimal) else {
            debug!("Skipping {}: no close price", date);
            continue;
        };
        let adj_close = match adj_closes {
            Some(ref adj) => match adj.get(i).and_then(|&v| v).and_then(to_decimal) {
                Some(a) => a,
                None => {
                    debug!("Skipping {}: no adjusted close", date);
                    continue;
                }
            },
            None => close,
        };

        bars.push(DailyBar {
            date,
            open: opens.get(i).and_then(|&v| v).and_then(to_decimal),
            high: highs.get(i).and_then(|&v| v).and_then(to_decimal),
            low: lows.get(i).and_then(|&v| v).and_then(to_decimal),
            close,
            adj_close,
            volume: volumes.get(i).and_then(|&v| v),
        });
    }

    // Intraday timestamps can repeat the last session's date
    bars.dedup_by(|b, a| a.date == b.date);
    Ok(bars)
}
