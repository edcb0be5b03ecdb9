use std::io::Cursor;
use std::time::Duration;

use chrono::{NaiveDate, TimeZone, Utc};
use reqwest::blocking::Client;

use crate::error::{Context, Error, Result};
use crate::utils::{bar_datetime, epoch_range};

use super::normalize::{Bar, NormalizedSeries};
use super::{FetchRequest, IntervalUnit, Source, YAHOO_BASE_URL, YAHOO_DOWNLOAD_ENDPOINT};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Synchronous history download from the quote service.
///
/// One blocking CSV request per requested symbol, issued sequentially; each
/// symbol that yields rows becomes one series, and symbols that fail or come
/// back empty are dropped with a `warn`, matching the aggregates contract.
///
/// Uses a blocking client, so this must not be called from inside an async
/// runtime; spawn it on a separate thread instead.
pub fn download(request: &FetchRequest) -> Result<Vec<NormalizedSeries>> {
    download_against(request, YAHOO_BASE_URL)
}

pub(crate) fn download_against(
    request: &FetchRequest,
    base_url: &str,
) -> Result<Vec<NormalizedSeries>> {
    request.tickers.validate()?;
    if request.source != Source::Yahoo {
        return Err(Error::InvalidSource);
    }
    let interval = quote_interval_code(request.interval, request.interval_unit)?;
    let (start, end) = epoch_range(request.period_days);

    let client = Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .context("Failed to construct quote download HTTP client")?;

    let mut series = Vec::with_capacity(request.tickers.symbols().len());
    for symbol in request.tickers.symbols() {
        match download_symbol(
            &client,
            base_url,
            symbol,
            &interval,
            start,
            end,
            request.local_timezone,
        ) {
            Ok(entry) => series.push(entry),
            Err(err) => log::warn!("dropping {}: {}", symbol, err),
        }
    }

    Ok(series)
}

fn download_symbol(
    client: &Client,
    base_url: &str,
    symbol: &str,
    interval: &str,
    start: i64,
    end: i64,
    local_timezone: bool,
) -> Result<NormalizedSeries> {
    let url = format!("{}{}{}", base_url, YAHOO_DOWNLOAD_ENDPOINT, symbol);

    let response = client
        .get(&url)
        .query(&[
            ("period1", start.to_string()),
            ("period2", end.to_string()),
            ("interval", interval.to_string()),
            ("events", "history".to_string()),
        ])
        .send()
        .with_context(|| format!("History download request failed for {}", symbol))?;

    if !response.status().is_success() {
        return Err(Error::message(format!(
            "history download for {} failed with status {}",
            symbol,
            response.status()
        )));
    }

    let body = response
        .text()
        .with_context(|| format!("Failed to read history body for {}", symbol))?;

    let bars = parse_history_csv(&body, local_timezone)?;
    if bars.is_empty() {
        return Err(Error::message(format!("no history rows for {}", symbol)));
    }

    Ok(NormalizedSeries {
        symbol: symbol.to_string(),
        bars,
    })
}

/// Parse a quote-service history CSV (Date,Open,High,Low,Close,Adj Close,
/// Volume) into canonical bars. Rows with missing or "null" fields are
/// skipped. Columns the provider does not supply stay `None`.
fn parse_history_csv(body: &str, local_timezone: bool) -> Result<Vec<Bar>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(body));

    let mut bars = Vec::new();
    for result in reader.records() {
        let record = result?;

        let date_str = match record.get(0) {
            Some(value) if !value.is_empty() && value != "null" => value,
            _ => continue,
        };

        let parse_number = |idx: usize| -> Option<f64> {
            record
                .get(idx)
                .and_then(|field| field.trim().parse::<f64>().ok())
        };

        let Some(open) = parse_number(1) else {
            continue;
        };
        let Some(high) = parse_number(2) else {
            continue;
        };
        let Some(low) = parse_number(3) else {
            continue;
        };
        let Some(close) = parse_number(4) else {
            continue;
        };
        let Some(volume) = parse_number(6) else {
            continue;
        };

        let date = match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => continue,
        };
        let Some(naive) = date.and_hms_opt(0, 0, 0) else {
            continue;
        };
        let timestamp = Utc.from_utc_datetime(&naive).timestamp_millis();
        let Some(datetime) = bar_datetime(timestamp, local_timezone) else {
            continue;
        };

        bars.push(Bar {
            open,
            high,
            low,
            close,
            volume,
            volume_weighted: None,
            transactions: None,
            timestamp,
            datetime,
        });
    }

    Ok(bars)
}

/// Map a bar interval to the quote service's wire code. Combinations the
/// service cannot express are rejected before any request goes out.
fn quote_interval_code(interval: u32, interval_unit: IntervalUnit) -> Result<String> {
    let code = match (interval_unit, interval) {
        (IntervalUnit::Minute, 1 | 2 | 5 | 15 | 30 | 60 | 90) => format!("{}m", interval),
        (IntervalUnit::Hour, 1) => "1h".to_string(),
        (IntervalUnit::Day, 1) => "1d".to_string(),
        (IntervalUnit::Day, 5) => "5d".to_string(),
        (IntervalUnit::Week, 1) => "1wk".to_string(),
        (IntervalUnit::Month, 1) => "1mo".to_string(),
        (IntervalUnit::Month, 3) => "3mo".to_string(),
        _ => return Err(Error::InvalidInterval),
    };
    Ok(code)
}
