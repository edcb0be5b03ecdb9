use std::time::Duration;

use futures::future;
use reqwest::Client;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::utils::date_range;

use super::normalize::{self, NormalizedSeries};
use super::request::{execute, HttpMethod, RequestParts, SymbolResponse};
use super::{FetchRequest, IntervalUnit, Source, POLYGON_AGGS_ENDPOINT, POLYGON_BASE_URL};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch aggregate bars for every requested symbol and return the raw
/// per-symbol outcomes, in input order. Per-symbol failures are carried
/// in-band; only input validation and key resolution return `Err`.
pub async fn fetch_raw(request: &FetchRequest, settings: &Settings) -> Result<Vec<SymbolResponse>> {
    fetch_raw_against(request, settings, POLYGON_BASE_URL).await
}

/// Fetch aggregate bars and normalize them into the canonical schema.
///
/// Symbols whose request failed or returned no rows are dropped from the
/// returned list (with a `warn` log); the returned symbol set is always a
/// subset of the requested one. Use [`fetch_raw`] to see every outcome.
pub async fn fetch(request: &FetchRequest, settings: &Settings) -> Result<Vec<NormalizedSeries>> {
    fetch_against(request, settings, POLYGON_BASE_URL).await
}

pub(crate) async fn fetch_against(
    request: &FetchRequest,
    settings: &Settings,
    base_url: &str,
) -> Result<Vec<NormalizedSeries>> {
    let responses = fetch_raw_against(request, settings, base_url).await?;
    Ok(normalize::normalize_responses(
        &responses,
        request.local_timezone,
    ))
}

pub(crate) async fn fetch_raw_against(
    request: &FetchRequest,
    settings: &Settings,
    base_url: &str,
) -> Result<Vec<SymbolResponse>> {
    request.tickers.validate()?;
    if request.source != Source::Polygon {
        return Err(Error::InvalidSource);
    }
    let api_key = settings.resolve_api_key(request.api_key.as_deref())?;

    let (start, end) = date_range(request.period_days);
    let endpoints: Vec<String> = request
        .tickers
        .symbols()
        .iter()
        .map(|symbol| {
            aggs_endpoint(
                symbol,
                request.interval,
                request.interval_unit,
                &start,
                &end,
            )
        })
        .collect();

    let query: Vec<(&str, String)> = vec![
        ("adjusted", "false".to_string()),
        ("limit", "50000".to_string()),
        ("sort", "asc".to_string()),
        ("apiKey", api_key),
    ];

    // One shared client per batch, dropped when the batch completes.
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

    let calls = request
        .tickers
        .symbols()
        .iter()
        .zip(&endpoints)
        .map(|(symbol, endpoint)| {
            execute(
                &client,
                RequestParts {
                    base_url,
                    endpoint,
                    method: HttpMethod::Get,
                    headers: None,
                    query: Some(&query),
                    body: None,
                },
                symbol,
            )
        });

    // join_all launches everything at once, waits for all to finish and keeps
    // the output aligned with the input symbol order.
    future::join_all(calls).await.into_iter().collect()
}

fn aggs_endpoint(
    symbol: &str,
    interval: u32,
    interval_unit: IntervalUnit,
    start: &str,
    end: &str,
) -> String {
    format!(
        "{}{}/range/{}/{}/{}/{}",
        POLYGON_AGGS_ENDPOINT,
        symbol,
        interval,
        interval_unit.as_str(),
        start,
        end
    )
}
