use chrono::{DateTime, FixedOffset};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::utils::bar_datetime;

use super::request::{RequestOutcome, SymbolResponse};

/// Aggregates payload as the provider sends it, bars keyed by short codes.
#[derive(Debug, Deserialize)]
struct AggregatePayload {
    #[serde(rename = "resultsCount", default)]
    results_count: u64,
    #[serde(default)]
    results: Vec<RawBar>,
}

#[derive(Debug, Deserialize)]
struct RawBar {
    o: f64,
    h: f64,
    l: f64,
    c: f64,
    v: f64,
    vw: Option<f64>,
    n: Option<u64>,
    t: i64,
}

/// One bar in the canonical schema. Serialized column names match the
/// normalized table contract verbatim.
#[derive(Debug, Clone, Serialize)]
pub struct Bar {
    #[serde(rename = "Open")]
    pub open: f64,
    #[serde(rename = "High")]
    pub high: f64,
    #[serde(rename = "Low")]
    pub low: f64,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "Volume")]
    pub volume: f64,
    /// Volume-weighted average price; not every provider supplies it.
    #[serde(rename = "Volume weighted")]
    pub volume_weighted: Option<f64>,
    /// Number of transactions aggregated into the bar window.
    #[serde(rename = "Window Agg Transactions")]
    pub transactions: Option<u64>,
    /// Provider timestamp in epoch milliseconds.
    #[serde(rename = "Timestamp")]
    pub timestamp: i64,
    /// Derived from the timestamp; UTC unless local rendering was requested.
    #[serde(rename = "Datetime")]
    pub datetime: DateTime<FixedOffset>,
}

/// Canonical table for one symbol, built fresh per fetch call.
#[derive(Debug, Clone, Serialize)]
pub struct NormalizedSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

/// Reshape raw per-symbol responses into canonical series.
///
/// Every 200 response with a non-empty result set yields exactly one series;
/// everything else is dropped from the output with a `warn` log. Callers diff
/// requested against returned symbols to detect partial failure.
pub(crate) fn normalize_responses(
    responses: &[SymbolResponse],
    local_timezone: bool,
) -> Vec<NormalizedSeries> {
    let mut series = Vec::with_capacity(responses.len());

    for response in responses {
        match &response.outcome {
            RequestOutcome::Success { status, body } if *status == StatusCode::OK => {
                match AggregatePayload::deserialize(body) {
                    Ok(payload) if payload.results_count > 0 && !payload.results.is_empty() => {
                        let bars = payload
                            .results
                            .iter()
                            .filter_map(|raw| canonical_bar(raw, local_timezone))
                            .collect();
                        series.push(NormalizedSeries {
                            symbol: response.symbol.clone(),
                            bars,
                        });
                    }
                    Ok(_) => {
                        log::warn!("dropping {}: aggregates payload has no rows", response.symbol)
                    }
                    Err(err) => log::warn!(
                        "dropping {}: unexpected aggregates payload: {}",
                        response.symbol,
                        err
                    ),
                }
            }
            RequestOutcome::Success { status, .. } => {
                log::warn!("dropping {}: provider returned {}", response.symbol, status)
            }
            RequestOutcome::Transport { detail } => {
                log::warn!("dropping {}: transport failure: {}", response.symbol, detail)
            }
            RequestOutcome::Malformed { detail } => {
                log::warn!("dropping {}: malformed response: {}", response.symbol, detail)
            }
        }
    }

    series
}

fn canonical_bar(raw: &RawBar, local_timezone: bool) -> Option<Bar> {
    let datetime = match bar_datetime(raw.t, local_timezone) {
        Some(datetime) => datetime,
        None => {
            log::warn!("skipping bar with out-of-range timestamp {}", raw.t);
            return None;
        }
    };

    Some(Bar {
        open: raw.o,
        high: raw.h,
        low: raw.l,
        close: raw.c,
        volume: raw.v,
        volume_weighted: raw.vw,
        transactions: raw.n,
        timestamp: raw.t,
        datetime,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn success(symbol: &str, status: u16, body: serde_json::Value) -> SymbolResponse {
        SymbolResponse {
            symbol: symbol.to_string(),
            outcome: RequestOutcome::Success {
                status: StatusCode::from_u16(status).unwrap(),
                body,
            },
        }
    }

    fn aapl_payload() -> serde_json::Value {
        json!({
            "ticker": "AAPL",
            "status": "OK",
            "adjusted": false,
            "resultsCount": 2,
            "results": [
                {"v": 1000.0, "vw": 150.2, "o": 150.0, "c": 151.0,
                 "h": 152.0, "l": 149.5, "t": 1_660_000_000_000i64, "n": 42},
                {"v": 900.0, "vw": 151.1, "o": 151.0, "c": 150.5,
                 "h": 151.5, "l": 150.0, "t": 1_660_003_600_000i64, "n": 37}
            ]
        })
    }

    #[test]
    fn renames_short_codes_to_canonical_fields() {
        let series = normalize_responses(&[success("AAPL", 200, aapl_payload())], false);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].symbol, "AAPL");
        let bar = &series[0].bars[0];
        assert!((bar.open - 150.0).abs() < 1e-9);
        assert!((bar.high - 152.0).abs() < 1e-9);
        assert!((bar.low - 149.5).abs() < 1e-9);
        assert!((bar.close - 151.0).abs() < 1e-9);
        assert!((bar.volume - 1000.0).abs() < 1e-9);
        assert_eq!(bar.volume_weighted, Some(150.2));
        assert_eq!(bar.transactions, Some(42));
        assert_eq!(bar.timestamp, 1_660_000_000_000);
    }

    #[test]
    fn datetime_derives_from_epoch_millis_in_utc() {
        let series = normalize_responses(&[success("AAPL", 200, aapl_payload())], false);
        let bar = &series[0].bars[0];
        assert_eq!(bar.datetime.to_rfc3339(), "2022-08-08T23:06:40+00:00");
    }

    #[test]
    fn missing_optional_fields_stay_none() {
        let payload = json!({
            "resultsCount": 1,
            "results": [
                {"v": 10.0, "o": 1.0, "c": 2.0, "h": 3.0, "l": 0.5, "t": 1_660_000_000_000i64}
            ]
        });
        let series = normalize_responses(&[success("X", 200, payload)], false);
        assert_eq!(series[0].bars[0].volume_weighted, None);
        assert_eq!(series[0].bars[0].transactions, None);
    }

    #[test]
    fn non_200_and_failed_outcomes_are_dropped() {
        let responses = vec![
            success("AAPL", 200, aapl_payload()),
            success("MISS", 404, json!({"status": "NOT_FOUND"})),
            SymbolResponse {
                symbol: "DOWN".to_string(),
                outcome: RequestOutcome::Transport {
                    detail: "connection refused".to_string(),
                },
            },
            SymbolResponse {
                symbol: "HTML".to_string(),
                outcome: RequestOutcome::Malformed {
                    detail: "response body is not valid JSON".to_string(),
                },
            },
        ];

        let series = normalize_responses(&responses, false);
        let symbols: Vec<&str> = series.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, ["AAPL"]);
    }

    #[test]
    fn zero_row_payloads_are_dropped() {
        let payload = json!({"status": "OK", "resultsCount": 0, "results": []});
        let series = normalize_responses(&[success("EMPT", 200, payload)], false);
        assert!(series.is_empty());
    }

    #[test]
    fn serialized_bar_uses_canonical_column_names() {
        let series = normalize_responses(&[success("AAPL", 200, aapl_payload())], false);
        let row = serde_json::to_value(&series[0].bars[0]).unwrap();
        let mut columns: Vec<String> = row.as_object().unwrap().keys().cloned().collect();
        columns.sort();

        let mut expected = vec![
            "Open",
            "High",
            "Low",
            "Close",
            "Volume",
            "Volume weighted",
            "Window Agg Transactions",
            "Timestamp",
            "Datetime",
        ];
        expected.sort_unstable();
        assert_eq!(columns, expected);
    }
}
