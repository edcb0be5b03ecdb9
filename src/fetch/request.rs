use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::{Error, Result};

/// HTTP method for one provider request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// Outcome of one provider request. Failure classes stay distinguishable so
/// callers can tell a dead connection from a garbled payload.
#[derive(Debug, Clone)]
pub enum RequestOutcome {
    Success { status: StatusCode, body: Value },
    Transport { detail: String },
    Malformed { detail: String },
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success { .. })
    }
}

/// One per requested symbol; lives for the duration of a single fetch call.
#[derive(Debug, Clone)]
pub struct SymbolResponse {
    pub symbol: String,
    pub outcome: RequestOutcome,
}

pub(crate) struct RequestParts<'a> {
    pub base_url: &'a str,
    pub endpoint: &'a str,
    pub method: HttpMethod,
    pub headers: Option<HeaderMap>,
    pub query: Option<&'a [(&'a str, String)]>,
    pub body: Option<&'a Value>,
}

/// Execute one request against a provider, tagging the result with the symbol
/// it represents. Blank base URL, endpoint or symbol fails closed before any
/// network activity; network and decode failures are returned in-band as
/// [`RequestOutcome`] variants, never as `Err`.
pub(crate) async fn execute(
    client: &Client,
    parts: RequestParts<'_>,
    symbol: &str,
) -> Result<SymbolResponse> {
    for (name, value) in [
        ("base_url", parts.base_url),
        ("endpoint", parts.endpoint),
        ("symbol", symbol),
    ] {
        if value.trim().is_empty() {
            return Err(Error::MissingArgument(name));
        }
    }

    let url = format!("{}{}", parts.base_url, parts.endpoint);
    let mut builder = match parts.method {
        HttpMethod::Get => client.get(&url),
        HttpMethod::Post => client.post(&url),
        HttpMethod::Put => client.put(&url),
        HttpMethod::Delete => client.delete(&url),
    };

    if let Some(headers) = parts.headers {
        builder = builder.headers(headers);
    }
    if let Some(query) = parts.query {
        builder = builder.query(query);
    }
    if let Some(body) = parts.body {
        builder = builder.json(body);
    }

    let response = match builder.send().await {
        Ok(response) => response,
        Err(err) => {
            return Ok(SymbolResponse {
                symbol: symbol.to_string(),
                outcome: RequestOutcome::Transport {
                    detail: err.to_string(),
                },
            })
        }
    };

    let status = response.status();
    let text = match response.text().await {
        Ok(text) => text,
        // Headers arrived, so the response itself is what is broken.
        Err(err) => {
            return Ok(SymbolResponse {
                symbol: symbol.to_string(),
                outcome: RequestOutcome::Malformed {
                    detail: format!("failed to read response body: {}", err),
                },
            })
        }
    };

    let outcome = match serde_json::from_str::<Value>(&text) {
        Ok(body) => RequestOutcome::Success { status, body },
        Err(err) => RequestOutcome::Malformed {
            detail: format!("response body is not valid JSON: {}", err),
        },
    };

    Ok(SymbolResponse {
        symbol: symbol.to_string(),
        outcome,
    })
}
