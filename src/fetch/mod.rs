use crate::error::{Error, Result};

pub mod aggregates;
pub mod download;
pub mod normalize;
pub mod request;

pub use aggregates::{fetch, fetch_raw};
pub use download::download;
pub use normalize::{Bar, NormalizedSeries};
pub use request::{HttpMethod, RequestOutcome, SymbolResponse};

pub const POLYGON_BASE_URL: &str = "https://api.polygon.io/";
pub const POLYGON_AGGS_ENDPOINT: &str = "v2/aggs/ticker/";
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com/";
pub const YAHOO_DOWNLOAD_ENDPOINT: &str = "v7/finance/download/";

/// Upstream data provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// REST aggregates API, one request per symbol, async fan-out.
    Polygon,
    /// Consumer quote service, synchronous CSV history download.
    Yahoo,
}

/// Unit of the aggregate bar interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl IntervalUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalUnit::Minute => "minute",
            IntervalUnit::Hour => "hour",
            IntervalUnit::Day => "day",
            IntervalUnit::Week => "week",
            IntervalUnit::Month => "month",
            IntervalUnit::Year => "year",
        }
    }
}

/// One symbol or a list of them.
#[derive(Debug, Clone)]
pub struct Ticker(Vec<String>);

impl Ticker {
    pub fn symbols(&self) -> &[String] {
        &self.0
    }

    /// Empty lists and blank symbols are the invalid ticker inputs still
    /// representable once the type system has ruled out everything else.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.0.is_empty() {
            return Err(Error::InvalidTicker);
        }
        if self.0.iter().any(|symbol| symbol.trim().is_empty()) {
            return Err(Error::InvalidTicker);
        }
        Ok(())
    }
}

impl From<&str> for Ticker {
    fn from(symbol: &str) -> Self {
        Ticker(vec![symbol.to_string()])
    }
}

impl From<String> for Ticker {
    fn from(symbol: String) -> Self {
        Ticker(vec![symbol])
    }
}

impl From<Vec<String>> for Ticker {
    fn from(symbols: Vec<String>) -> Self {
        Ticker(symbols)
    }
}

impl From<&[&str]> for Ticker {
    fn from(symbols: &[&str]) -> Self {
        Ticker(symbols.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Ticker {
    fn from(symbols: [&str; N]) -> Self {
        Ticker(symbols.iter().map(|s| s.to_string()).collect())
    }
}

/// Immutable input to one fetch call.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub tickers: Ticker,
    pub source: Source,
    /// Lookback window in days ending at request time.
    pub period_days: u32,
    /// Bar interval value, e.g. 60 with [`IntervalUnit::Minute`].
    pub interval: u32,
    pub interval_unit: IntervalUnit,
    /// Overrides any key carried by [`crate::Settings`] when set.
    pub api_key: Option<String>,
    /// Render the derived Datetime column in the machine's local zone.
    pub local_timezone: bool,
}

impl FetchRequest {
    pub fn new<T: Into<Ticker>>(tickers: T, source: Source, period_days: u32, interval: u32) -> Self {
        Self {
            tickers: tickers.into(),
            source,
            period_days,
            interval,
            interval_unit: IntervalUnit::Minute,
            api_key: None,
            local_timezone: false,
        }
    }

    pub fn with_interval_unit(mut self, interval_unit: IntervalUnit) -> Self {
        self.interval_unit = interval_unit;
        self
    }

    pub fn with_api_key<T: Into<String>>(mut self, api_key: T) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_local_timezone(mut self, local_timezone: bool) -> Self {
        self.local_timezone = local_timezone;
        self
    }
}
