//! Thin async client for historical price/volume data.
//!
//! Fetches aggregate bars from a REST aggregates API (one request per symbol,
//! issued concurrently) and history from a consumer quote service (blocking
//! CSV download), normalizing both into one canonical row schema.
//!
//! ```no_run
//! use aggfetch::{fetch, FetchRequest, Settings, Source};
//!
//! # async fn run() -> aggfetch::Result<()> {
//! let request = FetchRequest::new(["AAPL", "AMZN"], Source::Polygon, 30, 60);
//! let series = fetch(&request, &Settings::from_env()).await?;
//! for entry in &series {
//!     println!("{}: {} bars", entry.symbol, entry.bars.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Per-symbol failures never abort a batch: they are dropped from the
//! normalized output (use [`fetch_raw`] to inspect every outcome).

pub mod config;
pub mod error;
pub mod fetch;
pub mod utils;

pub use config::Settings;
pub use error::{Error, Result};
pub use fetch::{
    download, fetch, fetch_raw, Bar, FetchRequest, HttpMethod, IntervalUnit, NormalizedSeries,
    RequestOutcome, Source, SymbolResponse, Ticker,
};
