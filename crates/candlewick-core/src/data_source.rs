//! Candle source contract and the request/outcome types around it.
//!
//! [`CandleSource`] is the seam between the fallback orchestrator and the
//! upstream adapter. A fetch either fails with [`FetchError`] or produces a
//! [`FetchOutcome`]; malformed payloads are not errors but outcomes carrying a
//! [`Degradation`] marker so they can be logged without changing what the
//! caller sees.

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::{CandleRequest, CandleSeries, Granularity, Ticker};

/// Largest page size the aggregates endpoint accepts.
pub const MAX_LIMIT: u32 = 50_000;

/// Clamp a caller-provided limit into `[1, MAX_LIMIT]`.
pub fn clamp_limit(raw: i64) -> u32 {
    raw.clamp(1, i64::from(MAX_LIMIT)) as u32
}

/// One upstream aggregates query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery {
    pub ticker: Ticker,
    pub granularity: Granularity,
    pub from_ms: i64,
    pub to_ms: i64,
    pub limit: Option<u32>,
    pub api_key: Option<String>,
}

impl FetchQuery {
    /// Query covering the request's own window.
    pub fn from_request(request: &CandleRequest) -> Self {
        Self::for_window(request, request.from_seconds, request.to_seconds)
    }

    /// Query with the request's ticker, granularity, limit and credential but
    /// an explicit window given in epoch seconds.
    pub fn for_window(request: &CandleRequest, from_seconds: i64, to_seconds: i64) -> Self {
        Self {
            ticker: request.ticker.clone(),
            granularity: request.granularity(),
            from_ms: from_seconds.saturating_mul(1_000),
            to_ms: to_seconds.saturating_mul(1_000),
            limit: request.limit,
            api_key: request.api_key.clone(),
        }
    }
}

/// Why an upstream payload was served as an empty series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// Top-level JSON value was not an object.
    NotAnObject,
    /// The object had no `results` field.
    MissingResults,
    /// `results` was present but not an array.
    ResultsNotArray,
}

impl Degradation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotAnObject => "payload_not_object",
            Self::MissingResults => "results_missing",
            Self::ResultsNotArray => "results_not_array",
        }
    }
}

impl Display for Degradation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Successful fetch result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    pub series: CandleSeries,
    pub degradation: Option<Degradation>,
    /// Bars skipped because a field was missing or non-numeric.
    pub dropped_bars: usize,
}

impl FetchOutcome {
    pub fn new(series: CandleSeries) -> Self {
        Self {
            series,
            degradation: None,
            dropped_bars: 0,
        }
    }

    pub fn degraded(degradation: Degradation) -> Self {
        Self {
            series: CandleSeries::empty(),
            degradation: Some(degradation),
            dropped_bars: 0,
        }
    }

    pub fn with_dropped_bars(mut self, dropped_bars: usize) -> Self {
        self.dropped_bars = dropped_bars;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Fetch failure. Carries no upstream detail by construction.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    #[error("upstream transport failure")]
    TransportFailure,
}

/// Anything that can answer an aggregates query.
pub trait CandleSource: Send + Sync {
    fn fetch<'a>(
        &'a self,
        query: FetchQuery,
    ) -> Pin<Box<dyn Future<Output = Result<FetchOutcome, FetchError>> + Send + 'a>>;
}
