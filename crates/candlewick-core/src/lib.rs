//! Core pipeline for candlewick.
//!
//! Turns an inbound candle request into a normalized OHLCV series fetched
//! from the Polygon aggregates API, shifting the window to the previous
//! market close when the requested range comes back empty.
//!
//! | Module | Role |
//! |--------|------|
//! | [`params`] | Ticker, time range, granularity, limit and credential resolution |
//! | [`domain`] | Value types: tickers, granularities, candles, instants |
//! | [`calendar`] | Weekday session calendar used to anchor fallback windows |
//! | [`data_source`] | [`CandleSource`] contract plus query/outcome types |
//! | [`adapters`] | Polygon fetcher and payload normalization |
//! | [`fallback`] | Empty-window fallback decision |
//! | [`service`] | The assembled request pipeline |
//! | [`http_client`] | Transport seam over `reqwest` |
//! | [`config`] | Environment-driven settings |
//!
//! ```text
//! InboundRequest ─► ParamResolver ─► CandleRequest
//!                                        │
//!                                        ▼
//!                  CandleSource::fetch (primary window)
//!                                        │
//!                                        ▼
//!              FallbackOrchestrator ─► at most one shifted fetch
//!                                        │
//!                                        ▼
//!                                  CandleSeries
//! ```

pub mod adapters;
pub mod calendar;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fallback;
pub mod http_client;
pub mod params;
pub mod service;

pub use adapters::CandleFetcher;
pub use calendar::MarketCalendar;
pub use config::ServiceConfig;
pub use data_source::{
    clamp_limit, CandleSource, Degradation, FetchError, FetchOutcome, FetchQuery, MAX_LIMIT,
};
pub use domain::{
    Candle, CandleSeries, Granularity, GranularityUnit, Ticker, UtcDateTime,
    DEFAULT_GRANULARITY_SECONDS,
};
pub use error::{CandleError, ConfigError, ValidationError};
pub use fallback::{FallbackOrchestrator, FallbackOutcome, FallbackState};
pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};
pub use params::{parse_instant, CandleRequest, InboundRequest, ParamResolver};
pub use service::CandleService;
