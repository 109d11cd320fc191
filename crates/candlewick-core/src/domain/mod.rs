//! # Domain Models
//!
//! Value types shared by the candle pipeline.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Ticker`] | Trimmed, non-empty upstream ticker |
//! | [`Granularity`] | Bucket width as `multiplier * unit` |
//! | [`GranularityUnit`] | second, minute, hour, or day |
//! | [`Candle`] | One OHLCV bucket, serialized as a 6-element array |
//! | [`CandleSeries`] | Candles in upstream order |
//! | [`UtcDateTime`] | UTC instant |
//!
//! Candles are produced once per upstream bar and never mutated; nothing in
//! this module is shared between requests.

mod candle;
mod granularity;
mod ticker;
mod timestamp;

pub use candle::{Candle, CandleSeries};
pub use granularity::{Granularity, GranularityUnit, DEFAULT_GRANULARITY_SECONDS};
pub use ticker::Ticker;
pub use timestamp::UtcDateTime;
