//! Upstream provider adapters.

pub mod polygon;

pub use polygon::CandleFetcher;
