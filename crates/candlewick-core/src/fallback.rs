//! Market-close fallback for empty primary windows.
//!
//! Upstream data is often missing for the most recent session (weekends, or a
//! window entirely after the last close). When the primary fetch succeeds but
//! returns nothing, the window is shifted to end at the previous session
//! close and fetched exactly once more.

use tracing::info;

use crate::data_source::{CandleSource, FetchError, FetchOutcome, FetchQuery};
use crate::{CandleRequest, CandleSeries, MarketCalendar};

/// Which window produced the final series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    Primary,
    Shifted,
}

/// Final result of a request, including the window actually served.
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome {
    pub state: FallbackState,
    pub from_seconds: i64,
    pub to_seconds: i64,
    pub fetch: FetchOutcome,
}

impl FallbackOutcome {
    fn primary(request: &CandleRequest, fetch: FetchOutcome) -> Self {
        Self {
            state: FallbackState::Primary,
            from_seconds: request.from_seconds,
            to_seconds: request.to_seconds,
            fetch,
        }
    }

    pub fn series(&self) -> &CandleSeries {
        &self.fetch.series
    }

    pub fn into_series(self) -> CandleSeries {
        self.fetch.series
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackOrchestrator {
    calendar: MarketCalendar,
}

impl FallbackOrchestrator {
    pub fn new(calendar: MarketCalendar) -> Self {
        Self { calendar }
    }

    pub fn calendar(&self) -> &MarketCalendar {
        &self.calendar
    }

    /// Window `[from, to]` in epoch seconds the fallback would query, or
    /// `None` when the original window or the close anchor is degenerate.
    pub fn shifted_window(&self, request: &CandleRequest) -> Option<(i64, i64)> {
        let duration = request.duration_seconds();
        let adjusted_to = self.calendar.previous_close(request.to_seconds);
        if duration <= 0 || adjusted_to <= 0 {
            return None;
        }

        let adjusted_from = adjusted_to.saturating_sub(duration).max(0);
        Some((adjusted_from, adjusted_to))
    }

    /// Run the primary fetch and, if needed, the shifted one.
    pub async fn run(
        &self,
        source: &dyn CandleSource,
        request: &CandleRequest,
    ) -> Result<FallbackOutcome, FetchError> {
        let first = source.fetch(FetchQuery::from_request(request)).await;
        self.resolve(source, request, first).await
    }

    /// Decide what to return given the primary attempt's result.
    ///
    /// Errors and non-empty series pass through untouched. An empty series
    /// triggers at most one more fetch over [`Self::shifted_window`].
    pub async fn resolve(
        &self,
        source: &dyn CandleSource,
        request: &CandleRequest,
        first: Result<FetchOutcome, FetchError>,
    ) -> Result<FallbackOutcome, FetchError> {
        let first = first?;
        if !first.is_empty() {
            return Ok(FallbackOutcome::primary(request, first));
        }

        let Some((from_seconds, to_seconds)) = self.shifted_window(request) else {
            return Ok(FallbackOutcome::primary(request, first));
        };

        info!(
            ticker = %request.ticker,
            from = request.from_seconds,
            to = request.to_seconds,
            shifted_from = from_seconds,
            shifted_to = to_seconds,
            "primary window empty, retrying at previous market close"
        );

        let fetch = source
            .fetch(FetchQuery::for_window(request, from_seconds, to_seconds))
            .await?;

        Ok(FallbackOutcome {
            state: FallbackState::Shifted,
            from_seconds,
            to_seconds,
            fetch,
        })
    }
}

impl Default for FallbackOrchestrator {
    fn default() -> Self {
        Self::new(MarketCalendar::us_equities())
    }
}
