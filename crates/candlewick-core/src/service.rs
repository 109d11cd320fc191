use std::sync::Arc;

use tracing::debug;

use crate::data_source::{CandleSource, FetchQuery};
use crate::http_client::HttpClient;
use crate::{
    CandleError, CandleFetcher, CandleSeries, FallbackOrchestrator, FallbackState, InboundRequest,
    MarketCalendar, ParamResolver, ServiceConfig, UtcDateTime,
};

/// End-to-end candle pipeline: resolve, fetch, fall back.
#[derive(Clone)]
pub struct CandleService {
    resolver: ParamResolver,
    source: Arc<dyn CandleSource>,
    orchestrator: FallbackOrchestrator,
}

impl CandleService {
    pub fn new(
        resolver: ParamResolver,
        source: Arc<dyn CandleSource>,
        orchestrator: FallbackOrchestrator,
    ) -> Self {
        Self {
            resolver,
            source,
            orchestrator,
        }
    }

    /// Wire the upstream fetcher and calendar described by `config`.
    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &ServiceConfig) -> Self {
        Self::new(
            ParamResolver::from_config(config),
            Arc::new(CandleFetcher::from_config(http_client, config)),
            FallbackOrchestrator::new(config.calendar()),
        )
    }

    pub fn calendar(&self) -> &MarketCalendar {
        self.orchestrator.calendar()
    }

    /// Serve one inbound request.
    ///
    /// Validation errors are returned before any upstream call is made.
    pub async fn handle(
        &self,
        inbound: &InboundRequest,
        now: UtcDateTime,
    ) -> Result<CandleSeries, CandleError> {
        let request = self.resolver.resolve(inbound, now)?;
        debug!(
            ticker = %request.ticker,
            from = request.from_seconds,
            to = request.to_seconds,
            granularity = %request.granularity(),
            limit = ?request.limit,
            "resolved candle request"
        );

        let first = self
            .source
            .fetch(FetchQuery::from_request(&request))
            .await;
        let outcome = self
            .orchestrator
            .resolve(self.source.as_ref(), &request, first)
            .await?;

        if outcome.state == FallbackState::Shifted {
            debug!(
                from = outcome.from_seconds,
                to = outcome.to_seconds,
                candles = outcome.series().len(),
                "served shifted window"
            );
        }

        Ok(outcome.into_series())
    }
}
