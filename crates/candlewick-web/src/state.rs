use std::sync::Arc;

use candlewick_core::{CandleService, HttpClient, MarketCalendar, ServiceConfig};

/// Shared application state, passed to route handlers via `axum::extract::State`.
pub struct AppState {
    pub service: CandleService,
}

impl AppState {
    pub fn new(service: CandleService) -> Arc<Self> {
        Arc::new(Self { service })
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &ServiceConfig) -> Arc<Self> {
        Self::new(CandleService::from_config(http_client, config))
    }

    pub fn calendar(&self) -> &MarketCalendar {
        self.service.calendar()
    }
}
