//! HTTP surface for candlewick.
//!
//! | Route | Description |
//! |-------|-------------|
//! | `GET /products/:ticker/candles` | Candles for the ticker in the path |
//! | `GET /candles?ticker=` | Candles for the ticker in the query |
//! | `GET /market/status` | Session state and previous close |
//! | `GET /health` | Liveness check |
//!
//! Candle routes take `start`, `end`, `granularity`, `limit` and `token`
//! query parameters. Successful responses are arrays of
//! `[time, low, high, open, close, volume]`; failures are `{"error": ...}`.

pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::extract::Request;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info_span;

pub use error::{ApiError, ServerError};
pub use state::AppState;

/// Assemble the application router.
///
/// Request spans record the path only; the query string may carry `token`.
pub fn router(state: Arc<AppState>) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        info_span!("request", method = %request.method(), path = %request.uri().path())
    });

    routes::routes()
        .layer(trace)
        .layer(CorsLayer::permissive())
        .with_state(state)
}
