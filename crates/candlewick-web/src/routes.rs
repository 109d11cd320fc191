use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use candlewick_core::{CandleSeries, InboundRequest, UtcDateTime};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Candle, market status and health routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/products/:ticker/candles", get(candles))
        .route("/candles", get(candles))
        .route("/market/status", get(market_status))
        .route("/health", get(health))
        .fallback(unmatched)
}

/// GET /products/:ticker/candles and GET /candles
async fn candles(
    State(state): State<Arc<AppState>>,
    uri: Uri,
    Query(query): Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Result<Json<CandleSeries>, ApiError> {
    let inbound = inbound_request(&uri, query, &headers);
    let span = info_span!("candles", request_id = %Uuid::new_v4(), path = %uri.path());

    let series = state
        .service
        .handle(&inbound, UtcDateTime::now())
        .instrument(span)
        .await?;

    Ok(Json(series))
}

fn inbound_request(
    uri: &Uri,
    query: BTreeMap<String, String>,
    headers: &HeaderMap,
) -> InboundRequest {
    let mut inbound = InboundRequest::new(uri.path());
    inbound.query = query;

    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            inbound = inbound.with_header(name.as_str(), value);
        }
    }

    inbound
}

#[derive(Debug, Serialize)]
struct MarketStatus {
    open: bool,
    previous_close: i64,
    timezone: &'static str,
}

/// GET /market/status
async fn market_status(State(state): State<Arc<AppState>>) -> Json<MarketStatus> {
    let calendar = state.calendar();
    let now = UtcDateTime::now().unix_seconds();

    Json(MarketStatus {
        open: calendar.is_open(now),
        previous_close: calendar.previous_close(now),
        timezone: calendar.timezone().name(),
    })
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Paths under `/products/` that miss the route pattern (an empty ticker
/// segment, say) still go through resolution so `?ticker=` can apply.
async fn unmatched(
    state: State<Arc<AppState>>,
    uri: Uri,
    query: Query<BTreeMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if uri.path().starts_with("/products/") {
        return candles(state, uri, query, headers).await.into_response();
    }

    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Mutex;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use candlewick_core::{
        Candle, CandleService, CandleSource, FallbackOrchestrator, FetchError, FetchOutcome,
        FetchQuery, ParamResolver,
    };
    use tower::ServiceExt;

    use super::*;
    use crate::router;

    #[derive(Default)]
    struct ScriptedSource {
        results: Mutex<VecDeque<Result<FetchOutcome, FetchError>>>,
        queries: Mutex<Vec<FetchQuery>>,
    }

    impl CandleSource for ScriptedSource {
        fn fetch<'a>(
            &'a self,
            query: FetchQuery,
        ) -> Pin<Box<dyn Future<Output = Result<FetchOutcome, FetchError>> + Send + 'a>> {
            self.queries.lock().expect("not poisoned").push(query);
            let next = self
                .results
                .lock()
                .expect("not poisoned")
                .pop_front()
                .unwrap_or_else(|| Ok(FetchOutcome::default()));
            Box::pin(async move { next })
        }
    }

    fn app(results: Vec<Result<FetchOutcome, FetchError>>) -> (Router, Arc<ScriptedSource>) {
        let source = Arc::new(ScriptedSource {
            results: Mutex::new(results.into()),
            queries: Mutex::new(Vec::new()),
        });
        let service = CandleService::new(
            ParamResolver::new(Some(String::from("server-key")), "x-api-key"),
            source.clone(),
            FallbackOrchestrator::default(),
        );
        (router(AppState::new(service)), source)
    }

    async fn get_json(app: Router, uri: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let response = app
            .oneshot(builder.body(Body::empty()).expect("valid request"))
            .await
            .expect("infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = serde_json::from_slice(&bytes).expect("json body");
        (status, body)
    }

    fn one_candle() -> FetchOutcome {
        FetchOutcome::new(
            [Candle::new(1_700_000_000, 0.5, 2.0, 1.0, 1.5, 100.0)]
                .into_iter()
                .collect(),
        )
    }

    #[tokio::test]
    async fn path_route_returns_candle_arrays() {
        let (app, source) = app(vec![Ok(one_candle())]);

        let (status, body) = get_json(
            app,
            "/products/AAPL/candles?start=1700000000&end=1700003600&granularity=3600",
            &[],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([[1_700_000_000_i64, 0.5, 2.0, 1.0, 1.5, 100.0]]));

        let queries = source.queries.lock().expect("not poisoned").clone();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].ticker.as_str(), "AAPL");
        assert_eq!(queries[0].granularity.to_string(), "1/hour");
        assert_eq!(queries[0].api_key.as_deref(), Some("server-key"));
    }

    #[tokio::test]
    async fn query_route_reads_ticker_and_header_credential() {
        let (app, source) = app(vec![Ok(one_candle())]);

        let (status, _) = get_json(
            app,
            "/candles?ticker=MSFT&start=1700000000&end=1700003600",
            &[("X-Api-Key", "caller-key")],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let queries = source.queries.lock().expect("not poisoned").clone();
        assert_eq!(queries[0].ticker.as_str(), "MSFT");
        assert_eq!(queries[0].api_key.as_deref(), Some("caller-key"));
    }

    #[tokio::test]
    async fn missing_ticker_is_bad_request() {
        let (app, source) = app(Vec::new());

        let (status, body) = get_json(app, "/candles?start=1&end=2", &[]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Missing ticker. Use /products/{ticker}/candles or ?ticker=" })
        );
        assert!(source.queries.lock().expect("not poisoned").is_empty());
    }

    #[tokio::test]
    async fn partial_range_is_bad_request() {
        let (app, _) = app(Vec::new());

        let (status, body) = get_json(app, "/products/AAPL/candles?start=1700000000", &[]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Invalid start/end time range" }));
    }

    #[tokio::test]
    async fn upstream_failure_is_bad_gateway() {
        let (app, _) = app(vec![Err(FetchError::TransportFailure)]);

        let (status, body) = get_json(
            app,
            "/products/AAPL/candles?start=1700000000&end=1700003600",
            &[],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body, json!({ "error": "Failed to fetch candles from upstream" }));
    }

    #[tokio::test]
    async fn empty_result_is_an_empty_array() {
        let (app, source) = app(Vec::new());

        let (status, body) = get_json(
            app,
            "/products/AAPL/candles?start=1700391600&end=1700395200",
            &[],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert_eq!(source.queries.lock().expect("not poisoned").len(), 2);
    }

    #[tokio::test]
    async fn market_status_reports_calendar() {
        let (app, _) = app(Vec::new());

        let (status, body) = get_json(app, "/market/status", &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["timezone"], "America/New_York");
        assert!(body["open"].is_boolean());
        assert!(body["previous_close"].as_i64().is_some_and(|close| close > 0));
    }

    #[tokio::test]
    async fn health_is_ok() {
        let (app, _) = app(Vec::new());
        let (status, body) = get_json(app, "/health", &[]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn empty_path_ticker_falls_back_to_query_ticker() {
        let (app, source) = app(vec![Ok(one_candle())]);

        let (status, body) = get_json(
            app,
            "/products//candles?ticker=AAPL&start=1700000000&end=1700003600",
            &[],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([[1_700_000_000_i64, 0.5, 2.0, 1.0, 1.5, 100.0]]));
        let queries = source.queries.lock().expect("not poisoned").clone();
        assert_eq!(queries[0].ticker.as_str(), "AAPL");
    }

    #[tokio::test]
    async fn malformed_products_path_without_query_ticker_is_bad_request() {
        let (app, _) = app(Vec::new());

        let (status, body) = get_json(app, "/products//candles?start=1&end=2", &[]).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Missing ticker. Use /products/{ticker}/candles or ?ticker=" })
        );
    }

    #[tokio::test]
    async fn unknown_route_is_json_not_found() {
        let (app, _) = app(Vec::new());

        let (status, body) = get_json(app, "/quotes", &[]).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("not poisoned")).into_owned()
        }
    }

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("not poisoned").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn caller_credentials_never_reach_the_logs() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let (app, _) = app(vec![Ok(one_candle())]);
        let (status, _) = get_json(
            app,
            "/products/AAPL/candles?start=1700000000&end=1700003600&token=QUERYSECRET",
            &[("Authorization", "Bearer HEADERSECRET")],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let output = logs.contents();
        assert!(output.contains("path=/products/AAPL/candles"), "logs: {output}");
        assert!(!output.contains("QUERYSECRET"), "logs: {output}");
        assert!(!output.contains("HEADERSECRET"), "logs: {output}");
    }
}
