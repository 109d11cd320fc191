use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::data_source::{CandleSource, Degradation, FetchError, FetchOutcome, FetchQuery};
use crate::http_client::{HttpClient, HttpRequest, ReqwestHttpClient, DEFAULT_TIMEOUT_MS};
use crate::{Candle, CandleSeries, ServiceConfig};

/// Fetches aggregate bars from the Polygon `/v2/aggs` endpoint and
/// normalizes them into candles.
#[derive(Clone)]
pub struct CandleFetcher {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    timeout_ms: u64,
}

impl CandleFetcher {
    pub fn new(http_client: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn from_config(http_client: Arc<dyn HttpClient>, config: &ServiceConfig) -> Self {
        Self::new(http_client, config.upstream_base_url.clone()).with_timeout_ms(config.timeout_ms)
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Build the aggregates request for `query`.
    pub fn build_request(&self, query: &FetchQuery) -> HttpRequest {
        let mut url = format!(
            "{}/v2/aggs/ticker/{}/range/{}/{}/{}/{}?adjusted=true&sort=desc",
            self.base_url,
            query.ticker.url_escaped(),
            query.granularity.multiplier,
            query.granularity.unit.as_str(),
            query.from_ms,
            query.to_ms,
        );

        if let Some(limit) = query.limit {
            url.push_str(&format!("&limit={limit}"));
        }
        if let Some(api_key) = &query.api_key {
            url.push_str(&format!("&apiKey={}", urlencoding::encode(api_key)));
        }

        HttpRequest::get(url)
            .with_header("Accept", "application/json")
            .with_timeout_ms(self.timeout_ms)
    }

    /// Run one aggregates query against the upstream.
    pub async fn fetch_aggregates(&self, query: &FetchQuery) -> Result<FetchOutcome, FetchError> {
        let request = self.build_request(query);
        let redacted_url = request.redacted_url();
        debug!(url = %redacted_url, "requesting upstream aggregates");

        let response = self.http_client.execute(request).await.map_err(|error| {
            warn!(
                url = %redacted_url,
                timed_out = error.timed_out(),
                error = %error,
                "upstream transport error"
            );
            FetchError::TransportFailure
        })?;

        if !response.is_success() {
            warn!(
                url = %redacted_url,
                status = response.status,
                "upstream returned non-success status"
            );
            return Err(FetchError::TransportFailure);
        }

        let payload = serde_json::from_str::<Value>(&response.body).map_err(|error| {
            warn!(url = %redacted_url, error = %error, "upstream body is not valid JSON");
            FetchError::TransportFailure
        })?;

        let outcome = normalize_payload(&payload);
        if let Some(degradation) = outcome.degradation {
            warn!(
                url = %redacted_url,
                degradation = %degradation,
                "upstream payload degraded to empty series"
            );
        }
        if outcome.dropped_bars > 0 {
            warn!(
                url = %redacted_url,
                dropped = outcome.dropped_bars,
                kept = outcome.series.len(),
                "dropped malformed upstream bars"
            );
        }

        Ok(outcome)
    }
}

impl Default for CandleFetcher {
    fn default() -> Self {
        Self::from_config(Arc::new(ReqwestHttpClient::new()), &ServiceConfig::default())
    }
}

impl CandleSource for CandleFetcher {
    fn fetch<'a>(
        &'a self,
        query: FetchQuery,
    ) -> Pin<Box<dyn Future<Output = Result<FetchOutcome, FetchError>> + Send + 'a>> {
        Box::pin(async move { self.fetch_aggregates(&query).await })
    }
}

/// Normalize a decoded aggregates payload.
pub fn normalize_payload(payload: &Value) -> FetchOutcome {
    let Some(object) = payload.as_object() else {
        return FetchOutcome::degraded(Degradation::NotAnObject);
    };

    let bars = match object.get("results") {
        None => return FetchOutcome::degraded(Degradation::MissingResults),
        Some(Value::Array(bars)) => bars,
        Some(_) => return FetchOutcome::degraded(Degradation::ResultsNotArray),
    };

    let series = bars
        .iter()
        .filter_map(|bar| bar.as_object().and_then(normalize_bar))
        .collect::<CandleSeries>();
    let dropped_bars = bars.len() - series.len();

    FetchOutcome::new(series).with_dropped_bars(dropped_bars)
}

fn normalize_bar(bar: &Map<String, Value>) -> Option<Candle> {
    let timestamp_ms = bar.get("t").and_then(millis_value)?;
    let open = bar.get("o").and_then(number_value)?;
    let high = bar.get("h").and_then(number_value)?;
    let low = bar.get("l").and_then(number_value)?;
    let close = bar.get("c").and_then(number_value)?;
    let volume = bar.get("v").and_then(number_value)?;

    Some(Candle::from_millis(timestamp_ms, open, high, low, close, volume))
}

fn number_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn millis_value(value: &Value) -> Option<i64> {
    if let Some(millis) = value.as_i64() {
        return Some(millis);
    }

    let millis = number_value(value)?.floor();
    (millis >= i64::MIN as f64 && millis < i64::MAX as f64).then_some(millis as i64)
}
