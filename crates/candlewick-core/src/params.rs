//! Inbound parameter resolution.
//!
//! [`ParamResolver`] turns the HTTP layer's [`InboundRequest`] into a validated
//! [`CandleRequest`]. Every validation failure is detected here, before any
//! upstream call is made.

use std::collections::BTreeMap;

use time::format_description::{self, well_known::Rfc3339};
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use tracing::debug;

use crate::data_source::clamp_limit;
use crate::{
    CandleError, Granularity, ServiceConfig, Ticker, UtcDateTime, DEFAULT_GRANULARITY_SECONDS,
};

const ROUTE_PREFIX: &str = "products";
const ROUTE_SUFFIX: &str = "candles";

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "[year]-[month]-[day]T[hour]:[minute]:[second]",
    "[year]-[month]-[day]T[hour]:[minute]",
    "[year]-[month]-[day] [hour]:[minute]:[second]",
    "[year]-[month]-[day] [hour]:[minute]",
];
const DATE_FORMAT: &str = "[year]-[month]-[day]";

/// Normalized view of an inbound HTTP request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    pub path: String,
    pub query: BTreeMap<String, String>,
    /// Header names are stored lowercased.
    pub headers: BTreeMap<String, String>,
}

impl InboundRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    fn query_value(&self, name: &str) -> Option<&str> {
        non_empty(self.query.get(name).map(String::as_str))
    }

    fn header_value(&self, name: &str) -> Option<&str> {
        non_empty(
            self.headers
                .get(&name.to_ascii_lowercase())
                .map(String::as_str),
        )
    }
}

/// Validated candle request, alive for one inbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleRequest {
    pub ticker: Ticker,
    pub from_seconds: i64,
    pub to_seconds: i64,
    pub granularity_seconds: i64,
    pub limit: Option<u32>,
    pub api_key: Option<String>,
}

impl CandleRequest {
    pub fn new(ticker: Ticker, from_seconds: i64, to_seconds: i64) -> Self {
        Self {
            ticker,
            from_seconds,
            to_seconds,
            granularity_seconds: DEFAULT_GRANULARITY_SECONDS,
            limit: None,
            api_key: None,
        }
    }

    pub fn with_granularity_seconds(mut self, seconds: i64) -> Self {
        self.granularity_seconds = seconds.max(1);
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(clamp_limit(limit));
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn granularity(&self) -> Granularity {
        Granularity::from_seconds(self.granularity_seconds)
    }

    /// Window length in seconds; never negative.
    pub fn duration_seconds(&self) -> i64 {
        self.to_seconds.saturating_sub(self.from_seconds).max(0)
    }
}

/// Resolves ticker, window, granularity, limit and credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamResolver {
    default_api_key: Option<String>,
    token_header: String,
}

impl ParamResolver {
    pub fn new(default_api_key: Option<String>, token_header: impl Into<String>) -> Self {
        Self {
            default_api_key: default_api_key.filter(|key| !key.trim().is_empty()),
            token_header: token_header.into().to_ascii_lowercase(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.default_api_key.clone(), config.token_header.clone())
    }

    pub fn resolve(
        &self,
        inbound: &InboundRequest,
        now: UtcDateTime,
    ) -> Result<CandleRequest, CandleError> {
        let ticker = resolve_ticker(inbound).ok_or(CandleError::MissingTicker)?;

        let start = TimeField::parse(inbound.query_value("start"), now);
        let end = TimeField::parse(inbound.query_value("end"), now);
        let (from_seconds, to_seconds) = match (start, end) {
            (TimeField::Set(from), TimeField::Set(to)) => (from, to),
            (TimeField::Unset, TimeField::Unset) => return Err(CandleError::MissingTimeRange),
            (start, end) => {
                debug!(?start, ?end, "rejecting partial or unparseable time range");
                return Err(CandleError::InvalidTimeRange);
            }
        };

        let granularity_seconds = inbound
            .query_value("granularity")
            .and_then(|raw| raw.parse::<i64>().ok())
            .unwrap_or(DEFAULT_GRANULARITY_SECONDS);

        let mut request = CandleRequest::new(ticker, from_seconds, to_seconds)
            .with_granularity_seconds(granularity_seconds);

        if let Some(limit) = inbound
            .query_value("limit")
            .and_then(|raw| raw.parse::<i64>().ok())
        {
            request = request.with_limit(limit);
        }

        if let Some(api_key) = self.resolve_api_key(inbound) {
            request = request.with_api_key(api_key);
        }

        Ok(request)
    }

    /// Credential lookup: `token` query, custom header, bearer header, then
    /// the process default.
    pub fn resolve_api_key(&self, inbound: &InboundRequest) -> Option<String> {
        inbound
            .query_value("token")
            .or_else(|| inbound.header_value(&self.token_header))
            .or_else(|| inbound.header_value("authorization").and_then(bearer_token))
            .map(str::to_owned)
            .or_else(|| self.default_api_key.clone())
    }
}

impl Default for ParamResolver {
    fn default() -> Self {
        Self::from_config(&ServiceConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeField {
    Unset,
    Set(i64),
    Invalid,
}

impl TimeField {
    fn parse(raw: Option<&str>, now: UtcDateTime) -> Self {
        match raw {
            None => Self::Unset,
            Some(raw) => parse_instant(raw, now).map_or(Self::Invalid, Self::Set),
        }
    }
}

fn resolve_ticker(inbound: &InboundRequest) -> Option<Ticker> {
    ticker_from_path(&inbound.path)
        .or_else(|| inbound.query_value("ticker").map(str::to_owned))
        .and_then(|raw| Ticker::parse(&raw).ok())
}

fn ticker_from_path(path: &str) -> Option<String> {
    let segments = path.trim_matches('/').split('/').collect::<Vec<_>>();
    match segments.as_slice() {
        [ROUTE_PREFIX, ticker, ROUTE_SUFFIX] if !ticker.trim().is_empty() => {
            let decoded = urlencoding::decode(ticker)
                .map(|value| value.into_owned())
                .unwrap_or_else(|_| (*ticker).to_owned());
            Some(decoded).filter(|value| !value.trim().is_empty())
        }
        _ => None,
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    non_empty(Some(token))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Resolve a start/end value to epoch seconds.
///
/// Accepts epoch seconds (decimals are floored), RFC3339, naive
/// `YYYY-MM-DD[ T]HH:MM[:SS]` and `YYYY-MM-DD` read as UTC, and the relative
/// forms `now`, `today`, `yesterday` and `<n> <unit>[s] ago`.
pub fn parse_instant(raw: &str, now: UtcDateTime) -> Option<i64> {
    let input = raw.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Some(seconds);
    }

    if let Ok(seconds) = input.parse::<f64>() {
        if seconds.is_finite() && seconds >= i64::MIN as f64 && seconds < i64::MAX as f64 {
            return Some(seconds.floor() as i64);
        }
        return None;
    }

    if let Ok(parsed) = OffsetDateTime::parse(input, &Rfc3339) {
        return Some(parsed.unix_timestamp());
    }

    if let Some(seconds) = parse_relative(&input.to_ascii_lowercase(), now) {
        return Some(seconds);
    }

    for description in NAIVE_DATETIME_FORMATS {
        let Ok(items) = format_description::parse(description) else {
            continue;
        };
        if let Ok(parsed) = PrimitiveDateTime::parse(input, &items) {
            return Some(parsed.assume_utc().unix_timestamp());
        }
    }

    let items = format_description::parse(DATE_FORMAT).ok()?;
    Date::parse(input, &items)
        .ok()
        .map(|date| date.midnight().assume_utc().unix_timestamp())
}

fn parse_relative(input: &str, now: UtcDateTime) -> Option<i64> {
    let current = now.unix_seconds();
    let midnight = now.into_inner().date().midnight().assume_utc().unix_timestamp();

    match input {
        "now" => return Some(current),
        "today" => return Some(midnight),
        "yesterday" => return midnight.checked_sub(86_400),
        _ => {}
    }

    let mut words = input.split_whitespace();
    let amount = words.next()?.parse::<i64>().ok().filter(|amount| *amount >= 0)?;
    let unit = words.next()?;
    if words.next()? != "ago" || words.next().is_some() {
        return None;
    }

    let unit_seconds = match unit.strip_suffix('s').unwrap_or(unit) {
        "second" | "sec" => 1,
        "minute" | "min" => 60,
        "hour" => 3_600,
        "day" => 86_400,
        "week" => 604_800,
        _ => return None,
    };

    current.checked_sub(amount.checked_mul(unit_seconds)?)
}
