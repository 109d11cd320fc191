//! Process configuration, resolved once at startup and injected.

use std::env;

use chrono_tz::Tz;

use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::{ConfigError, MarketCalendar};

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.polygon.io";
pub const DEFAULT_TOKEN_HEADER: &str = "x-api-key";

const ENV_UPSTREAM_URL: &str = "CANDLEWICK_UPSTREAM_URL";
const ENV_API_KEY: &str = "CANDLEWICK_API_KEY";
const ENV_POLYGON_API_KEY: &str = "POLYGON_API_KEY";
const ENV_TIMEOUT_MS: &str = "CANDLEWICK_TIMEOUT_MS";
const ENV_MARKET_TZ: &str = "CANDLEWICK_MARKET_TZ";
const ENV_TOKEN_HEADER: &str = "CANDLEWICK_TOKEN_HEADER";

/// Settings shared by every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub upstream_base_url: String,
    /// Credential used when the caller supplies none.
    pub default_api_key: Option<String>,
    pub timeout_ms: u64,
    pub market_timezone: Tz,
    /// Custom header checked for a caller credential.
    pub token_header: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            upstream_base_url: String::from(DEFAULT_UPSTREAM_URL),
            default_api_key: None,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            market_timezone: chrono_tz::America::New_York,
            token_header: String::from(DEFAULT_TOKEN_HEADER),
        }
    }
}

impl ServiceConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let upstream_base_url = match read(ENV_UPSTREAM_URL) {
            Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
                url.trim_end_matches('/').to_owned()
            }
            Some(url) => {
                return Err(ConfigError::InvalidUrl {
                    name: ENV_UPSTREAM_URL,
                    value: url,
                })
            }
            None => defaults.upstream_base_url,
        };

        let timeout_ms = match read(ENV_TIMEOUT_MS) {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidNumber {
                    name: ENV_TIMEOUT_MS,
                    value: raw,
                })?,
            None => defaults.timeout_ms,
        };

        let market_timezone = match read(ENV_MARKET_TZ) {
            Some(raw) => raw.parse::<Tz>().map_err(|_| ConfigError::InvalidTimezone {
                name: ENV_MARKET_TZ,
                value: raw,
            })?,
            None => defaults.market_timezone,
        };

        Ok(Self {
            upstream_base_url,
            default_api_key: read(ENV_API_KEY).or_else(|| read(ENV_POLYGON_API_KEY)),
            timeout_ms,
            market_timezone,
            token_header: read(ENV_TOKEN_HEADER).unwrap_or(defaults.token_header),
        })
    }

    pub fn calendar(&self) -> MarketCalendar {
        MarketCalendar::with_timezone(self.market_timezone)
    }
}
