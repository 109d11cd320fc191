use thiserror::Error;

/// Validation errors raised by domain constructors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker cannot be empty")]
    EmptyTicker,

    #[error("timestamp {value} is outside the supported range")]
    TimestampOutOfRange { value: i64 },
}

/// Caller-facing failures of the candle pipeline.
///
/// The display strings are the exact messages returned to HTTP callers, so
/// they must never carry upstream diagnostics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CandleError {
    #[error("Missing ticker. Use /products/{{ticker}}/candles or ?ticker=")]
    MissingTicker,
    #[error("Missing start/end time range")]
    MissingTimeRange,
    #[error("Invalid start/end time range")]
    InvalidTimeRange,
    #[error("Failed to fetch candles from upstream")]
    TransportFailure,
}

impl CandleError {
    /// HTTP status code the web layer answers with.
    pub const fn status_code(self) -> u16 {
        match self {
            Self::MissingTicker | Self::MissingTimeRange | Self::InvalidTimeRange => 400,
            Self::TransportFailure => 502,
        }
    }
}

impl From<crate::FetchError> for CandleError {
    fn from(value: crate::FetchError) -> Self {
        match value {
            crate::FetchError::TransportFailure => Self::TransportFailure,
        }
    }
}

/// Startup configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {name} must be a positive integer, got '{value}'")]
    InvalidNumber { name: &'static str, value: String },
    #[error("environment variable {name} is not a known IANA timezone: '{value}'")]
    InvalidTimezone { name: &'static str, value: String },
    #[error("environment variable {name} must be an http(s) URL, got '{value}'")]
    InvalidUrl { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        for error in [
            CandleError::MissingTicker,
            CandleError::MissingTimeRange,
            CandleError::InvalidTimeRange,
        ] {
            assert_eq!(error.status_code(), 400);
        }
    }

    #[test]
    fn transport_failure_maps_to_bad_gateway() {
        assert_eq!(CandleError::TransportFailure.status_code(), 502);
    }

    #[test]
    fn missing_ticker_message_points_at_route() {
        let message = CandleError::MissingTicker.to_string();
        assert!(message.starts_with("Missing ticker"));
        assert!(message.contains("/products/{ticker}/candles"));
    }
}
