use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use candlewick_core::{CandleError, ConfigError};
use serde_json::json;
use thiserror::Error;

/// Error returned from route handlers; rendered as `{"error": message}`.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] CandleError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.0.to_string() });
        (self.status(), axum::Json(body)).into_response()
    }
}

/// Startup and serve failures of the binary, mapped to exit codes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Io(_) => 10,
        }
    }
}
