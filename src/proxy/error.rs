// Request-level errors and their HTTP mapping
use axum::{
    extract::rejection::QueryRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Rate limited by Neople API")]
    RateLimited,

    /// Non-success upstream status other than 429; body passed through as the message
    #[error("{body}")]
    Upstream { status: StatusCode, body: String },

    #[error("Character not found")]
    NotFound,

    #[error("Missing required query parameter: {0}")]
    MissingParam(&'static str),

    #[error("Invalid value for parameter: {0}")]
    InvalidParam(&'static str),

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream request failed: {0}")]
    Network(String),

    #[error("Invalid upstream response: {0}")]
    Decode(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ProxyError::Upstream { status, .. } => *status,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::MissingParam(_)
            | ProxyError::InvalidParam(_)
            | ProxyError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            ProxyError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Network(_) | ProxyError::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProxyError::Timeout
        } else {
            ProxyError::Network(e.to_string())
        }
    }
}

impl From<QueryRejection> for ProxyError {
    fn from(rejection: QueryRejection) -> Self {
        ProxyError::InvalidQuery(rejection.body_text())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
