//! HTTP error rendering.
//!
//! Every failed request answers with `{"code", "message", "details"?}` and a
//! status taken from the error kind.

use std::sync::LazyLock;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use correios_cep_core::Error;
use regex::Regex;
use serde::Serialize;

static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r?\n?\t").expect("valid regex"));

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error that renders as an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into(), details: None }
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

/// Collapse tab-led line breaks so messages stay on one line.
pub fn clean_message(message: &str) -> String {
    LINE_BREAKS.replace_all(message, " ").trim().to_string()
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = StatusCode::from_u16(err.kind().status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, clean_message(err.message()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody { code: self.status.as_u16(), message: self.message, details: self.details };
        (self.status, Json(body)).into_response()
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use correios_cep_core::Kind;

    use super::*;

    #[test]
    fn test_clean_message() {
        assert_eq!(clean_message("line one\n\tline two"), "line one line two");
        assert_eq!(clean_message("a\r\n\tb\tc"), "a b c");
        assert_eq!(clean_message("plain"), "plain");
    }

    #[test]
    fn test_from_error_uses_kind_status() {
        let err = Error::wrap("resolver.resolve", Error::not_found("sqlite.get_address", "cep 1 not found"));
        let api: ApiError = err.into();
        assert_eq!(api.status, StatusCode::NOT_FOUND);
        assert_eq!(api.message, "cep 1 not found");
    }

    #[test]
    fn test_from_error_outer_kind_wins() {
        let inner = Error::not_found("sqlite.get_address", "no rows");
        let api: ApiError = Error::wrap("handler", inner).with_kind(Kind::RateLimited).into();
        assert_eq!(api.status, StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_from_foreign_error_is_internal() {
        let api: ApiError = Error::wrap("correios.lookup", std::io::Error::other("reset\n\tby peer")).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.message, "reset by peer");
    }

    #[test]
    fn test_body_shape() {
        let body = ErrorBody { code: 404, message: "Not Found".into(), details: None };
        assert_eq!(serde_json::to_value(&body).unwrap(), serde_json::json!({"code": 404, "message": "Not Found"}));
    }
}
