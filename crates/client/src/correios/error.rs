//! Correios client error types.

use correios_cep_core::{Error, Kind, Op};

/// Errors from the Correios lookup client.
#[derive(Debug, thiserror::Error)]
pub enum CorreiosError {
    /// Configured base URL cannot be used.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// No match for the code.
    #[error("cep {0} not found")]
    NotFound(String),

    /// Non-200 response.
    #[error("{method} {path} returned {status}")]
    HttpError { method: &'static str, path: &'static str, status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl CorreiosError {
    /// Whether a fresh attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CorreiosError::Timeout | CorreiosError::Network(_))
    }

    pub fn kind(&self) -> Kind {
        match self {
            CorreiosError::NotFound(_) => Kind::NotFound,
            _ => Kind::Unexpected,
        }
    }

    /// Convert into the workspace error, tagged with `op`.
    pub fn into_error(self, op: Op) -> Error {
        let kind = self.kind();
        Error::wrap(op, self).with_kind(kind)
    }
}

impl From<reqwest::Error> for CorreiosError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { CorreiosError::Timeout } else { CorreiosError::Network(err) }
    }
}
