//! Unified error type for correios-cep.
//!
//! Every failure carries the operation that produced it and, optionally, a
//! [`Kind`]. Kinds map one-to-one onto HTTP status codes. Wrapping an error
//! without a kind defers to the kind of the wrapped error, so the chain reads
//! like a small stack trace of operations.

use std::fmt;

use tokio_rusqlite::rusqlite;

/// Boxed error cause.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Operation name attached to an error, e.g. `"sqlite.get_address"`.
pub type Op = &'static str;

/// Result alias used across the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Small closed set of error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    NotFound,
    BadRequest,
    Unexpected,
    AlreadyExists,
    RateLimited,
    NotImplemented,
    Redirect,
}

impl Kind {
    /// HTTP status code for this kind.
    pub fn status(self) -> u16 {
        match self {
            Kind::NotFound => 404,
            Kind::BadRequest => 400,
            Kind::Unexpected => 500,
            Kind::AlreadyExists => 409,
            Kind::RateLimited => 429,
            Kind::NotImplemented => 501,
            Kind::Redirect => 301,
        }
    }

    /// Canonical reason phrase for the status code.
    pub fn text(self) -> &'static str {
        match self {
            Kind::NotFound => "Not Found",
            Kind::BadRequest => "Bad Request",
            Kind::Unexpected => "Internal Server Error",
            Kind::AlreadyExists => "Conflict",
            Kind::RateLimited => "Too Many Requests",
            Kind::NotImplemented => "Not Implemented",
            Kind::Redirect => "Moved Permanently",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Error tagged with an operation and an optional kind.
#[derive(Debug, thiserror::Error)]
#[error("{op}: {message}")]
pub struct Error {
    op: Op,
    kind: Option<Kind>,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl Error {
    /// Create a leaf error with an explicit kind.
    pub fn new(op: Op, kind: Kind, message: impl Into<String>) -> Self {
        Self { op, kind: Some(kind), message: message.into(), source: None }
    }

    /// Wrap a cause. The kind is inherited from the cause unless set with
    /// [`Error::with_kind`].
    pub fn wrap(op: Op, source: impl Into<BoxError>) -> Self {
        let source = source.into();
        Self { op, kind: None, message: source.to_string(), source: Some(source) }
    }

    /// Set the kind on this layer of the chain.
    pub fn with_kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn not_found(op: Op, message: impl Into<String>) -> Self {
        Self::new(op, Kind::NotFound, message)
    }

    pub fn bad_request(op: Op, message: impl Into<String>) -> Self {
        Self::new(op, Kind::BadRequest, message)
    }

    pub fn unexpected(op: Op, message: impl Into<String>) -> Self {
        Self::new(op, Kind::Unexpected, message)
    }

    pub fn op(&self) -> Op {
        self.op
    }

    /// First explicitly set kind, searching from this error inward.
    ///
    /// Causes that are not an [`Error`] end the search with
    /// [`Kind::Unexpected`].
    pub fn kind(&self) -> Kind {
        if let Some(kind) = self.kind {
            return kind;
        }

        match self.inner() {
            Some(inner) => inner.kind(),
            None => Kind::Unexpected,
        }
    }

    /// Shorthand for `self.kind() == kind`.
    pub fn is(&self, kind: Kind) -> bool {
        self.kind() == kind
    }

    /// Operations of the whole chain, outermost first.
    pub fn ops(&self) -> Vec<Op> {
        let mut ops = vec![self.op];
        let mut current = self;
        while let Some(inner) = current.inner() {
            ops.push(inner.op);
            current = inner;
        }
        ops
    }

    /// Human-readable message of the innermost [`Error`] in the chain.
    pub fn message(&self) -> &str {
        match self.inner() {
            Some(inner) => inner.message(),
            None => &self.message,
        }
    }

    fn inner(&self) -> Option<&Error> {
        self.source.as_ref().and_then(|s| s.downcast_ref::<Error>())
    }
}

/// Classify a SQLite error.
pub fn sqlite_kind(err: &rusqlite::Error) -> Kind {
    match err {
        rusqlite::Error::QueryReturnedNoRows => Kind::NotFound,
        e if e.sqlite_error_code() == Some(rusqlite::ErrorCode::ConstraintViolation) => Kind::AlreadyExists,
        _ => Kind::Unexpected,
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::unexpected("sqlite", "connection closed"),
            tokio_rusqlite::Error::Close((_, e)) => Error::wrap("sqlite.close", e).with_kind(Kind::Unexpected),
            _ => Error::unexpected("sqlite", "connection closed"),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e.into(),
            other => Error::unexpected("sqlite", other.to_string()),
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        let kind = sqlite_kind(&err);
        Error::wrap("sqlite", err).with_kind(kind)
    }
}
