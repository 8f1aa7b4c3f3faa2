//! HTTP server for correios-cep.
//!
//! Routes, error rendering, dependency health checks and the server
//! lifecycle. The binary in `correios-cep-cli` wires configuration and
//! logging around [`Server`].

pub mod error;
pub mod health;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult};
pub use health::HealthChecker;
pub use routes::{AppState, router};
pub use server::{Server, shutdown_signal};
