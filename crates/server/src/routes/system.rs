//! Service-level routes.

use std::collections::BTreeMap;

use axum::{Json, extract::State, http::StatusCode};
use correios_cep_core::BuildInfo;

use super::AppState;
use crate::error::{ApiError, ApiResult};
use crate::health::CheckResult;

/// `GET /`
pub async fn root(State(state): State<AppState>) -> Json<BuildInfo> {
    Json(state.build)
}

/// `GET /health`
///
/// 200 with every check result when all pass, 500 with the same results as
/// error details otherwise.
pub async fn health(State(state): State<AppState>) -> ApiResult<Json<BTreeMap<&'static str, CheckResult>>> {
    let (results, healthy) = state.health.results();
    if !healthy {
        return Err(ApiError::internal("Health check failed.").with_details(results));
    }

    tracing::debug!("health check passed");
    Ok(Json(results))
}

/// `GET /ping`
pub async fn ping() -> StatusCode {
    StatusCode::OK
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiError {
    ApiError::not_found(StatusCode::NOT_FOUND.canonical_reason().unwrap_or("Not Found"))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::super::testing::{FakeLookup, harness, send, send_json};

    #[tokio::test]
    async fn test_root_banner() {
        let h = harness(FakeLookup::default()).await;

        let (status, body) = send_json(&h.router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["service"], "Correios CEP Admin (API)");
        for field in ["version", "commit", "build_time", "os", "arch", "runtime_version"] {
            assert!(body[field].is_string(), "missing {field}");
        }
    }

    #[tokio::test]
    async fn test_ping() {
        let h = harness(FakeLookup::default()).await;

        let (status, _, body) = send(&h.router, "/ping").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_health_before_first_run() {
        let h = harness(FakeLookup::default()).await;

        let (status, body) = send_json(&h.router, "/health").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Health check failed.");
        assert_eq!(body["details"]["database"]["healthy"], false);
        assert_eq!(body["details"]["correios"]["error"], "didn't run yet");
    }

    #[tokio::test]
    async fn test_health_all_passing() {
        let h = harness(FakeLookup::default()).await;
        h.health.run_checks().await;

        let (status, body) = send_json(&h.router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["database"]["healthy"], true);
        assert_eq!(body["correios"]["healthy"], true);
        assert!(body["correios"]["last_checked"].is_string());
    }

    #[tokio::test]
    async fn test_health_dependency_down() {
        let h = harness(FakeLookup { fail: true, ..Default::default() }).await;
        h.health.run_checks().await;

        let (status, body) = send_json(&h.router, "/health").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], 500);
        assert_eq!(body["details"]["database"]["healthy"], true);
        assert_eq!(body["details"]["correios"]["healthy"], false);
        assert_eq!(body["details"]["correios"]["error"], "fake.check: connection refused");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let h = harness(FakeLookup::default()).await;

        let (status, body) = send_json(&h.router, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, serde_json::json!({"code": 404, "message": "Not Found"}));
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let h = harness(FakeLookup::default()).await;

        let (_, headers, _) = send(&h.router, "/ping").await;
        assert!(headers.contains_key("x-request-id"));
    }
}
