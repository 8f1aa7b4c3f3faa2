//! HTTP routes.
//!
//! ```text
//! GET /                         build banner
//! GET /health                   dependency health
//! GET /ping                     liveness
//! GET /api/v1/addresses         list by state
//! GET /api/v1/addresses/{cep}   read-through lookup
//! ```

pub mod addresses;
pub mod system;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use correios_cep_core::{BuildInfo, Resolver, Storage};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::health::HealthChecker;

/// Prefix of the versioned API.
pub const API_PREFIX: &str = "/api/v1";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub resolver: Resolver,
    pub health: Arc<HealthChecker>,
    pub build: BuildInfo,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, resolver: Resolver, health: Arc<HealthChecker>) -> Self {
        Self { storage, resolver, health, build: BuildInfo::current() }
    }
}

/// Build the application router with middleware.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/addresses", get(addresses::list))
        .route("/addresses/{cep}", get(addresses::get));

    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .route("/ping", get(system::ping))
        .nest(API_PREFIX, api)
        .fallback(system::not_found)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(CorsLayer::permissive()),
        )
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fakes shared by the route tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use correios_cep_core::{Address, AddressLookup, Error, SqliteStore};
    use tower::ServiceExt;

    use super::*;

    #[derive(Default)]
    pub struct FakeLookup {
        pub known: HashMap<String, Address>,
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    #[async_trait]
    impl AddressLookup for FakeLookup {
        async fn check(&self) -> Result<(), Error> {
            if self.fail { Err(Error::unexpected("fake.check", "connection refused")) } else { Ok(()) }
        }

        async fn lookup(&self, cep: &str) -> Result<Address, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::unexpected("fake.lookup", "POST /lookup returned 503"));
            }
            self.known
                .get(cep)
                .cloned()
                .ok_or_else(|| Error::not_found("fake.lookup", format!("cep {cep} not found")))
        }
    }

    pub fn address(cep: &str, state: &str) -> Address {
        Address {
            cep: cep.to_string(),
            state: state.to_string(),
            city: "São Paulo".to_string(),
            neighborhood: "Sé".to_string(),
            location: "Praça da Sé".to_string(),
            ..Default::default()
        }
    }

    pub struct Harness {
        pub store: Arc<SqliteStore>,
        pub lookup: Arc<FakeLookup>,
        pub health: Arc<HealthChecker>,
        pub router: Router,
    }

    pub async fn harness(lookup: FakeLookup) -> Harness {
        let store = Arc::new(SqliteStore::open_in_memory().await.unwrap());
        let lookup = Arc::new(lookup);
        let health = Arc::new(HealthChecker::new().with_storage(store.clone()).with_lookup(lookup.clone()));
        let resolver = Resolver::new(store.clone(), lookup.clone());
        let router = router(AppState::new(store.clone(), resolver, health.clone()));
        Harness { store, lookup, health, router }
    }

    pub async fn send(router: &Router, uri: &str) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, body.to_vec())
    }

    pub async fn send_json(router: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let (status, _, body) = send(router, uri).await;
        let json = if body.is_empty() { serde_json::Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, json)
    }
}
