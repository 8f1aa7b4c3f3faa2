//! Server bootstrap and lifecycle.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use correios_cep_client::{CorreiosClient, CorreiosConfig};
use correios_cep_core::{AddressLookup, AppConfig, Error, Kind, Op, Resolver, SqliteStore, Storage};
use tokio::net::TcpListener;

use crate::health::HealthChecker;
use crate::routes::{self, AppState};

/// Wired application: store, external client, health checks and router
/// state.
pub struct Server {
    addr: SocketAddr,
    storage: Arc<dyn Storage>,
    health: Arc<HealthChecker>,
    state: AppState,
}

impl Server {
    /// Assemble a server from its parts.
    pub fn new(addr: SocketAddr, storage: Arc<dyn Storage>, lookup: Arc<dyn AddressLookup>) -> Self {
        let health = Arc::new(HealthChecker::new().with_lookup(lookup.clone()).with_storage(storage.clone()));
        let resolver = Resolver::new(storage.clone(), lookup);
        let state = AppState::new(storage.clone(), resolver, health.clone());
        Self { addr, storage, health, state }
    }

    /// Open the database and build the Correios client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is invalid, the database cannot
    /// be opened or the HTTP client cannot be built.
    pub async fn from_config(config: &AppConfig) -> Result<Self, Error> {
        const OP: Op = "server.from_config";

        let addr: SocketAddr = config
            .addr
            .parse()
            .map_err(|e| Error::wrap(OP, e).with_kind(Kind::BadRequest))?;

        let storage = SqliteStore::open(&config.database_url).await.map_err(|e| Error::wrap(OP, e))?;
        let lookup = CorreiosClient::new(CorreiosConfig::from(config)).map_err(|e| e.into_error(OP))?;

        Ok(Self::new(addr, Arc::new(storage), Arc::new(lookup)))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Bind the configured address and serve until Ctrl-C or SIGTERM.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self) -> Result<(), Error> {
        const OP: Op = "server.run";

        let listener = TcpListener::bind(self.addr).await.map_err(|e| Error::wrap(OP, e))?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, then stop the health
    /// checks and close the store.
    ///
    /// # Errors
    ///
    /// Returns an error if serving fails. A failure to close the store is
    /// logged.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        const OP: Op = "server.serve";

        let local = listener.local_addr().map_err(|e| Error::wrap(OP, e))?;
        let build = &self.state.build;
        tracing::info!(addr = %local, version = build.version, "{}: starting HTTP server", build.service);

        let checks = self.health.start();
        let router = routes::router(self.state.clone());

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::wrap(OP, e));

        tracing::info!("{}: stopping HTTP server", self.state.build.service);
        checks.iter().for_each(|handle| handle.abort());

        if let Err(e) = self.storage.close().await {
            tracing::error!(error = %e, "failed to close storage");
        }

        served
    }
}

/// Resolves on Ctrl-C or, on Unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
