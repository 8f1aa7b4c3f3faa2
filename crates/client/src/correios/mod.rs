//! Correios "busca CEP" client.
//!
//! Looks up postal codes against the public Correios details endpoint and
//! normalizes the answer into an [`Address`].
//!
//! ### Protocol
//!
//! - **Lookup**: `POST {base}/app/consulta/html/consulta-detalhes-cep.php`
//!   with form field `cep`, `Accept: application/json` and `Referer: {base}`.
//! - **Check**: `HEAD` on the same path; anything but 200 is a failure.
//! - **Retries**: transport failures (timeouts, refused connections) are
//!   retried with a linear backoff. Status errors are returned as is.

pub mod error;
pub mod response;

pub use error::CorreiosError;
pub use response::{Dado, LookupResponse};

use std::time::{Duration, Instant};

use async_trait::async_trait;
use correios_cep_core::config::DEFAULT_CORREIOS_BASE_URL;
use correios_cep_core::{Address, AddressLookup, AppConfig, Error, Op};
use reqwest::{StatusCode, header};
use url::Url;

/// Path of the details endpoint, relative to the base URL.
pub const LOOKUP_PATH: &str = "/app/consulta/html/consulta-detalhes-cep.php";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default retries for transport failures.
const DEFAULT_RETRY_COUNT: u32 = 3;

/// Default user agent.
const DEFAULT_USER_AGENT: &str = concat!("correios-cep/", env!("CARGO_PKG_VERSION"));

/// Delay before the first retry; each further retry waits one step longer.
const RETRY_BACKOFF: Duration = Duration::from_millis(250);

/// Correios client configuration.
#[derive(Debug, Clone)]
pub struct CorreiosConfig {
    /// Base URL (default: https://buscacepinter.correios.com.br).
    pub base_url: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// Retries after a transport failure (default: 3).
    pub retry_count: u32,
    /// User-agent string (default: correios-cep/0.x).
    pub user_agent: String,
}

impl Default for CorreiosConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CORREIOS_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&AppConfig> for CorreiosConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.correios_base_url.clone(),
            timeout: config.timeout(),
            retry_count: config.retry_count,
            user_agent: config.user_agent.clone(),
        }
    }
}

/// Correios lookup client.
#[derive(Debug, Clone)]
pub struct CorreiosClient {
    http: reqwest::Client,
    config: CorreiosConfig,
    lookup_url: Url,
}

impl CorreiosClient {
    /// Create a new client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// cannot be built.
    pub fn new(config: CorreiosConfig) -> Result<Self, CorreiosError> {
        let base = Url::parse(&config.base_url).map_err(|e| CorreiosError::InvalidBaseUrl(e.to_string()))?;
        let lookup_url = base.join(LOOKUP_PATH).map_err(|e| CorreiosError::InvalidBaseUrl(e.to_string()))?;

        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));
        headers.insert(
            header::REFERER,
            header::HeaderValue::from_str(&config.base_url)
                .map_err(|e| CorreiosError::InvalidBaseUrl(e.to_string()))?,
        );

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .build()
            .map_err(CorreiosError::Network)?;

        Ok(Self { http, config, lookup_url })
    }

    pub fn config(&self) -> &CorreiosConfig {
        &self.config
    }

    /// Send a request built by `build`, retrying transport failures.
    async fn send_with_retry<F>(&self, build: F) -> Result<reqwest::Response, CorreiosError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0;
        loop {
            match build().send().await.map_err(CorreiosError::from) {
                Ok(resp) => return Ok(resp),
                Err(e) if e.is_transient() && attempt < self.config.retry_count => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %e, "correios request failed, retrying");
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Fetch and decode the raw response for `cep`.
    ///
    /// # Errors
    ///
    /// Transport failures after all retries, non-200 statuses and bodies
    /// that are not the expected JSON.
    pub async fn fetch(&self, cep: &str) -> Result<LookupResponse, CorreiosError> {
        let start = Instant::now();
        tracing::debug!(cep, "querying correios");

        let resp = self
            .send_with_retry(|| self.http.post(self.lookup_url.clone()).form(&[("cep", cep)]))
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(CorreiosError::HttpError { method: "POST", path: LOOKUP_PATH, status: status.as_u16() });
        }

        let bytes = resp.bytes().await?;
        let body: LookupResponse = serde_json::from_slice(&bytes).map_err(|e| CorreiosError::Parse(e.to_string()))?;

        tracing::debug!(cep, total = body.dados.len(), elapsed = ?start.elapsed(), "correios responded");
        if body.erro {
            tracing::debug!(cep, mensagem = %body.mensagem, "correios reported an error");
        }

        Ok(body)
    }
}

#[async_trait]
impl AddressLookup for CorreiosClient {
    async fn check(&self) -> Result<(), Error> {
        const OP: Op = "correios.check";

        let resp = self
            .send_with_retry(|| self.http.head(self.lookup_url.clone()))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to check correios");
                e.into_error(OP)
            })?;

        if resp.status() != StatusCode::OK {
            let err = CorreiosError::HttpError { method: "HEAD", path: LOOKUP_PATH, status: resp.status().as_u16() };
            tracing::error!(error = %err, "failed to check correios");
            return Err(err.into_error(OP));
        }

        Ok(())
    }

    async fn lookup(&self, cep: &str) -> Result<Address, Error> {
        const OP: Op = "correios.lookup";

        let body = self.fetch(cep).await.map_err(|e| {
            tracing::error!(cep, error = %e, "failed to lookup address");
            e.into_error(OP)
        })?;

        body.into_address(cep)
            .ok_or_else(|| CorreiosError::NotFound(cep.to_string()).into_error(OP))
    }
}
