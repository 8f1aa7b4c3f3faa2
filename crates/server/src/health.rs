//! Periodic dependency health checks.
//!
//! Each registered check runs on its own interval in a background task and
//! records its latest outcome. Checks start out failing until their first
//! run completes, so `/health` never reports a dependency it has not probed.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use correios_cep_core::{AddressLookup, Error, Storage};
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::task::JoinHandle;

/// Period of the Correios reachability check.
pub const CORREIOS_CHECK_PERIOD: Duration = Duration::from_secs(120);

/// Period of the database check.
pub const DATABASE_CHECK_PERIOD: Duration = Duration::from_secs(10);

const NOT_RUN_YET: &str = "didn't run yet";

/// Health check function type.
pub type CheckFn = Arc<dyn Fn() -> BoxFuture<'static, Result<(), Error>> + Send + Sync>;

/// Latest outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
}

impl CheckResult {
    fn pending() -> Self {
        Self { healthy: false, error: Some(NOT_RUN_YET.to_string()), last_checked: None }
    }
}

struct Check {
    name: &'static str,
    period: Duration,
    run: CheckFn,
}

/// Registry of named checks and their latest results.
#[derive(Default)]
pub struct HealthChecker {
    checks: Vec<Check>,
    results: RwLock<BTreeMap<&'static str, CheckResult>>,
}

impl std::fmt::Debug for HealthChecker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<_> = self.checks.iter().map(|c| c.name).collect();
        f.debug_struct("HealthChecker").field("checks", &names).finish_non_exhaustive()
    }
}

impl HealthChecker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under `name`, run every `period`.
    pub fn register(mut self, name: &'static str, period: Duration, run: CheckFn) -> Self {
        let results = match self.results.get_mut() {
            Ok(results) => results,
            Err(poisoned) => poisoned.into_inner(),
        };
        results.insert(name, CheckResult::pending());
        self.checks.push(Check { name, period, run });
        self
    }

    /// Register the storage liveness probe as `database`.
    pub fn with_storage(self, storage: Arc<dyn Storage>) -> Self {
        let run: CheckFn = Arc::new(move || {
            let storage = storage.clone();
            async move { storage.check().await }.boxed()
        });
        self.register("database", DATABASE_CHECK_PERIOD, run)
    }

    /// Register the external lookup probe as `correios`.
    pub fn with_lookup(self, lookup: Arc<dyn AddressLookup>) -> Self {
        let run: CheckFn = Arc::new(move || {
            let lookup = lookup.clone();
            async move { lookup.check().await }.boxed()
        });
        self.register("correios", CORREIOS_CHECK_PERIOD, run)
    }

    /// Snapshot of all results and whether every check passed.
    pub fn results(&self) -> (BTreeMap<&'static str, CheckResult>, bool) {
        let results = match self.results.read() {
            Ok(results) => results.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let healthy = results.values().all(|r| r.healthy);
        (results, healthy)
    }

    /// Run every check once, in order.
    pub async fn run_checks(&self) {
        for check in &self.checks {
            self.run_one(check).await;
        }
    }

    async fn run_one(&self, check: &Check) {
        let result = match (check.run)().await {
            Ok(()) => CheckResult { healthy: true, error: None, last_checked: Some(Utc::now()) },
            Err(e) => {
                tracing::warn!(check = check.name, error = %e, "health check failed");
                CheckResult { healthy: false, error: Some(e.to_string()), last_checked: Some(Utc::now()) }
            }
        };

        let mut results = match self.results.write() {
            Ok(results) => results,
            Err(poisoned) => poisoned.into_inner(),
        };
        results.insert(check.name, result);
    }

    /// Spawn one periodic task per check. The first run happens immediately.
    ///
    /// Tasks run until aborted.
    pub fn start(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        (0..self.checks.len())
            .map(|idx| {
                let checker = Arc::clone(self);
                tokio::spawn(async move {
                    let check = &checker.checks[idx];
                    let mut interval = tokio::time::interval(check.period);
                    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    loop {
                        interval.tick().await;
                        checker.run_one(check).await;
                    }
                })
            })
            .collect()
    }
}
