//! Build and runtime metadata reported by `GET /` and `version`.

use serde::Serialize;

pub const SERVICE_NAME: &str = "Correios CEP Admin (API)";

#[derive(Debug, Clone, Serialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
    pub commit: &'static str,
    pub build_time: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub runtime_version: &'static str,
}

impl BuildInfo {
    /// Metadata of the running binary. Commit, build time and compiler
    /// version come from `CORREIOS_CEP_COMMIT`, `CORREIOS_CEP_BUILD_TIME`
    /// and `CORREIOS_CEP_RUSTC_VERSION` at compile time.
    pub fn current() -> Self {
        Self {
            service: SERVICE_NAME,
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("CORREIOS_CEP_COMMIT").unwrap_or(""),
            build_time: option_env!("CORREIOS_CEP_BUILD_TIME").unwrap_or(""),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            runtime_version: option_env!("CORREIOS_CEP_RUSTC_VERSION").unwrap_or("unknown"),
        }
    }
}
