//! Viewer configuration

use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable overriding the backend base URL.
pub const API_BASE_ENV: &str = "CERT_VERIFY_API_BASE";
/// Environment variable overriding the request timeout, in seconds.
pub const TIMEOUT_ENV: &str = "CERT_VERIFY_TIMEOUT_SECS";

/// Configuration for fetching and displaying certificates.
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Base URL of the verification backend.
    pub api_base: String,
    /// Path of the certificate endpoint, appended to `api_base`.
    pub endpoint_path: String,
    /// Form field carrying the verification code.
    pub code_field: String,
    /// Media type the backend must answer with.
    pub media_type: String,
    /// Watchdog for the whole request (headers and body).
    pub timeout: Duration,
    /// How long the copy alert stays visible.
    pub alert_duration: Duration,
    /// Raster scale applied to page media boxes.
    pub render_scale: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://qrback.catastrocochabamba.com".into(),
            endpoint_path: "/obtenerCertificacionPDF".into(),
            code_field: "cod".into(),
            media_type: "application/pdf".into(),
            timeout: Duration::from_secs(30),
            alert_duration: Duration::from_millis(3000),
            render_scale: 1.5,
        }
    }
}

impl ViewerConfig {
    /// Defaults, overridden by `CERT_VERIFY_API_BASE` and `CERT_VERIFY_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base) = lookup(API_BASE_ENV) {
            let base = base.trim();
            if base.is_empty() {
                return Err(Error::Config(format!("{} is empty", API_BASE_ENV)));
            }
            config.api_base = base.to_string();
        }

        if let Some(secs) = lookup(TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be a whole number of seconds, got {:?}", TIMEOUT_ENV, secs))
            })?;
            if secs == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", TIMEOUT_ENV)));
            }
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    /// Full URL of the certificate endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), self.endpoint_path)
    }
}
