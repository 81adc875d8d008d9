//! Runtime configuration for the importer.

use secrecy::SecretString;
use url::Url;

use crate::error::AppError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const MAX_CONCURRENCY: usize = 8;

/// Where the platform API lives and how to talk to it.
#[derive(Clone)]
pub struct AppConfig {
    /// Base URL; endpoint paths such as `/api/questions` are joined onto it.
    pub api_url: Url,
    pub api_token: Option<SecretString>,
    pub timeout_secs: u64,
    /// Maximum in-flight single-create requests on the JSON path.
    pub concurrency: usize,
    /// Cosmetic pause before a scan starts.
    pub scan_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_url", &self.api_url.as_str())
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("concurrency", &self.concurrency)
            .field("scan_delay_ms", &self.scan_delay_ms)
            .finish()
    }
}

impl AppConfig {
    /// Config with defaults for everything but the base URL.
    pub fn new(api_url: Url) -> Self {
        Self {
            api_url,
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            concurrency: DEFAULT_CONCURRENCY,
            scan_delay_ms: 0,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.api_token = if token.trim().is_empty() {
            None
        } else {
            Some(SecretString::from(token))
        };
        self
    }

    /// Parses `api_url` and applies it over the defaults.
    pub fn from_url(api_url: &str) -> Result<Self, AppError> {
        let url = Url::parse(api_url)
            .map_err(|e| AppError::Config(format!("Invalid API URL: {}", e)))?;
        let config = Self::new(url);
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// `AppError::Config` for a non-http(s) URL, a zero timeout, or a
    /// concurrency outside `1..=MAX_CONCURRENCY`.
    pub fn validate(&self) -> Result<(), AppError> {
        match self.api_url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(AppError::Config(format!(
                    "API URL must use http or https, got '{}'",
                    other
                )))
            }
        }
        if self.timeout_secs == 0 {
            return Err(AppError::Config("timeout must be at least 1 second".into()));
        }
        if !(1..=MAX_CONCURRENCY).contains(&self.concurrency) {
            return Err(AppError::Config(format!(
                "concurrency must be between 1 and {}, got {}",
                MAX_CONCURRENCY, self.concurrency
            )));
        }
        Ok(())
    }
}
