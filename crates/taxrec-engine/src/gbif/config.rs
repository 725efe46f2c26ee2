// GBIF backbone HTTP configuration

use serde::{Deserialize, Serialize};

/// Default base URL of the GBIF v1 API
pub const DEFAULT_GBIF_BASE_URL: &str = "https://api.gbif.org/v1";

/// Default HTTP timeout in seconds
pub const DEFAULT_GBIF_TIMEOUT_SECS: u64 = 30;

/// Configuration for the backbone lookup client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbifConfig {
    /// Base URL of the backbone API, without a trailing slash
    pub base_url: String,

    /// HTTP timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for GbifConfig {
    fn default() -> Self {
        GbifConfig {
            base_url: DEFAULT_GBIF_BASE_URL.to_string(),
            timeout_secs: DEFAULT_GBIF_TIMEOUT_SECS,
            user_agent: format!("taxrec/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GbifConfig {
    /// Load configuration from environment variables
    ///
    /// - `GBIF_API_BASE_URL`: backbone base URL
    /// - `GBIF_TIMEOUT_SECS`: HTTP timeout in seconds
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("GBIF_API_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(timeout) = std::env::var("GBIF_TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().unwrap_or(DEFAULT_GBIF_TIMEOUT_SECS);
        }

        config
    }

    /// Point the client at a specific server (used by tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("base_url cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be positive".to_string());
        }
        Ok(())
    }
}
