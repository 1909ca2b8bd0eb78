//! Connection settings for the LopDNS API

use dnssync_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://api.lopdns.se/v2/";

/// Where and how to reach the LopDNS API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LopDnsConfig {
    /// API root; a trailing slash is optional
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl LopDnsConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let rest = self
            .base_url
            .strip_prefix("https://")
            .or_else(|| self.base_url.strip_prefix("http://"))
            .ok_or_else(|| {
                Error::config(format!(
                    "base URL must start with http:// or https://, got {:?}",
                    self.base_url
                ))
            })?;

        if rest.trim_matches('/').is_empty() {
            return Err(Error::config("base URL has no host"));
        }

        if self.timeout_secs == 0 {
            return Err(Error::config("timeout must be > 0"));
        }

        Ok(())
    }
}

impl Default for LopDnsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}
