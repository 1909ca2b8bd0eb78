// # DNS API Trait
//
// Defines the interface the evaluator and runner use to talk to a DNS
// provider's REST API.
//
// ## Implementations
//
// - LopDNS: `dnssync-provider-lopdns` crate
//
// ## Usage
//
// ```rust,ignore
// use dnssync_core::DnsApi;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let api = /* DnsApi implementation */;
//
//     api.authenticate("client-id", 600).await?;
//     for zone in api.list_zones().await? {
//         let records = api.list_records(&zone.name).await?;
//         println!("{}: {} records", zone.name, records.len());
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A DNS zone managed by the provider
///
/// Providers typically only report names; the SOA timers default to zero
/// and are not populated from live data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Zone name (e.g., "example.com")
    pub name: String,
    #[serde(default)]
    pub serial: u32,
    #[serde(default)]
    pub refresh: u32,
    #[serde(default)]
    pub retry: u32,
    #[serde(default)]
    pub expire: u32,
    #[serde(default)]
    pub minimum: u32,
}

impl Zone {
    /// Create a zone from its name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A DNS resource record as reported by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Record name
    #[serde(default)]
    pub name: String,

    /// Record type (A, AAAA, TXT, ...)
    #[serde(rename = "type", default)]
    pub record_type: String,

    /// Record content
    #[serde(default, alias = "data")]
    pub content: String,

    /// Time-to-live in seconds
    #[serde(default)]
    pub ttl: i64,

    /// Priority (MX/SRV)
    #[serde(rename = "prio", alias = "priority", default)]
    pub priority: i64,
}

impl Record {
    /// Create a record with zero TTL and priority
    pub fn new(
        name: impl Into<String>,
        record_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            content: content.into(),
            ttl: 0,
            priority: 0,
        }
    }
}

/// Authentication token issued by the provider
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the token value.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    /// Token value sent with every authenticated call
    /// ⚠️ NEVER log this value
    #[serde(rename = "token", default)]
    pub value: String,

    /// Human readable expiry as reported by the provider
    #[serde(default)]
    pub expires: String,

    /// Expiry as a Unix timestamp (seconds); 0 when unknown
    #[serde(rename = "epochExpires", default)]
    pub expires_at_epoch: i64,

    /// Timezone of `expires`
    #[serde(rename = "tz", default)]
    pub timezone: String,
}

impl AuthToken {
    /// Safety margin applied by expiry checks (in seconds)
    pub const DEFAULT_EXPIRY_MARGIN_SECS: i64 = 30;

    /// Whether the token is expired, or about to expire, at `now_epoch`
    ///
    /// Fails closed: an empty token or a token without a recorded expiry
    /// counts as expired.
    pub fn is_expired_at(&self, now_epoch: i64, min_time_left_secs: i64) -> bool {
        if self.value.is_empty() || self.expires_at_epoch <= 0 {
            return true;
        }
        now_epoch > self.expires_at_epoch - min_time_left_secs
    }

    /// Whether the token is expired, or about to expire, now
    pub fn is_expired(&self, min_time_left_secs: i64) -> bool {
        self.is_expired_at(Utc::now().timestamp(), min_time_left_secs)
    }

    /// Expiry as a timestamp, when known
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        if self.expires_at_epoch <= 0 {
            return None;
        }
        DateTime::from_timestamp(self.expires_at_epoch, 0)
    }
}

// Custom Debug implementation that hides the token value
impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthToken")
            .field("value", &"<REDACTED>")
            .field("expires", &self.expires)
            .field("expires_at_epoch", &self.expires_at_epoch)
            .field("timezone", &self.timezone)
            .finish()
    }
}

/// Trait for DNS provider API clients
///
/// Implementations own the transport and the current auth token. Every
/// failure is returned as an [`Error`](crate::Error); implementations never
/// panic on provider or network errors.
///
/// # Responsibilities
///
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Decode provider responses into [`Zone`] and [`Record`]
/// - ✅ Keep the token obtained by [`DnsApi::authenticate`]
/// - ❌ Retry or back off (a failed call ends the task for this cycle)
/// - ❌ Cache records between calls
/// - ❌ Decide whether an update is needed (owned by `TaskEvaluator`)
#[async_trait]
pub trait DnsApi: Send + Sync {
    /// Request a new token and keep it for subsequent calls
    ///
    /// # Parameters
    ///
    /// - `client_id`: Client ID issued by the provider
    /// - `duration_secs`: Requested token lifetime
    async fn authenticate(&self, client_id: &str, duration_secs: u64) -> Result<AuthToken>;

    /// Ask the provider whether the current token is valid
    ///
    /// Returns `Ok(false)` without a network call when the token is expired.
    async fn validate_token(&self) -> Result<bool>;

    /// Revoke the current token
    async fn invalidate_token(&self) -> Result<()>;

    /// The token obtained by the last successful authentication
    async fn current_token(&self) -> Option<AuthToken>;

    /// List zones managed by the account
    async fn list_zones(&self) -> Result<Vec<Zone>>;

    /// List all records of a zone, in provider order
    async fn list_records(&self, zone: &str) -> Result<Vec<Record>>;

    /// Replace the content of one record
    ///
    /// # Parameters
    ///
    /// - `zone`: Zone holding the record
    /// - `record_name`: Record name
    /// - `record_type`: Record type, used by the provider to pick the record
    /// - `old_content`: Current content, used by the provider to pick the record
    /// - `new_content`: Content to write
    ///
    /// # Returns
    ///
    /// The record as reported back by the provider, or the written values
    /// when the provider's answer does not describe a record
    async fn update_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        old_content: &str,
        new_content: &str,
    ) -> Result<Record>;

    /// Add a record to a zone
    async fn create_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        content: &str,
        ttl: i64,
        priority: i64,
    ) -> Result<Record>;

    /// Remove the record matching name, type and content
    async fn delete_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        content: &str,
    ) -> Result<()>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;

    /// Whether the current token is missing, expired or about to expire
    async fn is_token_expired(&self, min_time_left_secs: i64) -> bool {
        match self.current_token().await {
            Some(token) => token.is_expired(min_time_left_secs),
            None => true,
        }
    }
}
