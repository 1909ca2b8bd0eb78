//! LopDNS implementation of [`DnsApi`]

use async_trait::async_trait;
use dnssync_core::traits::{AuthToken, DnsApi, Record, Zone};
use dnssync_core::{Error, Result};
use serde_json::{Value, json};
use tokio::sync::RwLock;

use crate::config::LopDnsConfig;
use crate::transport::RestTransport;

/// LopDNS API client
///
/// Holds the current token; every authenticated call sends it in the
/// `x-token` header.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the token.
pub struct LopDnsClient {
    transport: RestTransport,

    /// Current token
    /// ⚠️ NEVER log this value
    token: RwLock<Option<AuthToken>>,
}

// Custom Debug implementation that hides the token
impl std::fmt::Debug for LopDnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopDnsClient")
            .field("transport", &self.transport)
            .field("token", &"<REDACTED>")
            .finish()
    }
}

impl LopDnsClient {
    /// Create a client without a token
    ///
    /// # Errors
    ///
    /// `Error::Config` when the settings are invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &LopDnsConfig) -> Result<Self> {
        Ok(Self {
            transport: RestTransport::new(config)?,
            token: RwLock::new(None),
        })
    }

    /// Value for the `x-token` header
    async fn token_value(&self) -> Result<String> {
        self.token
            .read()
            .await
            .as_ref()
            .map(|t| t.value.clone())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::auth("not authenticated"))
    }

    async fn get_authenticated(&self, path: &str) -> Result<Value> {
        let token = self.token_value().await?;
        self.transport
            .get(path, &[("x-token", token.as_str())], &[])
            .await
    }
}

#[async_trait]
impl DnsApi for LopDnsClient {
    /// Request a new token
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /auth/token?duration=600
    /// x-clientid: <client id>
    /// ```
    async fn authenticate(&self, client_id: &str, duration_secs: u64) -> Result<AuthToken> {
        if client_id.is_empty() {
            return Err(Error::config("client id is required"));
        }

        let response = self
            .transport
            .get(
                "/auth/token",
                &[("x-clientid", client_id)],
                &[("duration", duration_secs.to_string())],
            )
            .await?;

        let token: AuthToken = serde_json::from_value(response)
            .map_err(|e| Error::auth(format!("unexpected token response: {}", e)))?;

        if token.value.is_empty() {
            return Err(Error::auth("token response did not contain a token"));
        }

        tracing::debug!(
            "Token issued, expires {} {} (epoch {})",
            token.expires,
            token.timezone,
            token.expires_at_epoch
        );

        *self.token.write().await = Some(token.clone());
        Ok(token)
    }

    /// Check the current token with the provider
    ///
    /// An expired token is reported invalid without a network call. A 2xx
    /// answer only counts as valid when the body carries `"valid": true`.
    async fn validate_token(&self) -> Result<bool> {
        if self
            .is_token_expired(AuthToken::DEFAULT_EXPIRY_MARGIN_SECS)
            .await
        {
            tracing::debug!("Token expired, skipping validation call");
            return Ok(false);
        }

        match self.get_authenticated("/auth/validate").await {
            Ok(body) => Ok(body.get("valid").and_then(Value::as_bool).unwrap_or(false)),
            Err(Error::Authentication(msg)) => {
                tracing::warn!("Token rejected: {}", msg);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn invalidate_token(&self) -> Result<()> {
        if self
            .is_token_expired(AuthToken::DEFAULT_EXPIRY_MARGIN_SECS)
            .await
        {
            tracing::debug!("Token already expired, nothing to invalidate");
            return Ok(());
        }

        self.get_authenticated("/auth/invalidate").await?;
        *self.token.write().await = None;

        tracing::debug!("Token invalidated");
        Ok(())
    }

    async fn current_token(&self) -> Option<AuthToken> {
        self.token.read().await.clone()
    }

    /// List the zones of the account
    ///
    /// The API answers with an object keyed by zone name.
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let response = self.get_authenticated("/zones").await?;
        parse_zones(response)
    }

    async fn list_records(&self, zone: &str) -> Result<Vec<Record>> {
        let response = self
            .get_authenticated(&format!("/records/{}", zone))
            .await?;
        Ok(parse_records(zone, response))
    }

    /// Replace the content of one record
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /records/example.com
    /// {"oldName": "www", "matchingType": "TXT", "oldValue": "old", "newValue": "new"}
    /// ```
    async fn update_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        old_content: &str,
        new_content: &str,
    ) -> Result<Record> {
        let token = self.token_value().await?;
        let body = json!({
            "oldName": record_name,
            "matchingType": record_type,
            "oldValue": old_content,
            "newValue": new_content,
        });

        let response = self
            .transport
            .put(
                &format!("/records/{}", zone),
                &[("x-token", token.as_str())],
                &body,
            )
            .await?;

        Ok(record_from_response(
            response,
            Record::new(record_name, record_type, new_content),
        ))
    }

    /// Add a record to a zone
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /records/example.com
    /// {"name": "www", "type": "TXT", "value": "v=1", "ttl": 3600, "priority": 0}
    /// ```
    async fn create_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        content: &str,
        ttl: i64,
        priority: i64,
    ) -> Result<Record> {
        let token = self.token_value().await?;
        let body = json!({
            "name": record_name,
            "type": record_type,
            "value": content,
            "ttl": ttl,
            "priority": priority,
        });

        let response = self
            .transport
            .post(
                &format!("/records/{}", zone),
                &[("x-token", token.as_str())],
                &body,
            )
            .await?;

        let mut fallback = Record::new(record_name, record_type, content);
        fallback.ttl = ttl;
        fallback.priority = priority;
        Ok(record_from_response(response, fallback))
    }

    /// Remove a record from a zone
    ///
    /// # API Call
    ///
    /// ```http
    /// DELETE /records/example.com
    /// {"name": "www", "type": "TXT", "value": "v=1"}
    /// ```
    async fn delete_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        content: &str,
    ) -> Result<()> {
        let token = self.token_value().await?;
        let body = json!({
            "name": record_name,
            "type": record_type,
            "value": content,
        });

        self.transport
            .delete(
                &format!("/records/{}", zone),
                &[("x-token", token.as_str())],
                &body,
            )
            .await?;

        tracing::debug!("Deleted {} record {} in zone {}", record_type, record_name, zone);
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "lopdns"
    }
}

/// Normalize a `/zones` response into zones
///
/// Accepts an object keyed by zone name, an array of names, or an array of
/// objects with a `name` field.
fn parse_zones(response: Value) -> Result<Vec<Zone>> {
    match response {
        Value::Object(map) => Ok(map.into_iter().map(|(name, _)| Zone::new(name)).collect()),
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(name) => Some(Zone::new(name)),
                Value::Object(obj) => obj
                    .get("name")
                    .and_then(Value::as_str)
                    .map(Zone::new),
                other => {
                    tracing::warn!("Skipping malformed zone entry: {}", other);
                    None
                }
            })
            .collect()),
        other => Err(Error::transport(format!(
            "unexpected zones response: {}",
            other
        ))),
    }
}

/// Decode a `/records/{zone}` response, skipping malformed items
fn parse_records(zone: &str, response: Value) -> Vec<Record> {
    let Value::Array(items) = response else {
        tracing::warn!("Records response for zone {} is not a list, treating as empty", zone);
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Record>(item) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed record in zone {}: {}", zone, e);
                None
            }
        })
        .collect()
}

/// Read the record echoed by a successful write
///
/// The write already succeeded once the server answered 2xx, so a body that
/// does not decode as a record yields `fallback` instead of an error.
fn record_from_response(response: Value, fallback: Record) -> Record {
    if response.is_null() {
        return fallback;
    }

    match serde_json::from_value::<Record>(response) {
        Ok(record) if !record.name.is_empty() => record,
        Ok(_) => {
            tracing::debug!("Write response carries no record, using request values");
            fallback
        }
        Err(e) => {
            tracing::debug!("Write response is not a record ({}), using request values", e);
            fallback
        }
    }
}
