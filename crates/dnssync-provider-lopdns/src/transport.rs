//! HTTP transport for the LopDNS REST API
//!
//! Joins paths onto the base URL, attaches headers, query parameters and
//! JSON bodies, and turns every non-2xx answer into an [`Error`].

use std::time::Duration;

use dnssync_core::{Error, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde_json::Value;

use crate::config::LopDnsConfig;

/// Sent with every request
pub const USER_AGENT: &str = concat!("dnssync/", env!("CARGO_PKG_VERSION"));

/// Thin wrapper around `reqwest::Client` bound to one API root
#[derive(Debug, Clone)]
pub struct RestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl RestTransport {
    /// Build a transport from validated settings
    pub fn new(config: &LopDnsConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Absolute URL for an API path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET` a path
    pub async fn get(
        &self,
        path: &str,
        headers: &[(&str, &str)],
        query: &[(&str, String)],
    ) -> Result<Value> {
        let request = self.request(Method::GET, path, headers).query(query);
        self.send(request, Method::GET, path).await
    }

    /// `PUT` a JSON body to a path
    pub async fn put(&self, path: &str, headers: &[(&str, &str)], body: &Value) -> Result<Value> {
        let request = self.request(Method::PUT, path, headers).json(body);
        self.send(request, Method::PUT, path).await
    }

    /// `POST` a JSON body to a path
    pub async fn post(&self, path: &str, headers: &[(&str, &str)], body: &Value) -> Result<Value> {
        let request = self.request(Method::POST, path, headers).json(body);
        self.send(request, Method::POST, path).await
    }

    /// `DELETE` with a JSON body
    pub async fn delete(&self, path: &str, headers: &[(&str, &str)], body: &Value) -> Result<Value> {
        let request = self.request(Method::DELETE, path, headers).json(body);
        self.send(request, Method::DELETE, path).await
    }

    fn request(&self, method: Method, path: &str, headers: &[(&str, &str)]) -> RequestBuilder {
        headers
            .iter()
            .fold(self.client.request(method, self.url(path)), |request, (name, value)| {
                request.header(*name, *value)
            })
    }

    /// Send a request and decode the body
    ///
    /// JSON bodies are parsed; anything else comes back as a string and an
    /// empty body as `Value::Null`.
    async fn send(&self, request: RequestBuilder, method: Method, path: &str) -> Result<Value> {
        tracing::debug!("{} {}", method, path);

        let response = request
            .send()
            .await
            .map_err(|e| Error::transport(format!("{} {} failed: {}", method, path, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, &method, path, &error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("{} {}: failed to read body: {}", method, path, e)))?;

        tracing::debug!("{} {} -> {} ({} bytes)", method, path, status, body.len());

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body).unwrap_or(Value::String(body)))
    }
}

/// Map a non-2xx status to an error
fn status_error(status: StatusCode, method: &Method, path: &str, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "{} {} rejected: invalid client id or token. Status: {}",
            method, path, status
        )),
        404 => Error::transport(format!("{} {}: not found. Status: {}", method, path, status)),
        429 => Error::transport(format!(
            "{} {}: rate limit exceeded. Status: {}",
            method, path, status
        )),
        500..=599 => Error::transport(format!(
            "{} {}: server error: {} - {}",
            method, path, status, body
        )),
        _ => Error::transport(format!("{} {} failed: {} - {}", method, path, status, body)),
    }
}
