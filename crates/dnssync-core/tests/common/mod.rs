//! Test doubles and common utilities for contract tests
//!
//! This module provides an in-memory DNS API that records every call so
//! tests can assert on what the evaluator and runner did (or did not do).

#![allow(dead_code)]

use dnssync_core::config::{DnsTask, RecordSelector, RegexRule, RunnerConfig, SyncConfig};
use dnssync_core::error::{Error, Result};
use dnssync_core::traits::{AuthToken, DnsApi, Record, Zone};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One recorded `update_record` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCall {
    pub zone: String,
    pub name: String,
    pub record_type: String,
    pub old_content: String,
    pub new_content: String,
}

#[derive(Default)]
struct MockState {
    zones: Vec<Zone>,
    records: HashMap<String, Vec<Record>>,
    token: Option<AuthToken>,
    token_lifetime_secs: i64,
    token_rejected: bool,
    fail_auth: bool,
    fail_auth_on_call: Option<usize>,
    fail_zones: bool,
    fail_records: bool,
    fail_update: bool,
    auth_calls: usize,
    validate_calls: usize,
    invalidate_calls: usize,
    zones_calls: usize,
    records_calls: usize,
    updates: Vec<UpdateCall>,
}

/// An in-memory DnsApi that tracks calls
///
/// Clones share state, so a test can keep one handle while the runner owns
/// another.
#[derive(Clone)]
pub struct MockDnsApi {
    state: Arc<Mutex<MockState>>,
}

impl MockDnsApi {
    pub fn new() -> Self {
        let state = MockState {
            token_lifetime_secs: 600,
            ..MockState::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn with_zone(self, zone: &str) -> Self {
        self.state.lock().unwrap().zones.push(Zone::new(zone));
        self
    }

    pub fn with_records(self, zone: &str, records: Vec<Record>) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .insert(zone.to_string(), records);
        self
    }

    /// Tokens issued by `authenticate` expire this many seconds from now
    /// (0 issues a token without an expiry)
    pub fn with_token_lifetime(self, secs: i64) -> Self {
        self.state.lock().unwrap().token_lifetime_secs = secs;
        self
    }

    pub fn rejecting_token(self) -> Self {
        self.state.lock().unwrap().token_rejected = true;
        self
    }

    pub fn failing_auth(self) -> Self {
        self.state.lock().unwrap().fail_auth = true;
        self
    }

    /// Only the `n`th `authenticate` call (1-based) fails
    pub fn failing_auth_on_call(self, n: usize) -> Self {
        self.state.lock().unwrap().fail_auth_on_call = Some(n);
        self
    }

    pub fn failing_zones(self) -> Self {
        self.state.lock().unwrap().fail_zones = true;
        self
    }

    pub fn failing_records(self) -> Self {
        self.state.lock().unwrap().fail_records = true;
        self
    }

    pub fn failing_updates(self) -> Self {
        self.state.lock().unwrap().fail_update = true;
        self
    }

    pub fn auth_calls(&self) -> usize {
        self.state.lock().unwrap().auth_calls
    }

    pub fn validate_calls(&self) -> usize {
        self.state.lock().unwrap().validate_calls
    }

    pub fn invalidate_calls(&self) -> usize {
        self.state.lock().unwrap().invalidate_calls
    }

    pub fn zones_calls(&self) -> usize {
        self.state.lock().unwrap().zones_calls
    }

    pub fn records_calls(&self) -> usize {
        self.state.lock().unwrap().records_calls
    }

    pub fn updates(&self) -> Vec<UpdateCall> {
        self.state.lock().unwrap().updates.clone()
    }

    pub fn update_call_count(&self) -> usize {
        self.state.lock().unwrap().updates.len()
    }

    /// Current content of the first record with this name and type
    pub fn content_of(&self, zone: &str, name: &str, record_type: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(zone)?
            .iter()
            .find(|r| r.name == name && r.record_type == record_type)
            .map(|r| r.content.clone())
    }
}

#[async_trait::async_trait]
impl DnsApi for MockDnsApi {
    async fn authenticate(&self, client_id: &str, _duration_secs: u64) -> Result<AuthToken> {
        let mut state = self.state.lock().unwrap();
        state.auth_calls += 1;

        if state.fail_auth || state.fail_auth_on_call == Some(state.auth_calls) {
            return Err(Error::transport("HTTP 401 Unauthorized"));
        }

        let expires_at_epoch = if state.token_lifetime_secs == 0 {
            0
        } else {
            chrono::Utc::now().timestamp() + state.token_lifetime_secs
        };

        let token = AuthToken {
            value: format!("token-for-{}", client_id),
            expires: String::new(),
            expires_at_epoch,
            timezone: "UTC".to_string(),
        };
        state.token = Some(token.clone());
        Ok(token)
    }

    async fn validate_token(&self) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        state.validate_calls += 1;
        Ok(state.token.is_some() && !state.token_rejected)
    }

    async fn invalidate_token(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.invalidate_calls += 1;
        state.token = None;
        Ok(())
    }

    async fn current_token(&self) -> Option<AuthToken> {
        self.state.lock().unwrap().token.clone()
    }

    async fn list_zones(&self) -> Result<Vec<Zone>> {
        let mut state = self.state.lock().unwrap();
        state.zones_calls += 1;

        if state.fail_zones {
            return Err(Error::transport("HTTP 503 Service Unavailable"));
        }
        Ok(state.zones.clone())
    }

    async fn list_records(&self, zone: &str) -> Result<Vec<Record>> {
        let mut state = self.state.lock().unwrap();
        state.records_calls += 1;

        if state.fail_records {
            return Err(Error::transport("connection reset"));
        }
        Ok(state.records.get(zone).cloned().unwrap_or_default())
    }

    async fn update_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        old_content: &str,
        new_content: &str,
    ) -> Result<Record> {
        let mut state = self.state.lock().unwrap();
        state.updates.push(UpdateCall {
            zone: zone.to_string(),
            name: record_name.to_string(),
            record_type: record_type.to_string(),
            old_content: old_content.to_string(),
            new_content: new_content.to_string(),
        });

        if state.fail_update {
            return Err(Error::transport("HTTP 500 Internal Server Error"));
        }

        let record = state
            .records
            .get_mut(zone)
            .and_then(|records| {
                records.iter_mut().find(|r| {
                    r.name == record_name
                        && r.record_type == record_type
                        && r.content == old_content
                })
            })
            .ok_or_else(|| Error::transport("HTTP 404 Not Found"))?;

        record.content = new_content.to_string();
        Ok(record.clone())
    }

    async fn create_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        content: &str,
        ttl: i64,
        priority: i64,
    ) -> Result<Record> {
        let mut state = self.state.lock().unwrap();
        let record = Record {
            ttl,
            priority,
            ..Record::new(record_name, record_type, content)
        };
        state
            .records
            .entry(zone.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn delete_record(
        &self,
        zone: &str,
        record_name: &str,
        record_type: &str,
        content: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let records = state
            .records
            .get_mut(zone)
            .ok_or_else(|| Error::transport("HTTP 404 Not Found"))?;
        let before = records.len();
        records.retain(|r| {
            !(r.name == record_name && r.record_type == record_type && r.content == content)
        });
        if records.len() == before {
            return Err(Error::transport("HTTP 404 Not Found"));
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

pub fn txt(name: &str, content: &str) -> Record {
    Record::new(name, "TXT", content)
}

pub fn rule(pattern: &str, group: usize) -> RegexRule {
    RegexRule::new(pattern, group).expect("valid test pattern")
}

/// Copy task from `_acme` TXT to `www` TXT in example.com, without rules
pub fn copy_task() -> DnsTask {
    DnsTask::new(
        "example.com",
        RecordSelector::new("_acme", "TXT"),
        RecordSelector::new("www", "TXT"),
    )
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config(tasks: Vec<DnsTask>) -> SyncConfig {
    let mut runner = RunnerConfig::new("test-client");
    runner.event_channel_capacity = 100;
    SyncConfig::new(tasks, runner)
}
