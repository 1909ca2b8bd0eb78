//! Configuration types for the DNS sync system
//!
//! This module defines the task file schema (`{"dnsTasks": [...]}`) and the
//! runner settings. Regex patterns are compiled while the task file is
//! deserialized, so an invalid pattern fails at load time rather than on
//! the first polling cycle.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Complete configuration handed to the runner
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Tasks evaluated on every cycle, in order
    pub tasks: Vec<DnsTask>,

    /// Loop and credential settings
    pub runner: RunnerConfig,
}

impl SyncConfig {
    /// Create a new configuration
    pub fn new(tasks: Vec<DnsTask>, runner: RunnerConfig) -> Self {
        Self { tasks, runner }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(Error::config("No tasks configured"));
        }

        for task in &self.tasks {
            task.validate()?;
        }

        self.runner.validate()
    }
}

/// Task file as stored on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFile {
    /// Configured synchronization tasks
    #[serde(rename = "dnsTasks", default)]
    pub dns_tasks: Vec<DnsTask>,
}

impl TaskFile {
    /// Parse a task file from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a task file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }

    /// Validate every task in the file
    pub fn validate(&self) -> Result<()> {
        if self.dns_tasks.is_empty() {
            return Err(Error::config("No tasks configured in dnsTasks"));
        }

        for task in &self.dns_tasks {
            task.validate()?;
        }

        Ok(())
    }
}

/// How a task obtains the value it writes into the target record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    /// Copy the (extracted) source content into the target
    #[default]
    CopyRecordContent,
    /// Same as copy; the target's replace rule splices the value in
    UpdateRecordContentRegex,
    /// Write externally supplied static content into the target
    UpdateRecordContentStatic,
}

impl TaskType {
    /// Whether this task type reads a source record from the zone
    pub fn uses_source_record(&self) -> bool {
        !matches!(self, TaskType::UpdateRecordContentStatic)
    }
}

/// One synchronization task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsTask {
    /// Optional label used in logs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Zone holding both records
    pub zone: String,

    /// Record the value is read from (unused for static tasks)
    #[serde(default)]
    pub source_record: RecordSelector,

    /// Record whose content gets updated
    pub target_record: RecordSelector,

    /// Task type
    #[serde(default)]
    pub task_type: TaskType,

    /// Compute and log the update without writing it
    #[serde(default)]
    pub dry_run: bool,
}

impl DnsTask {
    /// Create a new copy task
    pub fn new(zone: impl Into<String>, source: RecordSelector, target: RecordSelector) -> Self {
        Self {
            name: None,
            zone: zone.into(),
            source_record: source,
            target_record: target,
            task_type: TaskType::CopyRecordContent,
            dry_run: false,
        }
    }

    /// Set the task type
    pub fn with_task_type(mut self, task_type: TaskType) -> Self {
        self.task_type = task_type;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the log label
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Human readable identity for log lines
    pub fn label(&self) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }

        match self.task_type {
            TaskType::UpdateRecordContentStatic => format!(
                "{}: static -> {} {}",
                self.zone, self.target_record.record_type, self.target_record.name
            ),
            _ => format!(
                "{}: {} {} -> {} {}",
                self.zone,
                self.source_record.record_type,
                self.source_record.name,
                self.target_record.record_type,
                self.target_record.name
            ),
        }
    }

    /// Validate the task
    pub fn validate(&self) -> Result<()> {
        if self.zone.trim().is_empty() {
            return Err(Error::config("Task zone cannot be empty"));
        }

        self.target_record
            .validate()
            .map_err(|e| Error::config(format!("{}: targetRecord: {}", self.zone, e)))?;

        if self.task_type.uses_source_record() {
            self.source_record
                .validate()
                .map_err(|e| Error::config(format!("{}: sourceRecord: {}", self.zone, e)))?;
        }

        Ok(())
    }
}

/// Locates a record in a zone and describes how to read/rewrite its content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordSelector {
    /// Record name as returned by the provider
    #[serde(default)]
    pub name: String,

    /// Record type (A, AAAA, TXT, ...)
    #[serde(rename = "type", default)]
    pub record_type: String,

    /// Content must match this rule for the record to qualify
    #[serde(
        rename = "contentMatchRegEx",
        alias = "matchRule",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub match_rule: Option<RegexRule>,

    /// Pulls the comparison value out of the content
    #[serde(
        rename = "contentDataExtractRegEx",
        alias = "extractRule",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub extract_rule: Option<RegexRule>,

    /// Span(s) of the old content replaced by the new value
    #[serde(
        rename = "contentReplaceRegEx",
        alias = "replaceRule",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub replace_rule: Option<RegexRule>,
}

impl RecordSelector {
    /// Create a selector without rules
    pub fn new(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.into(),
            ..Self::default()
        }
    }

    /// Set the match rule
    pub fn with_match_rule(mut self, rule: RegexRule) -> Self {
        self.match_rule = Some(rule);
        self
    }

    /// Set the extract rule
    pub fn with_extract_rule(mut self, rule: RegexRule) -> Self {
        self.extract_rule = Some(rule);
        self
    }

    /// Set the replace rule
    pub fn with_replace_rule(mut self, rule: RegexRule) -> Self {
        self.replace_rule = Some(rule);
        self
    }

    fn validate(&self) -> std::result::Result<(), &'static str> {
        if self.name.is_empty() {
            return Err("record name cannot be empty");
        }
        if self.record_type.is_empty() {
            return Err("record type cannot be empty");
        }
        Ok(())
    }
}

/// A compiled regular expression plus the capture group to read
///
/// Serialized as `{"pattern": "...", "group": N}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawRegexRule", into = "RawRegexRule")]
pub struct RegexRule {
    regex: Regex,
    group: usize,
}

impl RegexRule {
    /// Compile a rule
    pub fn new(pattern: &str, group: usize) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| Error::config(format!("invalid pattern {:?}: {}", pattern, e)))?;
        Ok(Self { regex, group })
    }

    /// Capture group index (0 is the whole match)
    pub fn group(&self) -> usize {
        self.group
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }
}

#[derive(Serialize, Deserialize)]
struct RawRegexRule {
    #[serde(default)]
    pattern: String,
    #[serde(default)]
    group: usize,
}

impl TryFrom<RawRegexRule> for RegexRule {
    type Error = Error;

    fn try_from(raw: RawRegexRule) -> Result<Self> {
        RegexRule::new(&raw.pattern, raw.group)
    }
}

impl From<RegexRule> for RawRegexRule {
    fn from(rule: RegexRule) -> Self {
        Self {
            pattern: rule.regex.as_str().to_string(),
            group: rule.group,
        }
    }
}

/// Runner settings
///
/// Built once at startup and moved into the runner.
#[derive(Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Client ID used to request tokens
    pub client_id: String,

    /// Requested token lifetime (in seconds)
    #[serde(default = "default_token_duration_secs")]
    pub token_duration_secs: u64,

    /// Delay between polling cycles (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Run one cycle and stop
    #[serde(default = "default_once")]
    pub once: bool,

    /// Log every scanned record and intermediate values
    #[serde(default)]
    pub verbose: bool,

    /// Value written by `UPDATE_RECORD_CONTENT_STATIC` tasks
    #[serde(default)]
    pub static_content: String,

    /// Capacity of the runner event channel
    ///
    /// When full, new events are dropped with a warning.
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl RunnerConfig {
    /// Create runner settings with defaults for everything but the client ID
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            token_duration_secs: default_token_duration_secs(),
            interval_secs: default_interval_secs(),
            once: default_once(),
            verbose: false,
            static_content: String::new(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Validate the runner settings
    pub fn validate(&self) -> Result<()> {
        if self.client_id.is_empty() {
            return Err(Error::config("Client ID cannot be empty"));
        }
        if self.token_duration_secs == 0 {
            return Err(Error::config("Token duration must be > 0"));
        }
        if !self.once && self.interval_secs == 0 {
            return Err(Error::config("Polling interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

// Custom Debug implementation that hides the client ID
impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("client_id", &"<REDACTED>")
            .field("token_duration_secs", &self.token_duration_secs)
            .field("interval_secs", &self.interval_secs)
            .field("once", &self.once)
            .field("verbose", &self.verbose)
            .field("static_content", &self.static_content)
            .field("event_channel_capacity", &self.event_channel_capacity)
            .finish()
    }
}

fn default_token_duration_secs() -> u64 {
    600
}

fn default_interval_secs() -> u64 {
    60
}

fn default_once() -> bool {
    true
}

fn default_event_channel_capacity() -> usize {
    1000
}
