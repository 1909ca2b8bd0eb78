//! Task evaluation
//!
//! The TaskEvaluator is responsible for:
//! - Checking that the task's zone exists in the account
//! - Locating the source and target records in one pass over the zone
//! - Extracting and comparing the source and target values
//! - Writing (or, in dry-run mode, only logging) the new target content
//!
//! ## Evaluation Flow
//!
//! ```text
//! list_zones ──► zone present? ──► static task? ──► list_records
//!                                                        │
//!                          ┌─────────────────────────────┘
//!                          ▼
//!                 single scan (first match per role)
//!                          │
//!                          ▼
//!         source/target found? target value non-empty?
//!                          │
//!                          ▼
//!        equal? ──► NoChangeNeeded
//!          │
//!          ▼
//!     rewrite content ──► dry run? ──► DryRunWouldUpdate
//!                              │
//!                              ▼
//!                       update_record ──► Updated | UpdateFailed
//! ```
//!
//! Every failure ends the evaluation of that task only.

use tracing::{debug, info, warn};

use crate::config::{DnsTask, TaskType};
use crate::error::TaskError;
use crate::traits::{DnsApi, Record};

/// Result of evaluating one task
pub type TaskResult = std::result::Result<TaskOutcome, TaskError>;

/// Successful outcome of a task evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Source and target already agree; nothing written
    NoChangeNeeded {
        /// The shared value
        value: String,
    },

    /// Dry run: the update that would have been written
    DryRunWouldUpdate {
        old_content: String,
        new_content: String,
    },

    /// The target record was updated
    Updated {
        old_content: String,
        new_content: String,
        /// Record as reported back by the provider
        response: Record,
    },
}

impl TaskOutcome {
    /// Short description for events and cycle summaries
    pub fn summary(&self) -> &'static str {
        match self {
            TaskOutcome::NoChangeNeeded { .. } => "no change needed",
            TaskOutcome::DryRunWouldUpdate { .. } => "dry run, update skipped",
            TaskOutcome::Updated { .. } => "updated",
        }
    }
}

/// Records located by a zone scan
#[derive(Debug, Default)]
struct ScanResult<'r> {
    /// Qualifying source record and its extracted value
    source: Option<(&'r Record, String)>,
    /// Qualifying target record and its comparison value
    target: Option<(&'r Record, String)>,
}

/// Evaluates tasks against a DNS API
///
/// The evaluator borrows the API client and holds no state of its own, so
/// one instance can evaluate any number of tasks sequentially.
pub struct TaskEvaluator<'a> {
    api: &'a dyn DnsApi,
    verbose: bool,
    static_content: &'a str,
}

impl<'a> TaskEvaluator<'a> {
    /// Create an evaluator with verbose logging off and no static content
    pub fn new(api: &'a dyn DnsApi) -> Self {
        Self {
            api,
            verbose: false,
            static_content: "",
        }
    }

    /// Log every scanned record and intermediate values
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Value used by `UPDATE_RECORD_CONTENT_STATIC` tasks
    pub fn with_static_content(mut self, static_content: &'a str) -> Self {
        self.static_content = static_content;
        self
    }

    /// Evaluate one task
    ///
    /// # Returns
    ///
    /// - `Ok(TaskOutcome)`: No change needed, dry-run decision, or update written
    /// - `Err(TaskError)`: The reason this task stopped for this cycle
    pub async fn evaluate(&self, task: &DnsTask) -> TaskResult {
        self.check_zone(task).await?;

        let static_value = match task.task_type {
            TaskType::UpdateRecordContentStatic => {
                if self.static_content.is_empty() {
                    return Err(TaskError::MissingStaticContent);
                }
                Some(self.static_content.to_string())
            }
            _ => None,
        };

        let records = self
            .api
            .list_records(&task.zone)
            .await
            .map_err(|source| TaskError::RecordsFetch {
                zone: task.zone.clone(),
                source,
            })?;

        if self.verbose {
            info!("Records in zone {}: {}", task.zone, records.len());
        }

        let scan = self.scan(task, &records, static_value.is_none());

        let source_value = match static_value {
            Some(value) => value,
            None => {
                let (_, value) = scan.source.ok_or_else(|| TaskError::SourceNotFound {
                    name: task.source_record.name.clone(),
                    record_type: task.source_record.record_type.clone(),
                })?;
                value
            }
        };

        let (target, target_value) = scan.target.ok_or_else(|| TaskError::TargetNotFound {
            name: task.target_record.name.clone(),
            record_type: task.target_record.record_type.clone(),
        })?;

        if target_value.is_empty() {
            return Err(TaskError::TargetValueEmpty {
                name: target.name.clone(),
            });
        }

        if source_value.is_empty() {
            return Err(TaskError::SourceValueEmpty {
                name: task.source_record.name.clone(),
            });
        }

        if self.verbose {
            info!("Existing data to be replaced: {}", target_value);
            info!("New data: {}", source_value);
        }

        if target_value == source_value {
            if self.verbose {
                info!("Data in source and target records are identical, no update needed");
            }
            return Ok(TaskOutcome::NoChangeNeeded {
                value: source_value,
            });
        }

        let old_content = target.content.clone();
        let new_content = task
            .target_record
            .rewrite_content(&old_content, &source_value);

        if new_content == old_content {
            warn!(
                "Replace rule left record {} in zone {} unchanged ({:?})",
                target.name, task.zone, old_content
            );
        }

        if task.dry_run {
            info!(
                "[DRY-RUN] Record {} of type {} in zone {} would be updated: {:?} -> {:?}",
                target.name, target.record_type, task.zone, old_content, new_content
            );
            return Ok(TaskOutcome::DryRunWouldUpdate {
                old_content,
                new_content,
            });
        }

        let response = self
            .api
            .update_record(
                &task.zone,
                &task.target_record.name,
                &task.target_record.record_type,
                &old_content,
                &new_content,
            )
            .await
            .map_err(|source| TaskError::UpdateFailed {
                name: task.target_record.name.clone(),
                source,
            })?;

        info!(
            "Record {} of type {} in zone {} updated: {:?} -> {:?}",
            target.name, target.record_type, task.zone, old_content, new_content
        );

        Ok(TaskOutcome::Updated {
            old_content,
            new_content,
            response,
        })
    }

    /// Fail unless the task's zone is managed by the account
    async fn check_zone(&self, task: &DnsTask) -> Result<(), TaskError> {
        let zones = self.api.list_zones().await.map_err(TaskError::ZonesFetch)?;

        if self.verbose {
            let names: Vec<&str> = zones.iter().map(|z| z.name.as_str()).collect();
            info!("Zones: {:?}", names);
        }

        if !zones.iter().any(|z| z.name == task.zone) {
            return Err(TaskError::ZoneNotFound {
                zone: task.zone.clone(),
            });
        }

        Ok(())
    }

    /// Single pass over the zone's records
    ///
    /// The first qualifying record wins for each role; one record may fill
    /// both roles. Stops once every needed role is filled.
    fn scan<'r>(&self, task: &DnsTask, records: &'r [Record], need_source: bool) -> ScanResult<'r> {
        let mut result = ScanResult::default();

        for record in records {
            let source_done = !need_source || result.source.is_some();
            if source_done && result.target.is_some() {
                break;
            }

            if self.verbose {
                info!(
                    "Record {} of type {}: {}",
                    record.name, record.record_type, record.content
                );
            }

            if !source_done && task.source_record.selects(record) {
                let value = task.source_record.extract_value(&record.content);
                if self.verbose {
                    info!("Source data: {}", value);
                }
                result.source = Some((record, value));
            }

            if result.target.is_none() && task.target_record.selects(record) {
                let value = task.target_record.extract_value(&record.content);
                if self.verbose {
                    info!("Target data: {}", value);
                }
                result.target = Some((record, value));
            }
        }

        debug!(
            "Scan of zone {} done: source found={}, target found={}",
            task.zone,
            result.source.is_some(),
            result.target.is_some()
        );

        result
    }
}
