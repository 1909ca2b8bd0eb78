//! Polling runner
//!
//! The SyncRunner is responsible for:
//! - Authenticating once before any task runs
//! - Evaluating every task, in order, once per cycle
//! - Sleeping between cycles, or stopping after one cycle in `once` mode
//! - Stopping cooperatively on a shutdown signal
//!
//! ## Lifecycle
//!
//! ```text
//! Idle ──► Authenticating ──► AuthFailed (terminal)
//!                 │
//!                 ▼
//!               Ready ──► RunningCycle ──► Sleeping(interval) ──┐
//!                              ▲                                │
//!                              └────────────────────────────────┘
//!                              │
//!                              ▼
//!                           Stopped (once mode, or shutdown signal)
//! ```
//!
//! The shutdown signal is only observed at the top of the loop and while
//! sleeping. A cycle that has started runs to completion, including any
//! HTTP call in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::{DnsTask, RunnerConfig, SyncConfig};
use crate::engine::{TaskEvaluator, TaskResult};
use crate::error::{Error, Result};
use crate::traits::{AuthToken, DnsApi};

/// Events emitted by the SyncRunner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    /// Runner started
    Started { tasks_count: usize },

    /// Token obtained and validated
    Authenticated,

    /// Token could not be obtained or validated
    AuthenticationFailed { error: String },

    /// Polling cycle started
    CycleStarted { cycle: u64 },

    /// One task finished (successfully or not)
    TaskCompleted {
        cycle: u64,
        task: String,
        success: bool,
        summary: String,
    },

    /// Polling cycle finished
    CycleCompleted {
        cycle: u64,
        succeeded: usize,
        failed: usize,
    },

    /// Runner stopped
    Stopped { reason: String },
}

/// Result of one task within a cycle
#[derive(Debug)]
pub struct TaskReport {
    /// Task label
    pub task: String,
    /// Evaluation result
    pub result: TaskResult,
}

/// Results of one polling cycle
#[derive(Debug, Default)]
pub struct CycleReport {
    /// Cycle number, starting at 1
    pub cycle: u64,
    /// Per-task results in task order
    pub tasks: Vec<TaskReport>,
}

impl CycleReport {
    /// Number of tasks that ended with an outcome
    pub fn succeeded(&self) -> usize {
        self.tasks.iter().filter(|t| t.result.is_ok()).count()
    }

    /// Number of tasks that ended with an error
    pub fn failed(&self) -> usize {
        self.tasks.len() - self.succeeded()
    }
}

/// Runs the configured tasks once or on a fixed interval
///
/// ## Threading
///
/// Tasks are evaluated strictly one after another; nothing runs in
/// parallel. The API client's token is only replaced between cycles.
pub struct SyncRunner {
    /// DNS API client
    api: Box<dyn DnsApi>,

    /// Tasks to evaluate each cycle
    tasks: Vec<DnsTask>,

    /// Loop and credential settings
    settings: RunnerConfig,

    /// Number of cycles started so far
    cycles: AtomicU64,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<RunnerEvent>,
}

impl SyncRunner {
    /// Create a new runner
    ///
    /// # Returns
    ///
    /// A tuple of (runner, event_receiver) where event_receiver yields runner events
    pub fn new(
        api: Box<dyn DnsApi>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<RunnerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.runner.event_channel_capacity);

        let runner = Self {
            api,
            tasks: config.tasks,
            settings: config.runner,
            cycles: AtomicU64::new(0),
            event_tx: tx,
        };

        Ok((runner, rx))
    }

    /// Obtain a token and check it with the provider
    ///
    /// # Returns
    ///
    /// - `Ok(AuthToken)`: The validated token
    /// - `Err(Error::Authentication)`: Token request or validation failed
    pub async fn authenticate(&self) -> Result<AuthToken> {
        debug!("Requesting token from {}", self.api.provider_name());

        let token = self
            .api
            .authenticate(&self.settings.client_id, self.settings.token_duration_secs)
            .await
            .map_err(|e| Error::auth(format!("token request failed: {}", e)))?;

        match self.api.validate_token().await {
            Ok(true) => {}
            Ok(false) => return Err(Error::auth("Token validation failed")),
            Err(e) => return Err(Error::auth(format!("token validation failed: {}", e))),
        }

        match token.expires_at() {
            Some(expires_at) => info!("Token retrieved successfully (expires {})", expires_at),
            None => info!("Token retrieved successfully"),
        }

        Ok(token)
    }

    /// Evaluate every task once
    pub async fn run_cycle(&self) -> CycleReport {
        let cycle = self.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        self.emit_event(RunnerEvent::CycleStarted { cycle });
        debug!("Starting cycle {}", cycle);

        let evaluator = TaskEvaluator::new(self.api.as_ref())
            .with_verbose(self.settings.verbose)
            .with_static_content(&self.settings.static_content);

        let mut report = CycleReport {
            cycle,
            tasks: Vec::with_capacity(self.tasks.len()),
        };

        for task in &self.tasks {
            let label = task.label();
            let result = evaluator.evaluate(task).await;

            let summary = match &result {
                Ok(outcome) => {
                    info!("Task {} finished: {}", label, outcome.summary());
                    outcome.summary().to_string()
                }
                Err(e) => {
                    // Continue with other tasks
                    error!("Task {} failed (zone {}): {}", label, task.zone, e);
                    e.to_string()
                }
            };

            self.emit_event(RunnerEvent::TaskCompleted {
                cycle,
                task: label.clone(),
                success: result.is_ok(),
                summary,
            });

            report.tasks.push(TaskReport {
                task: label,
                result,
            });
        }

        info!(
            "Cycle {} finished: {} succeeded, {} failed",
            cycle,
            report.succeeded(),
            report.failed()
        );
        self.emit_event(RunnerEvent::CycleCompleted {
            cycle,
            succeeded: report.succeeded(),
            failed: report.failed(),
        });

        report
    }

    /// Run the runner
    ///
    /// Authenticates, then runs cycles until `once` mode completes or
    /// Ctrl-C is received.
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error::Authentication)`: Startup authentication failed
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run with an explicit shutdown channel instead of Ctrl-C
    ///
    /// Sending on the channel stops the runner at the next loop boundary.
    /// Dropping the sender without sending never triggers shutdown.
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.run_internal(shutdown_rx).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit_event(RunnerEvent::Started {
            tasks_count: self.tasks.len(),
        });

        if let Err(e) = self.authenticate().await {
            error!("Authentication failed: {}", e);
            self.emit_event(RunnerEvent::AuthenticationFailed {
                error: e.to_string(),
            });
            self.emit_event(RunnerEvent::Stopped {
                reason: "Authentication failed".to_string(),
            });
            return Err(e);
        }
        self.emit_event(RunnerEvent::Authenticated);

        if self.settings.once {
            info!("Running single cycle");
        } else {
            info!(
                "Running continuous mode, interval={}s",
                self.settings.interval_secs
            );
        }

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    if rx.await.is_err() {
                        std::future::pending::<()>().await;
                    }
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let interval = Duration::from_secs(self.settings.interval_secs);

        let reason = loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break "Shutdown signal",
                _ = std::future::ready(()) => {}
            }

            match self.ensure_token().await {
                Ok(()) => {
                    self.run_cycle().await;
                }
                Err(e) => {
                    error!("Skipping cycle, token refresh failed: {}", e);
                }
            }

            if self.settings.once {
                break "Single cycle completed";
            }

            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = &mut shutdown => break "Shutdown signal",
            }
        };

        info!("Stopping: {}", reason);

        if !self
            .api
            .is_token_expired(AuthToken::DEFAULT_EXPIRY_MARGIN_SECS)
            .await
        {
            if let Err(e) = self.api.invalidate_token().await {
                warn!("Failed to invalidate token: {}", e);
            }
        }

        self.emit_event(RunnerEvent::Stopped {
            reason: reason.to_string(),
        });

        Ok(())
    }

    /// Re-authenticate between cycles when the token is about to expire
    async fn ensure_token(&self) -> Result<()> {
        if !self
            .api
            .is_token_expired(AuthToken::DEFAULT_EXPIRY_MARGIN_SECS)
            .await
        {
            return Ok(());
        }

        warn!("Token expired or about to expire, re-authenticating");
        self.authenticate().await.map(|_| ())
    }

    /// Emit a runner event
    fn emit_event(&self, event: RunnerEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
