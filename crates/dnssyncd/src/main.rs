// # dnssyncd - DNS Sync Daemon
//
// This daemon is a THIN integration layer: all task and API logic lives in
// dnssync-core and dnssync-provider-lopdns.
//
// The dnssyncd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Loading the task file
// 3. Building the LopDNS client and the runner
// 4. Forwarding SIGTERM/SIGINT to the runner and mapping the result to an
//    exit code
//
// ## Configuration
//
// - `CLIENT_ID`: LopDNS client id (required)
// - `BASE_URL`: API root (default `https://api.lopdns.se/v2/`)
// - `TIMEOUT`: Per-request timeout in seconds (default 10)
// - `TOKEN_DURATION_SEC`: Requested token lifetime (default 600)
// - `INTERVAL`: Seconds between cycles (default 60)
// - `ONCE`: Run a single cycle and exit (default true)
// - `CONFIG_FILE`: Task file (default `config.json`)
// - `VERBOSE`: Log every scanned record (default false)
// - `CONTENT_STATIC`: Value for `UPDATE_RECORD_CONTENT_STATIC` tasks
// - `LOG_LEVEL`: trace, debug, info, warn or error (default info)
//
// Booleans accept `1`, `true` or `yes` (any case); anything else is false.
//
// ## Example
//
// ```bash
// export CLIENT_ID=your_client_id
// export CONFIG_FILE=/etc/dnssync/config.json
// export ONCE=false
// export INTERVAL=300
//
// dnssyncd
// ```

use anyhow::{Context, Result};
use dnssync_core::{RunnerConfig, RunnerEvent, SyncConfig, SyncRunner, TaskFile};
use dnssync_provider_lopdns::{LopDnsClient, LopDnsConfig};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// - 0: Clean shutdown
/// - 1: Configuration, task file or authentication failure
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DnssyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DnssyncExitCode> for ExitCode {
    fn from(code: DnssyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    client_id: String,
    base_url: String,
    timeout_secs: u64,
    token_duration_secs: u64,
    interval_secs: u64,
    once: bool,
    config_file: PathBuf,
    verbose: bool,
    static_content: String,
    log_level: String,
}

// Custom Debug implementation that hides the client id
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("token_duration_secs", &self.token_duration_secs)
            .field("interval_secs", &self.interval_secs)
            .field("once", &self.once)
            .field("config_file", &self.config_file)
            .field("verbose", &self.verbose)
            .field("static_content", &self.static_content)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = LopDnsConfig::default();

        Ok(Self {
            client_id: lookup("CLIENT_ID").unwrap_or_default(),
            base_url: lookup("BASE_URL").unwrap_or(defaults.base_url),
            timeout_secs: parse_number(&lookup, "TIMEOUT", defaults.timeout_secs)?,
            token_duration_secs: parse_number(&lookup, "TOKEN_DURATION_SEC", 600)?,
            interval_secs: parse_number(&lookup, "INTERVAL", 60)?,
            once: lookup("ONCE").is_none_or(|v| parse_bool(&v)),
            config_file: lookup("CONFIG_FILE")
                .unwrap_or_else(|| "config.json".to_string())
                .into(),
            verbose: lookup("VERBOSE").is_some_and(|v| parse_bool(&v)),
            static_content: lookup("CONTENT_STATIC").unwrap_or_default(),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            anyhow::bail!(
                "CLIENT_ID is required. \
                Set it via: export CLIENT_ID=your_client_id"
            );
        }

        self.api_config()
            .validate()
            .context("BASE_URL or TIMEOUT is invalid")?;

        if self.token_duration_secs == 0 {
            anyhow::bail!("TOKEN_DURATION_SEC must be > 0");
        }

        if !self.once && self.interval_secs == 0 {
            anyhow::bail!("INTERVAL must be > 0 when ONCE is false");
        }

        if parse_log_level(&self.log_level).is_none() {
            anyhow::bail!(
                "LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            );
        }

        Ok(())
    }

    fn api_config(&self) -> LopDnsConfig {
        LopDnsConfig::new(self.base_url.clone()).with_timeout_secs(self.timeout_secs)
    }

    fn runner_config(&self) -> RunnerConfig {
        let mut runner = RunnerConfig::new(self.client_id.clone());
        runner.token_duration_secs = self.token_duration_secs;
        runner.interval_secs = self.interval_secs;
        runner.once = self.once;
        runner.verbose = self.verbose;
        runner.static_content = self.static_content.clone();
        runner
    }
}

/// `1`, `true` or `yes`, case-insensitive
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

fn parse_number<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a non-negative integer, got {:?}: {}", key, value, e)),
        None => Ok(default),
    }
}

fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        _ => None,
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DnssyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DnssyncExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DnssyncExitCode::ConfigError.into();
    }

    info!("Starting dnssyncd daemon");
    debug!("Configuration: {:?}", config);

    let (runner, event_rx) = match build_runner(&config) {
        Ok(parts) => parts,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return DnssyncExitCode::ConfigError.into();
        }
    };

    // Tasks run strictly one after another
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DnssyncExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(runner, event_rx)).into()
}

/// Load the task file and wire the client into a runner
fn build_runner(config: &Config) -> Result<(SyncRunner, mpsc::Receiver<RunnerEvent>)> {
    let task_file = TaskFile::from_path(&config.config_file)
        .with_context(|| format!("failed to load task file {}", config.config_file.display()))?;
    task_file.validate()?;

    info!(
        "Configuration loaded: {} task(s) from {}",
        task_file.dns_tasks.len(),
        config.config_file.display()
    );

    let client = LopDnsClient::new(&config.api_config())?;
    let sync_config = SyncConfig::new(task_file.dns_tasks, config.runner_config());

    Ok(SyncRunner::new(Box::new(client), sync_config)?)
}

/// Run the runner until it stops and pick the exit code
async fn run_daemon(
    runner: SyncRunner,
    mut event_rx: mpsc::Receiver<RunnerEvent>,
) -> DnssyncExitCode {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => {
                info!("Received shutdown signal: {}", signal);
                let _ = shutdown_tx.send(());
            }
            Err(e) => error!("Shutdown handling disabled: {}", e),
        }
    });

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!("Runner event: {:?}", event);
        }
    });

    match runner.run_with_shutdown(Some(shutdown_rx)).await {
        Ok(()) => {
            info!("Shutting down daemon");
            DnssyncExitCode::CleanShutdown
        }
        Err(dnssync_core::Error::Authentication(msg)) => {
            error!("Authentication failed: {}", msg);
            DnssyncExitCode::ConfigError
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            DnssyncExitCode::RuntimeError
        }
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
