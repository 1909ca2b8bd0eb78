// # dnssync-core
//
// Core library for the DNS record synchronization agent.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping one DNS record in
// step with another:
// - **DnsApi**: Trait for talking to a DNS provider's REST API
// - **TaskEvaluator**: Scan, match, extract, compare and update for one task
// - **SyncRunner**: Authenticates once and runs the configured tasks once or
//   on a fixed interval
// - **rules**: Regex matching, extraction and substitution on record content
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Provider HTTP details live in provider crates
// 2. **Explicit Outcomes**: Every task evaluation yields a tagged result
// 3. **Isolation**: A failing task never affects other tasks or the loop
// 4. **Library-First**: The daemon is a thin wrapper around this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod runner;
pub mod traits;

// Re-export core types for convenience
pub use config::{DnsTask, RecordSelector, RegexRule, RunnerConfig, SyncConfig, TaskFile, TaskType};
pub use engine::{TaskEvaluator, TaskOutcome, TaskResult};
pub use error::{Error, Result, TaskError};
pub use runner::{CycleReport, RunnerEvent, SyncRunner, TaskReport};
pub use traits::{AuthToken, DnsApi, Record, Zone};
