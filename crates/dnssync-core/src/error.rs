//! Error types for the DNS sync system
//!
//! Two layers are defined here:
//! - [`Error`]: process and I/O level failures (transport, auth, config)
//! - [`TaskError`]: terminal outcomes of a single task evaluation

use thiserror::Error;

/// Result type alias for DNS sync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DNS sync system
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP layer failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Token acquisition or validation failure
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Terminal failure of one task evaluation
///
/// None of these abort the runner; the next task (or the next cycle)
/// proceeds independently.
#[derive(Error, Debug)]
pub enum TaskError {
    /// The zone listing call itself failed
    #[error("failed to fetch zones: {0}")]
    ZonesFetch(#[source] Error),

    /// The task's zone is not managed by the account
    #[error("zone {zone} not found in account")]
    ZoneNotFound { zone: String },

    /// The record listing call failed
    #[error("failed to fetch records for zone {zone}: {source}")]
    RecordsFetch {
        zone: String,
        #[source]
        source: Error,
    },

    /// A static-content task ran without static content configured
    #[error("static content is empty")]
    MissingStaticContent,

    /// No record qualified for the source selector
    #[error("could not find source record {record_type} {name}")]
    SourceNotFound { name: String, record_type: String },

    /// No record qualified for the target selector
    #[error("could not find target record {record_type} {name}")]
    TargetNotFound { name: String, record_type: String },

    /// The source record was found but yielded no data
    #[error("source record {name} yielded no data")]
    SourceValueEmpty { name: String },

    /// The target record was found but yielded no comparison data
    #[error("could not find the data within target record {name}")]
    TargetValueEmpty { name: String },

    /// The provider rejected or failed the write
    #[error("update of {name} failed: {source}")]
    UpdateFailed {
        name: String,
        #[source]
        source: Error,
    },
}
