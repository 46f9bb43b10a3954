//! Core error types for alivio-core.
//!
//! The funnel never hard-fails its caller: answer rejections are ordinary
//! `AnswerError` values surfaced as inline feedback, and analytics failures
//! are swallowed by the reporter. The hierarchy below exists so every other
//! layer can still say precisely what went wrong.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for alivio-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Answer was rejected by the funnel (validation or email gating).
    #[error("Answer rejected: {0}")]
    Answer(#[from] AnswerError),

    /// Lead store errors
    #[error("Lead store error: {0}")]
    Store(#[from] StoreError),

    /// Analytics collector errors
    #[error("Tracking error: {0}")]
    Track(#[from] TrackError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Why an answer was refused. Every variant maps to a distinct piece of
/// inline feedback; none of them advances the funnel.
#[derive(Error, Debug)]
pub enum AnswerError {
    /// The funnel is not currently asking a question.
    #[error("No question is currently active")]
    NotAsking,

    /// A transition is already scheduled; a stale control re-submitted.
    #[error("The previous answer is still being processed")]
    TransitionPending,

    /// The answer targets a step other than the active one.
    #[error("Expected an answer for step '{expected}', got '{got}'")]
    UnexpectedStep { expected: String, got: String },

    /// Choice value is not one of the step's options.
    #[error("'{value}' is not a valid option for step '{step_id}'")]
    InvalidChoice { step_id: String, value: String },

    /// Slider value outside the 0-10 pain scale.
    #[error("Pain level must be between 0 and 10, got {value}")]
    SliderOutOfRange { value: i64 },

    /// Email missing or malformed.
    #[error("Please enter a valid email address")]
    InvalidEmail,

    /// The kind of value does not match the step's input kind.
    #[error("Step '{step_id}' does not accept this kind of answer")]
    KindMismatch { step_id: String },

    /// A lead with this email already exists.
    #[error("This email has already been used for an assessment")]
    DuplicateEmail,

    /// The lead store could not be reached; the user may resubmit.
    #[error("We could not save your answers, please try again")]
    StoreUnavailable(#[source] StoreError),
}

/// Lead persistence service errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network-level failure or 5xx from the service.
    #[error("lead store unreachable: {0}")]
    Unavailable(String),

    /// The service reported a unique-key conflict on insert.
    #[error("a lead with this email already exists")]
    DuplicateEmail,

    /// The service rejected the request.
    #[error("lead store rejected the request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The service answered with something we could not interpret.
    #[error("unexpected lead store response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Analytics collector errors. Never surfaced to the user; the reporter
/// logs them and falls back to the pending queue.
#[derive(Error, Debug)]
pub enum TrackError {
    /// No collector endpoint is configured yet.
    #[error("collector not available")]
    NotReady,

    /// Delivery to the collector failed.
    #[error("event delivery failed: {0}")]
    DeliveryFailed(String),
}

impl From<reqwest::Error> for TrackError {
    fn from(err: reqwest::Error) -> Self {
        TrackError::DeliveryFailed(err.to_string())
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CoreError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        CoreError::Custom(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
