//! Error types for the tracer.

use std::path::PathBuf;

use thiserror::Error;

/// Tracer error type.
#[derive(Error, Debug)]
pub enum TraceError {
    /// `start` called on a running session.
    #[error("tracing already started")]
    AlreadyStarted,

    /// `stop` called without a running session.
    #[error("tracing not started")]
    NotStarted,

    /// Counter handle not issued by this tracer.
    #[error("invalid counter handle {handle} ({registered} counters registered)")]
    InvalidHandle {
        /// Offending handle index.
        handle: usize,
        /// Registry size at the time of the call.
        registered: usize,
    },

    /// Trace document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Trace storage could not be written or read.
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl From<serde_json::Error> for TraceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias using [`TraceError`].
pub type Result<T> = std::result::Result<T, TraceError>;
