//! Error types for the powder overlay pipeline.

use thiserror::Error;

/// Result type alias using PowderError.
pub type PowderResult<T> = Result<T, PowderError>;

/// Primary error type shared by the pipeline stages.
#[derive(Debug, Error)]
pub enum PowderError {
    // === Input Errors ===
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),

    #[error("Configuration error: {0}")]
    Config(String),

    // === Collaborator Errors ===
    #[error("Fetch from {source_name} failed: {reason}")]
    Fetch { source_name: String, reason: String },

    #[error("Decode error: {0}")]
    Decode(String),

    // === Storage Errors ===
    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    // === Computation Errors ===
    #[error("No wind signal in the requested window")]
    NoWindSignal,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PowderError {
    /// Create a Fetch error for a named source.
    pub fn fetch(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Create a Decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Short category label used in status messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PowderError::InvalidBounds(_) => "invalid_bounds",
            PowderError::Config(_) => "config",
            PowderError::Fetch { .. } => "fetch_failure",
            PowderError::Decode(_) => "decode_error",
            PowderError::CacheUnavailable(_) => "cache_unavailable",
            PowderError::NoWindSignal => "no_wind_signal",
            PowderError::Internal(_) => "internal",
        }
    }
}

impl From<std::io::Error> for PowderError {
    fn from(err: std::io::Error) -> Self {
        PowderError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for PowderError {
    fn from(err: serde_json::Error) -> Self {
        PowderError::Decode(format!("JSON error: {}", err))
    }
}
