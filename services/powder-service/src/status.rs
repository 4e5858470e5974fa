//! Status messages surfaced to the display.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Warning,
    Error,
}

/// One note about input availability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    /// Input the message is about: "terrain", "wind", "snowfall".
    pub input: &'static str,
    pub message: String,
}

impl StatusMessage {
    pub fn info(input: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Info,
            input,
            message: message.into(),
        }
    }

    pub fn warning(input: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Warning,
            input,
            message: message.into(),
        }
    }

    pub fn error(input: &'static str, message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Error,
            input,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.level, self.message)
    }
}
