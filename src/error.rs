use crate::browser::BrowserError;
use std::time::Duration;

/// Errors raised while acquiring page content
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Browser(#[from] BrowserError),

    #[error("Timed out after {0:?} fetching {1}")]
    Timeout(Duration, String),

    #[error("Transport used before open()")]
    NotOpen,

    #[error("Browser worker task failed: {0}")]
    Worker(String),
}

/// Errors that end a single adapter run
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("transport unavailable: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("{0}")]
    Adapter(String),
}

/// A fragment could not be turned into a canonical record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    #[error("required field `{0}` is missing or blank")]
    MissingField(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Errors reported by a persistence collaborator
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink rejected record {key}: {reason}")]
    Rejected { key: String, reason: String },

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}
