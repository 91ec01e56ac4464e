// src/error.rs

use serde_json::Error as SerdeError;
use std::fmt;
use std::io;
use thiserror::Error;

/// Custom error types for the application
#[derive(Error, Debug)]
pub enum AppError {
    /// Error for invalid input validation (empty URL, no destination folder)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The URL is already waiting in the pending queue
    #[error("Duplicate URL: {0} is already in the queue")]
    DuplicateError(String),

    /// Error reported by the download engine
    #[error("Download error: {0}")]
    DownloadError(#[from] DownloadFailure),

    /// Error for missing dependencies
    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    /// Error while loading or saving settings
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// I/O related errors
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] SerdeError),

    /// The queue controller is no longer running
    #[error("Queue controller is not running")]
    ChannelClosed,

    /// General application errors
    #[error("Application error: {0}")]
    General(String),
}

/// Convert a string error to AppError::General
impl From<String> for AppError {
    fn from(error: String) -> Self {
        AppError::General(error)
    }
}

/// Convert a &str error to AppError::General
impl From<&str> for AppError {
    fn from(error: &str) -> Self {
        AppError::General(error.to_string())
    }
}

/// Broad classification of why a download did not complete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFailureKind {
    /// The engine executable could not be found or started
    EngineUnavailable,
    /// No extractor accepts the URL
    UnsupportedUrl,
    /// The resource exists but offers no downloadable format
    NoFormat,
    /// Connection, HTTP or DNS trouble
    Network,
    /// The configured download timeout elapsed
    TimedOut,
    /// The download task panicked
    Crashed,
    Other,
}

impl fmt::Display for DownloadFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::EngineUnavailable => "engine unavailable",
            Self::UnsupportedUrl => "unsupported URL",
            Self::NoFormat => "no available format",
            Self::Network => "network failure",
            Self::TimedOut => "timed out",
            Self::Crashed => "download task crashed",
            Self::Other => "download failed",
        };
        f.write_str(label)
    }
}

/// Typed result of a failed engine call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct DownloadFailure {
    pub kind: DownloadFailureKind,
    pub detail: String,
}

impl DownloadFailure {
    pub fn new(kind: DownloadFailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}
