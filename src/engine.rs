// src/engine.rs
// Contract between the queue controller and whatever actually fetches media

use crate::error::DownloadFailure;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// yt-dlp style output template: file named after the resolved title and extension
pub const OUTPUT_TEMPLATE: &str = "%(title)s.%(ext)s";

/// Format selector handed to the engine
pub const BEST_FORMAT: &str = "best";

/// Everything the engine needs to fetch one URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    /// Output path with `%(title)s` / `%(ext)s` placeholders
    pub output_template: String,
    pub format_selector: String,
    /// Use the engine's own HLS downloader instead of ffmpeg
    pub prefer_native_hls: bool,
    /// Download only the video when the URL also names a playlist
    pub single_video_only: bool,
    /// Skip unavailable playlist entries instead of aborting
    pub skip_unavailable: bool,
}

impl DownloadRequest {
    /// Request for `url` written into `destination` with the default options
    pub fn new(url: &str, destination: &Path) -> Self {
        Self {
            url: url.to_string(),
            output_template: destination.join(OUTPUT_TEMPLATE).to_string_lossy().into_owned(),
            format_selector: BEST_FORMAT.to_string(),
            prefer_native_hls: true,
            single_video_only: true,
            skip_unavailable: true,
        }
    }
}

/// Status field of a progress event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressStatus {
    Downloading,
    Finished,
    Other(String),
}

impl ProgressStatus {
    pub fn parse(status: &str) -> Self {
        match status.trim() {
            "downloading" => Self::Downloading,
            "finished" => Self::Finished,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downloading => f.write_str("downloading"),
            Self::Finished => f.write_str("finished"),
            Self::Other(status) => f.write_str(status),
        }
    }
}

/// One progress callback from the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub status: ProgressStatus,
    /// Raw percent text as the engine prints it, e.g. `" 37.0%"`
    pub percent: Option<String>,
}

impl ProgressEvent {
    pub fn downloading(percent: impl Into<String>) -> Self {
        Self {
            status: ProgressStatus::Downloading,
            percent: Some(percent.into()),
        }
    }

    pub fn finished() -> Self {
        Self {
            status: ProgressStatus::Finished,
            percent: None,
        }
    }

    /// Percent complete as an integer, if the event carries a readable one
    pub fn percent_complete(&self) -> Option<u8> {
        self.percent.as_deref().and_then(parse_percent)
    }
}

static ANSI_ESCAPE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").ok());
static PERCENT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").ok());

/// Parse a percent string such as `" 37.0%"` into `37`.
///
/// Colour escapes are ignored; the value is truncated and clamped to 0-100.
pub fn parse_percent(text: &str) -> Option<u8> {
    let ansi = ANSI_ESCAPE.as_ref()?;
    let percent = PERCENT.as_ref()?;

    let clean = ansi.replace_all(text, "");
    let captures = percent.captures(&clean)?;
    let value: f64 = captures.get(1)?.as_str().parse().ok()?;
    if !value.is_finite() {
        return None;
    }

    Some(value.clamp(0.0, 100.0) as u8)
}

/// Callback handed to the engine for the duration of one download
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Arc<dyn Fn(ProgressEvent) + Send + Sync>,
}

impl ProgressReporter {
    pub fn new(callback: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn report(&self, event: ProgressEvent) {
        (self.callback)(event);
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter").finish_non_exhaustive()
    }
}

/// Something that can fetch a URL to disk.
///
/// `download` resolves once the engine is done with the URL; every error is
/// reported through the returned `DownloadFailure`, never by panicking.
#[async_trait]
pub trait DownloadEngine: Send + Sync {
    async fn download(
        &self,
        request: DownloadRequest,
        progress: ProgressReporter,
    ) -> Result<(), DownloadFailure>;
}
