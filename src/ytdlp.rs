// src/ytdlp.rs
// DownloadEngine backed by the yt-dlp executable

use crate::engine::{
    DownloadEngine, DownloadRequest, ProgressEvent, ProgressReporter, ProgressStatus,
};
use crate::error::{AppError, DownloadFailure, DownloadFailureKind};
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::VecDeque;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as AsyncCommand;

/// Default executable name, resolved through PATH
pub const DEFAULT_YTDLP: &str = "yt-dlp";

/// Marker at the start of every machine-readable progress line
const PROGRESS_MARKER: &str = "queueloader-progress";

/// How many stderr lines are kept for the failure report
const STDERR_TAIL: usize = 50;

/// Runs one yt-dlp process per download
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    program: String,
}

impl Default for YtDlpEngine {
    fn default() -> Self {
        Self::new(DEFAULT_YTDLP)
    }
}

impl YtDlpEngine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Check that the executable runs and return its version string
    pub async fn probe(&self) -> Result<String, AppError> {
        let output = AsyncCommand::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => AppError::MissingDependency(self.program.clone()),
                _ => AppError::IoError(e),
            })?;

        if !output.status.success() {
            return Err(AppError::MissingDependency(format!(
                "{} --version exited with {}",
                self.program, output.status
            )));
        }

        let version = String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string();
        Ok(version)
    }
}

/// Build the yt-dlp command line for a request
pub fn build_args(request: &DownloadRequest) -> Vec<String> {
    let mut args = vec!["-f".to_string(), request.format_selector.clone()];

    if request.prefer_native_hls {
        args.push("--hls-prefer-native".to_string());
    }
    if request.single_video_only {
        args.push("--no-playlist".to_string());
    }
    if request.skip_unavailable {
        args.push("--ignore-errors".to_string());
    }

    args.push("--newline".to_string());
    args.push("--no-colors".to_string());
    args.push("--progress-template".to_string());
    args.push(format!(
        "download:{}|%(progress.status)s|%(progress._percent_str)s",
        PROGRESS_MARKER
    ));

    args.push("-o".to_string());
    args.push(request.output_template.clone());
    args.push("--".to_string());
    args.push(request.url.clone());
    args
}

/// Turn one line of yt-dlp stdout into a progress event
pub fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    let line = line.trim();

    if let Some(rest) = line
        .strip_prefix(PROGRESS_MARKER)
        .and_then(|rest| rest.strip_prefix('|'))
    {
        let (status, percent) = rest.split_once('|').unwrap_or((rest, ""));
        let percent = percent.trim();
        let percent = if percent.is_empty() || percent == "NA" {
            None
        } else {
            Some(percent.to_string())
        };
        return Some(ProgressEvent {
            status: ProgressStatus::parse(status),
            percent,
        });
    }

    // Stock progress lines, printed when the template is not honoured
    let rest = line.strip_prefix("[download]")?.trim();
    if rest.contains("has already been downloaded") {
        return Some(ProgressEvent::finished());
    }
    let percent = rest.split_whitespace().next()?;
    if percent.ends_with('%') {
        Some(ProgressEvent::downloading(percent))
    } else {
        None
    }
}

/// Classify a failed run from its stderr output
pub fn classify_failure(stderr: &str) -> DownloadFailureKind {
    let lower = stderr.to_lowercase();

    if lower.contains("unsupported url") {
        DownloadFailureKind::UnsupportedUrl
    } else if lower.contains("requested format is not available")
        || lower.contains("no video formats found")
    {
        DownloadFailureKind::NoFormat
    } else if lower.contains("http error")
        || lower.contains("unable to download")
        || lower.contains("timed out")
        || lower.contains("connection")
        || lower.contains("name or service not known")
        || lower.contains("getaddrinfo")
    {
        DownloadFailureKind::Network
    } else {
        DownloadFailureKind::Other
    }
}

/// Pick the most useful line of stderr for the failure detail
fn failure_detail(stderr_lines: &[String]) -> Option<String> {
    stderr_lines
        .iter()
        .rev()
        .find(|line| line.starts_with("ERROR"))
        .or_else(|| stderr_lines.last())
        .cloned()
}

#[async_trait]
impl DownloadEngine for YtDlpEngine {
    async fn download(
        &self,
        request: DownloadRequest,
        progress: ProgressReporter,
    ) -> Result<(), DownloadFailure> {
        let args = build_args(&request);
        debug!("Running {} {:?}", self.program, args);

        let mut command = AsyncCommand::new(&self.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            let detail = match e.kind() {
                io::ErrorKind::NotFound => format!(
                    "{} executable not found. Please ensure it's installed and in your PATH.",
                    self.program
                ),
                io::ErrorKind::PermissionDenied => {
                    format!("Permission denied when running {}", self.program)
                }
                _ => format!("Failed to execute {}: {}", self.program, e),
            };
            DownloadFailure::new(DownloadFailureKind::EngineUnavailable, detail)
        })?;

        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut tail = VecDeque::with_capacity(STDERR_TAIL);
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("yt-dlp stderr: {}", line);
                    if tail.len() == STDERR_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
                Vec::from(tail)
            })
        });

        // Progress is read to EOF before waiting so every event precedes the result
        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_progress_line(&line) {
                        Some(event) => progress.report(event),
                        None => debug!("yt-dlp: {}", line),
                    },
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Failed to read yt-dlp output: {}", e);
                        break;
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|e| {
            DownloadFailure::new(
                DownloadFailureKind::Other,
                format!("Failed to complete download: {}", e),
            )
        })?;

        let stderr_lines = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => Vec::new(),
        };

        if status.success() {
            return Ok(());
        }

        let kind = classify_failure(&stderr_lines.join("\n"));
        let detail = failure_detail(&stderr_lines).unwrap_or_else(|| {
            format!(
                "yt-dlp exited with code {}",
                status.code().map_or("unknown".to_string(), |c| c.to_string())
            )
        });
        Err(DownloadFailure::new(kind, detail))
    }
}
