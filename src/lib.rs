// src/lib.rs
// Queue core and yt-dlp engine, shared by the binary and the tests

pub mod cli;
pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod presenter;
pub mod queue_store;
pub mod ytdlp;

pub use controller::{ActiveDownload, ControllerState, QueueController, QueueHandle};
pub use engine::{DownloadEngine, DownloadRequest, ProgressEvent, ProgressReporter, ProgressStatus};
pub use error::{AppError, DownloadFailure, DownloadFailureKind};
pub use presenter::{ConsolePresenter, NullPresenter, Presenter};
pub use queue_store::{DownloadStatus, QueueEntry, QueueStore, QueueSummary};
pub use ytdlp::YtDlpEngine;
