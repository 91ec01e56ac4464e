// src/queue_store.rs
// Pending URLs plus the full, ordered history of queue rows

use crate::error::AppError;
use crate::presenter::Presenter;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

/// Current status of a queue row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadStatus {
    Waiting,
    /// Percent complete, 0-100
    Downloading(u8),
    Completed,
    Failed,
}

impl Default for DownloadStatus {
    fn default() -> Self {
        Self::Waiting
    }
}

impl DownloadStatus {
    /// Lifecycle stage used to reject backwards transitions
    fn stage(&self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::Downloading(_) => 1,
            Self::Completed | Self::Failed => 2,
        }
    }

    /// Check if the row reached a terminal state
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if the row is the one being downloaded
    pub fn is_downloading(&self) -> bool {
        matches!(self, Self::Downloading(_))
    }

    /// Text shown in the status column
    pub fn display_text(&self) -> String {
        match self {
            Self::Waiting => "Waiting...".to_string(),
            Self::Downloading(0) => "Downloading...".to_string(),
            Self::Downloading(percent) => format!("Downloading: {}%", percent),
            Self::Completed => "Completed".to_string(),
            Self::Failed => "Download failed".to_string(),
        }
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_text())
    }
}

/// A row in the queue list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    /// 1-based position in submission order, never reused
    pub index: usize,
    /// URL as submitted (trimmed)
    pub url: String,
    /// Current status
    pub status: DownloadStatus,
    /// When the URL was submitted
    pub added_at: DateTime<Utc>,
}

/// Per-status counts over every row ever submitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueSummary {
    pub waiting: usize,
    pub downloading: usize,
    pub completed: usize,
    pub failed: usize,
}

impl QueueSummary {
    pub fn total(&self) -> usize {
        self.waiting + self.downloading + self.completed + self.failed
    }
}

/// Holds pending URLs and the status record of every submitted URL.
///
/// The store is owned by a single task; it is not shared across threads.
pub struct QueueStore {
    /// Row `i` lives at `entries[i - 1]`
    entries: Vec<QueueEntry>,
    /// Indices of rows not yet handed to the engine, in FIFO order
    pending: VecDeque<usize>,
    /// Folder downloads are written to
    destination: Option<PathBuf>,
    presenter: Box<dyn Presenter>,
}

impl QueueStore {
    /// Create an empty store rendering through `presenter`
    pub fn new(presenter: Box<dyn Presenter>) -> Self {
        Self {
            entries: Vec::new(),
            pending: VecDeque::new(),
            destination: None,
            presenter,
        }
    }

    /// Builder-style destination setup
    pub fn with_destination(mut self, destination: Option<PathBuf>) -> Self {
        self.destination = destination;
        self
    }

    pub fn presenter(&self) -> &dyn Presenter {
        self.presenter.as_ref()
    }

    /// Choose the folder downloads are written to; an empty path is refused
    /// and the previous folder is kept
    pub fn set_destination(&mut self, destination: PathBuf) -> Result<(), AppError> {
        if destination.as_os_str().is_empty() {
            return Err(AppError::ValidationError(
                "Please choose a destination folder first".to_string(),
            ));
        }
        info!("Destination folder set to {:?}", destination);
        self.destination = Some(destination);
        Ok(())
    }

    pub fn destination(&self) -> Option<&Path> {
        self.destination.as_deref()
    }

    fn has_destination(&self) -> bool {
        self.destination
            .as_ref()
            .is_some_and(|dir| !dir.as_os_str().is_empty())
    }

    /// Add a URL to the pending queue and return its row index
    pub fn submit(&mut self, url: &str) -> Result<usize, AppError> {
        let url = url.trim();

        if !self.has_destination() {
            return Err(AppError::ValidationError(
                "Please choose a destination folder first".to_string(),
            ));
        }

        if url.is_empty() {
            return Err(AppError::ValidationError(
                "Please enter a video URL".to_string(),
            ));
        }

        // Only pending rows count; finished rows may be submitted again
        if self.pending.iter().any(|&index| self.entries[index - 1].url == url) {
            return Err(AppError::DuplicateError(url.to_string()));
        }

        let index = self.entries.len() + 1;
        self.entries.push(QueueEntry {
            index,
            url: url.to_string(),
            status: DownloadStatus::Waiting,
            added_at: Utc::now(),
        });
        self.pending.push_back(index);
        debug!("Queued {} as #{}", url, index);

        self.presenter.render_queue_row(index, url);
        self.presenter.render_status_row(index, DownloadStatus::Waiting);

        Ok(index)
    }

    /// Remove the head of the pending queue
    pub fn pop_next(&mut self) -> Option<(String, usize)> {
        let index = self.pending.pop_front()?;
        let url = self.entries[index - 1].url.clone();
        Some((url, index))
    }

    /// Overwrite the status of row `index`.
    ///
    /// Returns `false` when the row does not exist, the write would move the
    /// row back to an earlier stage (e.g. progress arriving after completion),
    /// or a waiting row would finish without ever downloading.
    pub fn update_status(&mut self, index: usize, status: DownloadStatus) -> bool {
        let Some(entry) = index.checked_sub(1).and_then(|i| self.entries.get_mut(i)) else {
            debug!("Ignoring status {:?} for unknown row #{}", status, index);
            return false;
        };

        let current = entry.status;
        if current == status {
            return true;
        }
        if current.is_finished()
            || status.stage() < current.stage()
            || status.stage() > current.stage() + 1
        {
            debug!(
                "Ignoring status change for #{}: {:?} -> {:?}",
                index, current, status
            );
            return false;
        }

        entry.status = status;
        self.presenter.render_status_row(index, status);
        true
    }

    /// Get a row by index
    pub fn entry(&self, index: usize) -> Option<&QueueEntry> {
        index.checked_sub(1).and_then(|i| self.entries.get(i))
    }

    /// All rows in index order
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// URLs still waiting to be handed to the engine, in FIFO order
    pub fn pending_urls(&self) -> Vec<&str> {
        self.pending
            .iter()
            .map(|&index| self.entries[index - 1].url.as_str())
            .collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Count rows per status
    pub fn summary(&self) -> QueueSummary {
        let mut summary = QueueSummary::default();
        for entry in &self.entries {
            match entry.status {
                DownloadStatus::Waiting => summary.waiting += 1,
                DownloadStatus::Downloading(_) => summary.downloading += 1,
                DownloadStatus::Completed => summary.completed += 1,
                DownloadStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}
