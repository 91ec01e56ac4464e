// src/controller.rs
// Sequential queue processing: one download at a time, FIFO, failures isolated

use crate::engine::{DownloadEngine, DownloadRequest, ProgressEvent, ProgressReporter, ProgressStatus};
use crate::error::{AppError, DownloadFailure, DownloadFailureKind};
use crate::queue_store::{DownloadStatus, QueueEntry, QueueStore, QueueSummary};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::AbortHandle;

/// Whether a download is in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Busy,
}

/// The single in-flight download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDownload {
    pub url: String,
    pub index: usize,
}

/// Messages handled by the controller's owner task.
///
/// User actions come from `QueueHandle`; `Progress` and `Finished` come from
/// the background download task.
#[derive(Debug)]
enum QueueCommand {
    Submit {
        url: String,
        reply: oneshot::Sender<Result<usize, AppError>>,
    },
    SetDestination(PathBuf),
    Entries(oneshot::Sender<Vec<QueueEntry>>),
    Summary(oneshot::Sender<QueueSummary>),
    Progress {
        index: usize,
        event: ProgressEvent,
    },
    Finished {
        index: usize,
        outcome: Result<(), DownloadFailure>,
    },
    Shutdown,
}

/// Owns the queue store and sequences downloads through the engine
pub struct QueueController {
    store: QueueStore,
    engine: Arc<dyn DownloadEngine>,
    active: Option<ActiveDownload>,
    /// Aborts the engine call of the active download on shutdown
    active_task: Option<AbortHandle>,
    download_timeout: Option<Duration>,
    command_tx: mpsc::UnboundedSender<QueueCommand>,
    command_rx: Option<mpsc::UnboundedReceiver<QueueCommand>>,
    state_tx: watch::Sender<ControllerState>,
}

impl QueueController {
    pub fn new(store: QueueStore, engine: Arc<dyn DownloadEngine>) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(ControllerState::Idle);

        Self {
            store,
            engine,
            active: None,
            active_task: None,
            download_timeout: None,
            command_tx,
            command_rx: Some(command_rx),
            state_tx,
        }
    }

    /// Bound every download by `timeout`; `None` waits indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// Start the owner task and return the handle used to drive it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut self) -> QueueHandle {
        let handle = QueueHandle {
            command_tx: self.command_tx.clone(),
            state_rx: self.state_tx.subscribe(),
        };

        if let Some(command_rx) = self.command_rx.take() {
            tokio::spawn(self.run(command_rx));
        }

        handle
    }

    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<QueueCommand>) {
        debug!("Queue controller started");

        while let Some(cmd) = command_rx.recv().await {
            match cmd {
                QueueCommand::Submit { url, reply } => {
                    let result = self.on_submit(&url);
                    let _ = reply.send(result);
                }
                QueueCommand::SetDestination(path) => self.on_set_destination(path),
                QueueCommand::Entries(reply) => {
                    let _ = reply.send(self.store.entries().to_vec());
                }
                QueueCommand::Summary(reply) => {
                    let _ = reply.send(self.store.summary());
                }
                QueueCommand::Progress { index, event } => self.on_progress(index, event),
                QueueCommand::Finished { index, outcome } => self.on_finished(index, outcome),
                QueueCommand::Shutdown => break,
            }
        }

        if let Some(task) = self.active_task.take() {
            debug!("Aborting in-flight download on shutdown");
            task.abort();
        }
        self.active = None;
        self.state_tx.send_replace(ControllerState::Idle);
        debug!("Queue controller stopped");
    }

    fn on_submit(&mut self, url: &str) -> Result<usize, AppError> {
        let result = self.store.submit(url);

        match &result {
            Ok(index) => {
                info!("Added #{} to queue: {}", index, url.trim());
                if self.active.is_none() {
                    self.advance_and_start();
                }
            }
            Err(AppError::ValidationError(message)) => {
                self.store.presenter().show_warning(message);
            }
            Err(AppError::DuplicateError(_)) => {
                self.store
                    .presenter()
                    .show_info("This URL is already in the queue.");
            }
            Err(e) => warn!("Unexpected submit error: {}", e),
        }

        result
    }

    fn on_set_destination(&mut self, path: PathBuf) {
        let shown = path.display().to_string();
        match self.store.set_destination(path) {
            Ok(()) => self
                .store
                .presenter()
                .show_info(&format!("Downloads will be saved to {}", shown)),
            Err(AppError::ValidationError(message)) => {
                self.store.presenter().show_warning(&message)
            }
            Err(e) => warn!("Unexpected destination error: {}", e),
        }
    }

    /// Folder to write into, if one is set and non-empty
    fn usable_destination(&self) -> Option<PathBuf> {
        self.store
            .destination()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| dir.to_path_buf())
    }

    /// Hand the next pending URL to the engine, or go idle when none is left
    fn advance_and_start(&mut self) {
        while let Some((url, index)) = self.store.pop_next() {
            self.store.update_status(index, DownloadStatus::Downloading(0));

            match self.usable_destination() {
                Some(destination) => {
                    self.start_download(url, index, &destination);
                    return;
                }
                None => {
                    error!("No destination folder for #{} ({}), skipping it", index, url);
                    self.store.update_status(index, DownloadStatus::Failed);
                }
            }
        }

        debug!("Queue drained");
        self.active = None;
        self.active_task = None;
        self.state_tx.send_replace(ControllerState::Idle);
    }

    fn start_download(&mut self, url: String, index: usize, destination: &Path) {
        let request = DownloadRequest::new(&url, destination);

        info!("Starting download #{}: {}", index, url);
        self.active = Some(ActiveDownload { url, index });
        self.state_tx.send_replace(ControllerState::Busy);

        let progress_tx = self.command_tx.clone();
        let reporter = ProgressReporter::new(move |event| {
            let _ = progress_tx.send(QueueCommand::Progress { index, event });
        });

        let engine = Arc::clone(&self.engine);
        let timeout = self.download_timeout;
        let download = tokio::spawn(async move {
            let call = engine.download(request, reporter);
            match timeout {
                Some(limit) => match tokio::time::timeout(limit, call).await {
                    Ok(result) => result,
                    Err(_) => Err(DownloadFailure::new(
                        DownloadFailureKind::TimedOut,
                        format!("no result after {:?}", limit),
                    )),
                },
                None => call.await,
            }
        });
        self.active_task = Some(download.abort_handle());

        // Reports back only once the engine call has ended, after all its progress events
        let finished_tx = self.command_tx.clone();
        tokio::spawn(async move {
            let outcome = match download.await {
                Ok(result) => result,
                Err(e) if e.is_cancelled() => return,
                Err(e) => Err(DownloadFailure::new(
                    DownloadFailureKind::Crashed,
                    format!("Download task failed: {}", e),
                )),
            };
            let _ = finished_tx.send(QueueCommand::Finished { index, outcome });
        });
    }

    fn is_active(&self, index: usize) -> bool {
        self.active.as_ref().is_some_and(|active| active.index == index)
    }

    fn on_progress(&mut self, index: usize, event: ProgressEvent) {
        if !self.is_active(index) {
            debug!("Dropping stale progress for #{}: {:?}", index, event);
            return;
        }

        match event.status {
            ProgressStatus::Downloading => match event.percent_complete() {
                Some(percent) => {
                    self.store
                        .update_status(index, DownloadStatus::Downloading(percent));
                }
                None => debug!("Unreadable progress for #{}: {:?}", index, event.percent),
            },
            ProgressStatus::Finished => info!("Link {} finished downloading", index),
            ProgressStatus::Other(status) => debug!("Download #{} reported {}", index, status),
        }
    }

    fn on_finished(&mut self, index: usize, outcome: Result<(), DownloadFailure>) {
        if !self.is_active(index) {
            debug!("Ignoring completion for inactive #{}", index);
            return;
        }

        let url = self
            .active
            .take()
            .map(|active| active.url)
            .unwrap_or_default();
        self.active_task = None;

        match outcome {
            Ok(()) => {
                info!("Download #{} completed: {}", index, url);
                self.store.update_status(index, DownloadStatus::Completed);
            }
            Err(failure) => {
                error!("Error downloading {} (#{}): {}", url, index, failure);
                self.store.update_status(index, DownloadStatus::Failed);
            }
        }

        self.advance_and_start();
    }
}

/// Cloneable command surface of a running `QueueController`
#[derive(Debug, Clone)]
pub struct QueueHandle {
    command_tx: mpsc::UnboundedSender<QueueCommand>,
    state_rx: watch::Receiver<ControllerState>,
}

impl QueueHandle {
    fn send(&self, cmd: QueueCommand) -> Result<(), AppError> {
        self.command_tx
            .send(cmd)
            .map_err(|_| AppError::ChannelClosed)
    }

    /// Queue a URL; starts downloading right away when the controller is idle
    pub async fn submit(&self, url: &str) -> Result<usize, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(QueueCommand::Submit {
            url: url.to_string(),
            reply,
        })?;
        response.await.map_err(|_| AppError::ChannelClosed)?
    }

    /// Queue several URLs in order and return how many were accepted.
    ///
    /// Rejected URLs (validation or duplicate) have already been shown by the
    /// presenter and are skipped.
    pub async fn submit_all<I, S>(&self, urls: I) -> Result<usize, AppError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut queued = 0;
        for url in urls {
            match self.submit(url.as_ref()).await {
                Ok(index) => {
                    debug!("Submitted {} as #{}", url.as_ref(), index);
                    queued += 1;
                }
                Err(AppError::ValidationError(_)) | Err(AppError::DuplicateError(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(queued)
    }

    /// Choose the folder downloads are written to; an empty path is refused
    pub fn set_destination(&self, destination: PathBuf) -> Result<(), AppError> {
        self.send(QueueCommand::SetDestination(destination))
    }

    /// Snapshot of every row in index order
    pub async fn entries(&self) -> Result<Vec<QueueEntry>, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(QueueCommand::Entries(reply))?;
        response.await.map_err(|_| AppError::ChannelClosed)
    }

    pub async fn summary(&self) -> Result<QueueSummary, AppError> {
        let (reply, response) = oneshot::channel();
        self.send(QueueCommand::Summary(reply))?;
        response.await.map_err(|_| AppError::ChannelClosed)
    }

    pub fn state(&self) -> ControllerState {
        *self.state_rx.borrow()
    }

    /// Resolve once no download is in flight and nothing is pending
    pub async fn wait_until_idle(&self) -> Result<(), AppError> {
        let mut state_rx = self.state_rx.clone();
        state_rx
            .wait_for(|state| *state == ControllerState::Idle)
            .await
            .map(|_| ())
            .map_err(|_| AppError::ChannelClosed)
    }

    /// Stop the controller; an in-flight download is aborted
    pub fn shutdown(&self) -> Result<(), AppError> {
        self.send(QueueCommand::Shutdown)
    }
}
