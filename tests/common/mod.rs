// tests/common/mod.rs
// Shared test doubles for the queue tests
#![allow(dead_code)]

use async_trait::async_trait;
use queueloader::{
    DownloadEngine, DownloadFailure, DownloadFailureKind, DownloadRequest, DownloadStatus,
    Presenter, ProgressEvent, ProgressReporter,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Semaphore;

/// Everything a presenter was asked to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    QueueRow(usize, String),
    StatusRow(usize, DownloadStatus),
    Warning(String),
    Info(String),
}

#[derive(Default)]
struct RecorderState {
    events: Vec<Rendered>,
    statuses: HashMap<usize, DownloadStatus>,
    max_downloading: usize,
}

/// Presenter that records every call; clones share the same log
#[derive(Clone, Default)]
pub struct RecordingPresenter {
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Rendered> {
        self.state.lock().unwrap().events.clone()
    }

    /// Status renders for one row, in order
    pub fn statuses_of(&self, index: usize) -> Vec<DownloadStatus> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Rendered::StatusRow(i, status) if i == index => Some(status),
                _ => None,
            })
            .collect()
    }

    /// Highest number of rows shown as downloading at the same time
    pub fn max_downloading(&self) -> usize {
        self.state.lock().unwrap().max_downloading
    }

    pub fn warnings(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Rendered::Warning(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Rendered::Info(message) => Some(message),
                _ => None,
            })
            .collect()
    }
}

impl Presenter for RecordingPresenter {
    fn render_queue_row(&self, index: usize, url: &str) {
        let mut state = self.state.lock().unwrap();
        state.events.push(Rendered::QueueRow(index, url.to_string()));
    }

    fn render_status_row(&self, index: usize, status: DownloadStatus) {
        let mut state = self.state.lock().unwrap();
        state.events.push(Rendered::StatusRow(index, status));
        state.statuses.insert(index, status);
        let downloading = state
            .statuses
            .values()
            .filter(|status| status.is_downloading())
            .count();
        state.max_downloading = state.max_downloading.max(downloading);
    }

    fn show_warning(&self, message: &str) {
        let mut state = self.state.lock().unwrap();
        state.events.push(Rendered::Warning(message.to_string()));
    }

    fn show_info(&self, message: &str) {
        let mut state = self.state.lock().unwrap();
        state.events.push(Rendered::Info(message.to_string()));
    }
}

/// What the mock engine does on a given call
#[derive(Debug, Clone)]
pub enum Behaviour {
    Succeed,
    Fail,
    Panic,
    Hang,
}

/// Scriptable engine: records requests, emits progress, and succeeds unless told otherwise
pub struct MockEngine {
    requests: Mutex<Vec<DownloadRequest>>,
    /// 1-based call numbers that fail
    fail_on: HashSet<usize>,
    panic_on: HashSet<usize>,
    hang_on: HashSet<usize>,
    progress: Vec<ProgressEvent>,
    /// When set, every call waits for one permit before finishing
    gate: Option<Arc<Semaphore>>,
}

impl MockEngine {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_on: HashSet::new(),
            panic_on: HashSet::new(),
            hang_on: HashSet::new(),
            progress: Vec::new(),
            gate: None,
        }
    }

    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on.insert(call);
        self
    }

    pub fn panicking_on(mut self, call: usize) -> Self {
        self.panic_on.insert(call);
        self
    }

    pub fn hanging_on(mut self, call: usize) -> Self {
        self.hang_on.insert(call);
        self
    }

    pub fn with_progress(mut self, events: Vec<ProgressEvent>) -> Self {
        self.progress = events;
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn requests(&self) -> Vec<DownloadRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|request| request.url).collect()
    }

    fn behaviour(&self, call: usize) -> Behaviour {
        if self.panic_on.contains(&call) {
            Behaviour::Panic
        } else if self.hang_on.contains(&call) {
            Behaviour::Hang
        } else if self.fail_on.contains(&call) {
            Behaviour::Fail
        } else {
            Behaviour::Succeed
        }
    }
}

#[async_trait]
impl DownloadEngine for MockEngine {
    async fn download(
        &self,
        request: DownloadRequest,
        progress: ProgressReporter,
    ) -> Result<(), DownloadFailure> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request.clone());
            requests.len()
        };

        for event in &self.progress {
            progress.report(event.clone());
        }

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        match self.behaviour(call) {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => Err(DownloadFailure::new(
                DownloadFailureKind::Network,
                format!("simulated failure for {}", request.url),
            )),
            Behaviour::Panic => panic!("simulated engine crash"),
            Behaviour::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

/// Poll `check` until it holds or two seconds pass
pub async fn eventually<F>(mut check: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
