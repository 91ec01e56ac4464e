// src/presenter.rs
// Rendering side of the queue: the store and controller push row updates here

use colored::*;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::queue_store::DownloadStatus;

/// Receives render notifications from the queue.
///
/// Implementations are driven from the controller's owner task only, so calls
/// for a given row arrive in the order the queue state changed.
pub trait Presenter: Send {
    /// A new row was added to the queue list
    fn render_queue_row(&self, index: usize, url: &str);

    /// The status of an existing row changed
    fn render_status_row(&self, index: usize, status: DownloadStatus);

    /// A user action was rejected (empty URL, no destination folder)
    fn show_warning(&self, message: &str);

    /// Informational notice (duplicate URL, destination changed)
    fn show_info(&self, message: &str);
}

/// Presenter that discards everything
#[derive(Debug, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn render_queue_row(&self, _index: usize, _url: &str) {}
    fn render_status_row(&self, _index: usize, _status: DownloadStatus) {}
    fn show_warning(&self, _message: &str) {}
    fn show_info(&self, _message: &str) {}
}

/// Terminal presenter with one progress bar per queue row
pub struct ConsolePresenter {
    multi: MultiProgress,
    /// Bar and URL of every row, keyed by index
    bars: Mutex<HashMap<usize, (ProgressBar, String)>>,
}

impl Default for ConsolePresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolePresenter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:>4} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-")
    }

    /// Print a line without tearing the progress bars
    fn println(&self, line: String) {
        if self.multi.println(&line).is_err() {
            println!("{}", line);
        }
    }
}

impl Presenter for ConsolePresenter {
    fn render_queue_row(&self, index: usize, url: &str) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(Self::bar_style());
        bar.set_prefix(format!("{}.", index));
        bar.set_message(url.to_string());

        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(index, (bar, url.to_string()));
        }
    }

    fn render_status_row(&self, index: usize, status: DownloadStatus) {
        let bars = match self.bars.lock() {
            Ok(bars) => bars,
            Err(_) => return,
        };
        let Some((bar, url)) = bars.get(&index) else {
            return;
        };

        let text = status.display_text();
        match status {
            DownloadStatus::Waiting => bar.set_message(format!("{} {}", url, text.blue())),
            DownloadStatus::Downloading(percent) => {
                bar.set_position(u64::from(percent));
                bar.set_message(format!("{} {}", url, text.yellow()));
            }
            DownloadStatus::Completed => {
                bar.set_position(100);
                bar.finish_with_message(format!("{} {}", url, text.green()));
            }
            DownloadStatus::Failed => {
                bar.abandon_with_message(format!("{} {}", url, text.red()));
            }
        }
    }

    fn show_warning(&self, message: &str) {
        self.println(format!("{}: {}", "Warning".yellow().bold(), message));
    }

    fn show_info(&self, message: &str) {
        self.println(format!("{}", message.blue()));
    }
}
