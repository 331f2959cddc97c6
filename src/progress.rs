use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;

/// Snapshot of a running search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressUpdate {
    /// Directories waiting in the frontier, including the one being listed.
    pub queue_length: usize,
    pub depth: usize,
    pub match_count: usize,
    pub examined_count: usize,
}

/// Receiver of best-effort progress updates. Failing to deliver is never an error.
pub trait ProgressSink: Send + Sync {
    fn report(&self, update: ProgressUpdate);
}

/// Discards all updates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _update: ProgressUpdate) {}
}

impl ProgressSink for mpsc::UnboundedSender<ProgressUpdate> {
    fn report(&self, update: ProgressUpdate) {
        // The receiver may already be gone
        let _ = self.send(update);
    }
}

/// Adapts a closure into a [`ProgressSink`].
pub struct ProgressFn<F>(pub F);

impl<F> ProgressSink for ProgressFn<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.0)(update)
    }
}

/// Terminal spinner showing the latest progress of a search.
pub struct ProgressReporter {
    spinner: ProgressBar,
    query: String,
}

impl ProgressReporter {
    pub fn new(query: &str) -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
        {
            spinner.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        spinner.enable_steady_tick(Duration::from_millis(120));

        let reporter = Self {
            spinner,
            query: query.to_string(),
        };
        reporter.update(ProgressUpdate::default());
        reporter
    }

    /// A reporter that draws nothing, for `--format json` and disabled progress.
    pub fn hidden(query: &str) -> Self {
        Self {
            spinner: ProgressBar::hidden(),
            query: query.to_string(),
        }
    }

    pub fn update(&self, update: ProgressUpdate) {
        self.spinner.set_message(format_update(&update, &self.query));
    }

    pub fn finish(&self) {
        self.spinner.finish_and_clear();
    }
}

pub fn format_update(update: &ProgressUpdate, query: &str) -> String {
    format!(
        "⭕{} || 🔍{} || ⬇️ {} || 👁️{}  {}",
        update.match_count, update.queue_length, update.depth, update.examined_count, query
    )
}
