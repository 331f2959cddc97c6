//! Cooperative cancellation shared between a running search and its caller
use crate::search::collector::ResultCollector;
use crate::search::request::{FitFile, SearchStatus};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Clonable handle that requests cancellation of one search.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Cancellation flag plus the policy deciding what happens to partial results.
#[derive(Debug, Clone)]
pub struct CancellationController {
    handle: CancelHandle,
    keep_partial: bool,
}

impl CancellationController {
    pub fn new(keep_partial: bool) -> Self {
        Self {
            handle: CancelHandle::default(),
            keep_partial,
        }
    }

    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    pub fn cancel(&self) {
        self.handle.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.handle.is_cancelled()
    }

    pub fn keeps_partial_results(&self) -> bool {
        self.keep_partial
    }

    /// Turns the collected files into the final status and result list.
    pub fn settle(&self, mut collector: ResultCollector) -> (SearchStatus, Vec<FitFile>) {
        if !self.is_cancelled() {
            return (SearchStatus::Completed, collector.finalize());
        }
        if self.keep_partial {
            (SearchStatus::SoftCancelled, collector.finalize())
        } else {
            (SearchStatus::HardCancelled, Vec::new())
        }
    }
}

/// Holds the handle of whichever search is currently running, so a signal
/// handler installed once can cancel successive searches.
#[derive(Debug, Clone, Default)]
pub struct CancelSlot {
    current: Arc<Mutex<Option<CancelHandle>>>,
}

impl CancelSlot {
    pub fn set(&self, handle: CancelHandle) {
        *self.current.lock() = Some(handle);
    }

    pub fn clear(&self) {
        self.current.lock().take();
    }

    /// Cancels the running search. Returns false when nothing was running.
    pub fn cancel(&self) -> bool {
        match self.current.lock().as_ref() {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }
}
