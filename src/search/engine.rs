//! Breadth-first traversal that drives matching, plus the async submission API
use crate::error::{FitgrepError, Result};
use crate::progress::{ProgressSink, ProgressUpdate};
use crate::search::cancel::{CancelHandle, CancellationController};
use crate::search::collector::ResultCollector;
use crate::search::content::{for_each_line, ContentReader, ExtensionSniffer, TextFileDetector};
use crate::search::crypto::{Decryptor, JencDecryptor};
use crate::search::history::QueryHistory;
use crate::search::ignore::IgnoreMatcher;
use crate::search::matcher::QueryMatcher;
use crate::search::request::{ContentMatch, FitFile, SearchOutcome, SearchRequest, SearchStats};
use crate::walker::{directory_depth, escapes_parent, list_children, relative_display, Child};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A compiled request, ready to be run once.
pub struct Searcher {
    query_text: String,
    root: PathBuf,
    query: QueryMatcher,
    ignore: IgnoreMatcher,
    reader: ContentReader,
    text_detector: Arc<dyn TextFileDetector>,
    search_in_content: bool,
    only_first_content_match: bool,
    max_search_depth: usize,
    keep_partial_on_cancel: bool,
}

impl Searcher {
    /// Compiles the query and the ignore rules. Only an invalid query is an error.
    pub fn new(request: SearchRequest) -> Result<Self> {
        let query = QueryMatcher::new(
            &request.query,
            request.is_regex_query,
            request.is_case_sensitive_query,
            request.show_match_preview,
            request.max_preview_length,
        )?;
        let ignore = IgnoreMatcher::new(
            &request.ignored_directories,
            request.is_case_sensitive_query,
        );
        let root = fs::canonicalize(&request.root).unwrap_or_else(|e| {
            warn!("Search root {} is not accessible: {e}", request.root.display());
            request.root.clone()
        });

        Ok(Self {
            query_text: request.query,
            root,
            query,
            ignore,
            reader: ContentReader::new(Arc::new(JencDecryptor), request.password),
            text_detector: Arc::new(ExtensionSniffer),
            search_in_content: request.is_search_in_content,
            only_first_content_match: request.is_only_first_content_match,
            max_search_depth: request.max_search_depth,
            keep_partial_on_cancel: request.show_result_on_cancel,
        })
    }

    pub fn with_decryptor(mut self, decryptor: Arc<dyn Decryptor>) -> Self {
        self.reader.set_decryptor(decryptor);
        self
    }

    pub fn with_text_detector(mut self, detector: Arc<dyn TextFileDetector>) -> Self {
        self.text_detector = detector;
        self
    }

    /// Canonical root all result paths are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh controller carrying this request's cancel policy.
    pub fn cancellation(&self) -> CancellationController {
        CancellationController::new(self.keep_partial_on_cancel)
    }

    /// Runs the traversal on the current thread until it is exhausted,
    /// cancelled or the depth limit is crossed.
    pub fn run(&self, cancel: &CancellationController, progress: &dyn ProgressSink) -> SearchOutcome {
        let start = Instant::now();
        info!(
            "Searching {} for '{}' (content: {}, max depth: {})",
            self.root.display(),
            self.query_text,
            self.search_in_content,
            self.max_search_depth
        );

        let mut traversal = Traversal {
            searcher: self,
            cancel,
            progress,
            frontier: VecDeque::from([self.root.clone()]),
            collector: ResultCollector::new(),
            stats: SearchStats::default(),
            depth: 0,
        };
        traversal.run();

        let Traversal {
            collector,
            mut stats,
            ..
        } = traversal;
        stats.matches = collector.len();
        stats.elapsed = start.elapsed();
        let (status, files) = cancel.settle(collector);

        info!(
            "Search for '{}' finished ({status:?}): {} matches, {} entries examined in {:.2?}",
            self.query_text, stats.matches, stats.examined, stats.elapsed
        );
        SearchOutcome {
            status,
            files,
            stats,
        }
    }
}

/// State owned by one run; nothing here is shared with the caller.
struct Traversal<'a> {
    searcher: &'a Searcher,
    cancel: &'a CancellationController,
    progress: &'a dyn ProgressSink,
    frontier: VecDeque<PathBuf>,
    collector: ResultCollector,
    stats: SearchStats,
    depth: usize,
}

impl Traversal<'_> {
    fn run(&mut self) {
        while !self.cancel.is_cancelled() {
            let Some(next) = self.frontier.pop_front() else {
                break;
            };
            let dir = match fs::canonicalize(&next) {
                Ok(dir) if dir.is_dir() => dir,
                Ok(_) => continue,
                Err(e) => {
                    debug!("Skipping unreadable directory {}: {e}", next.display());
                    continue;
                }
            };
            let Some(depth) = directory_depth(&self.searcher.root, &dir) else {
                debug!("Skipping {} outside of the search root", dir.display());
                continue;
            };
            // Crossing the limit ends the whole traversal, not just this branch
            if depth > self.searcher.max_search_depth {
                self.stats.depth_limit_reached = true;
                break;
            }

            self.depth = depth;
            self.stats.directories_visited += 1;
            self.report(self.frontier.len() + 1);
            self.visit_directory(&dir);
        }
    }

    fn visit_directory(&mut self, dir: &Path) {
        let children = match list_children(dir) {
            Ok(children) => children,
            Err(e) => {
                debug!("Can not list {}: {e}", dir.display());
                return;
            }
        };

        for child in children {
            if self.cancel.is_cancelled() {
                break;
            }
            self.stats.examined += 1;

            let child = match child {
                Ok(child) => child,
                Err(e) => {
                    debug!("Skipping entry in {}: {e}", dir.display());
                    continue;
                }
            };
            if self.searcher.ignore.is_ignored(&child.name) {
                debug!("Ignoring {}", child.path.display());
                continue;
            }

            if child.is_dir {
                self.visit_subdirectory(child, dir);
            } else if child.is_file {
                self.visit_file(&child);
            }
        }
    }

    fn visit_subdirectory(&mut self, child: Child, parent: &Path) {
        self.match_name(&child);
        if escapes_parent(&child.path, parent) {
            debug!("Not descending into linked directory {}", child.path.display());
            return;
        }
        self.frontier.push_back(child.path);
    }

    fn visit_file(&mut self, child: &Child) {
        let matched_content = self.searcher.search_in_content
            && self.searcher.text_detector.is_text_file(&child.path)
            && self.match_content(child);
        // A read interrupted by cancellation says nothing about the name
        if !matched_content && !self.cancel.is_cancelled() {
            self.match_name(child);
        }
    }

    fn match_name(&mut self, child: &Child) {
        if self.searcher.query.matches_name(&child.name) {
            let path = relative_display(&self.searcher.root, &child.path, child.is_dir);
            self.collector.push(FitFile::name_match(path, child.is_dir));
        }
    }

    /// Returns true when at least one line matched.
    fn match_content(&mut self, child: &Child) -> bool {
        let reader = match self.searcher.reader.open(&child.path) {
            Ok(reader) => reader,
            Err(FitgrepError::Decryption(msg)) => {
                warn!("Skipping encrypted file {}: {msg}", child.path.display());
                return false;
            }
            Err(e) => {
                debug!("Can not read {}: {e}", child.path.display());
                return false;
            }
        };

        let searcher = self.searcher;
        let cancel = self.cancel;
        let mut matches = Vec::new();
        let read = for_each_line(reader, |line_number, line| {
            if cancel.is_cancelled() {
                return false;
            }
            if let Some(preview) = searcher.query.match_line(line) {
                matches.push(ContentMatch {
                    line_number,
                    preview,
                });
                if searcher.only_first_content_match {
                    return false;
                }
            }
            true
        });
        if let Err(e) = read {
            debug!("Read error in {}: {e}", child.path.display());
            return false;
        }
        if matches.is_empty() {
            return false;
        }

        let path = relative_display(&searcher.root, &child.path, false);
        self.collector.push(FitFile::content_match(path, matches));
        true
    }

    fn report(&self, queue_length: usize) {
        self.progress.report(ProgressUpdate {
            queue_length,
            depth: self.depth,
            match_count: self.collector.len(),
            examined_count: self.stats.examined,
        });
    }
}

/// Caller side of a search running on the blocking pool. Dropping it without
/// waiting cancels the search.
pub struct SearchHandle {
    cancel: CancelHandle,
    progress: mpsc::UnboundedReceiver<ProgressUpdate>,
    task: JoinHandle<SearchOutcome>,
    _guard: CancelOnDrop,
}

/// Cancels the search when the owning handle goes away.
struct CancelOnDrop(CancelHandle);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

impl SearchHandle {
    /// Requests cooperative cancellation; takes effect at the next checkpoint.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn canceller(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Next progress update, `None` once the search has finished.
    pub async fn progress(&mut self) -> Option<ProgressUpdate> {
        self.progress.recv().await
    }

    pub async fn wait(self) -> Result<SearchOutcome> {
        self.task
            .await
            .map_err(|e| FitgrepError::TaskFailed(e.to_string()))
    }

    /// Waits for the outcome, feeding every progress update to `on_progress` meanwhile.
    pub async fn wait_with_progress<F>(self, mut on_progress: F) -> Result<SearchOutcome>
    where
        F: FnMut(ProgressUpdate),
    {
        let SearchHandle {
            mut progress,
            mut task,
            ..
        } = self;
        let joined = loop {
            tokio::select! {
                joined = &mut task => break joined,
                Some(update) = progress.recv() => on_progress(update),
            }
        };
        while let Ok(update) = progress.try_recv() {
            on_progress(update);
        }
        joined.map_err(|e| FitgrepError::TaskFailed(e.to_string()))
    }
}

/// Runs `searcher` on Tokio's blocking pool.
pub fn spawn(searcher: Searcher) -> Result<SearchHandle> {
    let runtime = tokio::runtime::Handle::try_current().map_err(|_| FitgrepError::NoRuntime)?;
    let cancel = searcher.cancellation();
    let handle = cancel.handle();
    let (tx, rx) = mpsc::unbounded_channel();
    let task = runtime.spawn_blocking(move || searcher.run(&cancel, &tx));

    Ok(SearchHandle {
        progress: rx,
        task,
        _guard: CancelOnDrop(handle.clone()),
        cancel: handle,
    })
}

/// Submits a single search without recording history.
pub fn search(request: SearchRequest) -> Result<SearchHandle> {
    spawn(Searcher::new(request)?)
}

/// Long-lived owner of the query history and the collaborators every search uses.
pub struct SearchManager {
    history: Mutex<QueryHistory>,
    decryptor: Arc<dyn Decryptor>,
    text_detector: Arc<dyn TextFileDetector>,
}

impl Default for SearchManager {
    fn default() -> Self {
        Self::new(QueryHistory::default())
    }
}

impl SearchManager {
    pub fn new(history: QueryHistory) -> Self {
        Self {
            history: Mutex::new(history),
            decryptor: Arc::new(JencDecryptor),
            text_detector: Arc::new(ExtensionSniffer),
        }
    }

    pub fn with_decryptor(mut self, decryptor: Arc<dyn Decryptor>) -> Self {
        self.decryptor = decryptor;
        self
    }

    pub fn with_text_detector(mut self, detector: Arc<dyn TextFileDetector>) -> Self {
        self.text_detector = detector;
        self
    }

    /// Compiles and starts `request`. The query enters the history only once
    /// the search was actually started.
    pub fn search(&self, request: SearchRequest) -> Result<SearchHandle> {
        let query = request.query.clone();
        let searcher = Searcher::new(request)?
            .with_decryptor(self.decryptor.clone())
            .with_text_detector(self.text_detector.clone());
        let handle = spawn(searcher)?;
        self.history.lock().add(&query);
        Ok(handle)
    }

    /// Snapshot of the history, most recent first.
    pub fn history(&self) -> Vec<String> {
        self.history.lock().iter().map(str::to_string).collect()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}
