//! Request and result types exchanged between callers and the search engine
use secrecy::SecretString;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Preview cap used when a request does not set its own.
pub const DEFAULT_PREVIEW_LENGTH: usize = 100;

/// Everything the engine needs to run one search.
///
/// A request is consumed by [`crate::search::Searcher::new`], so it can not be
/// changed once the search was submitted.
#[derive(Debug)]
pub struct SearchRequest {
    pub root: PathBuf,
    pub query: String,

    pub is_regex_query: bool,
    pub is_case_sensitive_query: bool,
    pub is_search_in_content: bool,
    pub is_only_first_content_match: bool,

    /// Deepest directory (root = 0) whose children are still examined.
    pub max_search_depth: usize,
    /// Either `"exact-name"` (quoted) or a wildcard/regex pattern per entry.
    pub ignored_directories: Vec<String>,
    pub show_match_preview: bool,
    pub show_result_on_cancel: bool,
    pub max_preview_length: usize,
    pub password: Option<SecretString>,
}

impl SearchRequest {
    /// Name-only, case-insensitive literal search without a depth limit.
    pub fn new(root: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            query: query.into(),
            is_regex_query: false,
            is_case_sensitive_query: false,
            is_search_in_content: false,
            is_only_first_content_match: false,
            max_search_depth: usize::MAX,
            ignored_directories: Vec::new(),
            show_match_preview: true,
            show_result_on_cancel: true,
            max_preview_length: DEFAULT_PREVIEW_LENGTH,
            password: None,
        }
    }
}

/// One matching line inside a file. Line numbers start at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentMatch {
    pub line_number: usize,
    pub preview: String,
}

/// A file or directory that matched by name and/or content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FitFile {
    /// Relative to the canonical search root; directories end with a separator.
    pub path: String,
    pub is_directory: bool,
    pub content_matches: Vec<ContentMatch>,
}

impl FitFile {
    pub fn name_match(path: String, is_directory: bool) -> Self {
        Self {
            path,
            is_directory,
            content_matches: Vec::new(),
        }
    }

    pub fn content_match(path: String, content_matches: Vec<ContentMatch>) -> Self {
        Self {
            path,
            is_directory: false,
            content_matches,
        }
    }
}

/// How a search run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStatus {
    Completed,
    /// Cancelled with `show_result_on_cancel`; files holds what was found so far.
    SoftCancelled,
    /// Cancelled without keeping partial results; files is empty.
    HardCancelled,
}

impl SearchStatus {
    pub fn is_cancelled(self) -> bool {
        !matches!(self, SearchStatus::Completed)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStats {
    pub directories_visited: usize,
    pub examined: usize,
    pub matches: usize,
    pub depth_limit_reached: bool,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Terminal value of a search, delivered exactly once.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    pub files: Vec<FitFile>,
    pub stats: SearchStats,
}
