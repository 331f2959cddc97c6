use crate::search::history::DEFAULT_HISTORY_SIZE;
use crate::search::{SearchRequest, DEFAULT_PREVIEW_LENGTH};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub regex: bool,
    pub case_sensitive: bool,
    pub search_in_content: bool,
    pub only_first_content_match: bool,
    /// Deepest level to descend into, counted like `--max-depth`; unset means no limit.
    pub max_depth: Option<usize>,
    pub ignored_directories: Vec<String>,
    pub show_match_preview: bool,
    pub show_result_on_cancel: bool,
    pub preview_length: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            regex: false,
            case_sensitive: false,
            search_in_content: false,
            only_first_content_match: false,
            max_depth: None,
            ignored_directories: Vec::new(),
            show_match_preview: true,
            show_result_on_cancel: true,
            preview_length: DEFAULT_PREVIEW_LENGTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_HISTORY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub show_progress: bool,
    pub show_summary: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            show_summary: true,
        }
    }
}

impl Config {
    /// Loads the first configuration file found, or the defaults when there is none.
    pub fn load() -> Result<Self> {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn find_config_path() -> Option<PathBuf> {
        if let Some(xdg_config) = dirs::config_dir() {
            let xdg_path = xdg_config.join("fitgrep/config.toml");
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let home_path = home.join(".fitgrep.toml");
            if home_path.exists() {
                return Some(home_path);
            }
        }

        let current_path = Path::new(".fitgrep.toml");
        if current_path.exists() {
            return Some(current_path.to_path_buf());
        }

        None
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// A request carrying the configured defaults.
    pub fn to_request(&self, root: impl Into<PathBuf>, query: impl Into<String>) -> SearchRequest {
        let search = &self.search;
        let mut request = SearchRequest::new(root, query);
        request.is_regex_query = search.regex;
        request.is_case_sensitive_query = search.case_sensitive;
        request.is_search_in_content = search.search_in_content;
        request.is_only_first_content_match = search.only_first_content_match;
        request.max_search_depth = search.max_depth.unwrap_or(usize::MAX);
        request.ignored_directories = search.ignored_directories.clone();
        request.show_match_preview = search.show_match_preview;
        request.show_result_on_cancel = search.show_result_on_cancel;
        request.max_preview_length = search.preview_length;
        request
    }
}
