pub mod cli;
pub mod config;
pub mod error;
pub mod interactive;
pub mod output_formats;
pub mod progress;
pub mod search;
pub mod walker;

pub use crate::config::Config;
pub use crate::error::{FitgrepError, Result};
pub use crate::progress::{NoProgress, ProgressFn, ProgressSink, ProgressUpdate};
pub use crate::search::{
    search, CancelHandle, ContentMatch, FitFile, QueryHistory, SearchHandle, SearchManager,
    SearchOutcome, SearchRequest, SearchStats, SearchStatus, Searcher,
};
pub use clap::Parser;
