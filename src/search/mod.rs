//! Breadth-first file and content search over a notes directory
pub mod cancel;
pub mod collector;
pub mod content;
pub mod crypto;
pub mod engine;
pub mod history;
pub mod ignore;
pub mod matcher;
pub mod request;

pub use cancel::{CancelHandle, CancelSlot, CancellationController};
pub use collector::ResultCollector;
pub use content::{ContentReader, ExtensionSniffer, TextFileDetector};
pub use crypto::{Decryptor, JencDecryptor, JencVersion};
pub use engine::{search, spawn, SearchHandle, SearchManager, Searcher};
pub use history::QueryHistory;
pub use ignore::IgnoreMatcher;
pub use matcher::QueryMatcher;
pub use request::{
    ContentMatch, FitFile, SearchOutcome, SearchRequest, SearchStats, SearchStatus,
    DEFAULT_PREVIEW_LENGTH,
};
