//! Recently used search queries
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_SIZE: usize = 20;

/// Most-recent-first list of distinct queries with a fixed capacity.
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: VecDeque<String>,
    max_entries: usize,
}

impl Default for QueryHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

impl QueryHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries),
            max_entries,
        }
    }

    /// Moves `query` to the front, evicting the oldest entry when full.
    pub fn add(&mut self, query: &str) {
        if self.max_entries == 0 {
            return;
        }
        if let Some(pos) = self.entries.iter().position(|q| q == query) {
            self.entries.remove(pos);
        }
        self.entries.push_front(query.to_string());
        self.entries.truncate(self.max_entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn latest(&self) -> Option<&str> {
        self.entries.front().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
