//! Accumulates matches during a traversal
use crate::search::request::FitFile;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ResultCollector {
    files: Vec<FitFile>,
    seen: HashSet<String>,
    sorted: bool,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `file` unless its path was already collected.
    pub fn push(&mut self, file: FitFile) -> bool {
        if !self.seen.insert(file.path.clone()) {
            return false;
        }
        self.files.push(file);
        self.sorted = false;
        true
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Sorts by path ignoring case. Sorting only happens once, later calls are free.
    pub fn sorted(&mut self) -> &[FitFile] {
        if !self.sorted {
            self.files.sort_by_cached_key(|f| f.path.to_lowercase());
            self.sorted = true;
        }
        &self.files
    }

    pub fn finalize(&mut self) -> Vec<FitFile> {
        self.sorted();
        std::mem::take(&mut self.files)
    }
}
