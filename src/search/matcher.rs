//! Query matching for file names and single lines, plus match previews
use crate::error::{FitgrepError, Result};
use crate::search::ignore::expand_wildcards;
use regex::{Regex, RegexBuilder};

const ELLIPSIS_START: &str = "… ";
const ELLIPSIS_END: &str = " …";

/// Compiled query of one search.
///
/// Literal queries are escaped into a regex, so both modes share the
/// same case folding and report byte offsets into the original line.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    find: Regex,
    full: Regex,
    is_regex: bool,
    show_preview: bool,
    max_preview_length: usize,
}

impl QueryMatcher {
    pub fn new(
        query: &str,
        is_regex: bool,
        case_sensitive: bool,
        show_preview: bool,
        max_preview_length: usize,
    ) -> Result<Self> {
        let source = if is_regex {
            expand_wildcards(query)
        } else {
            regex::escape(query)
        };
        let compile = |pattern: &str| {
            RegexBuilder::new(pattern)
                .case_insensitive(!case_sensitive)
                .build()
                .map_err(|source| FitgrepError::QueryCompile {
                    query: query.to_string(),
                    source,
                })
        };

        Ok(Self {
            find: compile(&source)?,
            full: compile(&format!("^(?:{source})$"))?,
            is_regex,
            show_preview,
            max_preview_length,
        })
    }

    /// Regex queries must match the whole name, literal ones only a part of it.
    pub fn matches_name(&self, name: &str) -> bool {
        if self.is_regex {
            self.full.is_match(name)
        } else {
            self.find.is_match(name)
        }
    }

    /// Returns the preview of the first match in `line`, or `None` without a match.
    ///
    /// The preview is empty when previews are disabled.
    pub fn match_line(&self, line: &str) -> Option<String> {
        let m = self.find.find(line)?;
        if !self.show_preview {
            return Some(String::new());
        }
        Some(preview(line, m.start(), m.end(), self.max_preview_length))
    }
}

/// Cuts a window of about `max_len` characters around `line[start..end]`.
///
/// Lines shorter than `max_len` characters are returned whole. Lengths are
/// counted in characters, `start`/`end` are byte offsets on char boundaries.
pub fn preview(line: &str, start: usize, end: usize, max_len: usize) -> String {
    let line_chars = line.chars().count();
    if line_chars < max_len {
        return line.to_string();
    }

    let start_char = line[..start].chars().count();
    let match_chars = line[start..end].chars().count();
    let offset = max_len.saturating_sub(match_chars) / 2;
    let from = start_char.saturating_sub(offset);
    let to = (start_char + match_chars + offset).min(line_chars);

    let window: String = line.chars().skip(from).take(to - from).collect();
    let mut out = String::with_capacity(window.len() + 8);
    if from > 0 {
        out.push_str(ELLIPSIS_START);
    }
    out.push_str(&window);
    if to < line_chars {
        out.push_str(ELLIPSIS_END);
    }
    out
}
