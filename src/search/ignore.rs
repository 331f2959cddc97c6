//! Directory/file ignore rules
use log::warn;
use regex::Regex;

/// Rules applied to every search on top of the user supplied ones.
pub const DEFAULT_IGNORED_DIRS: &[&str] = &[r"^\.git$", r"^\.tmp$", ".*[Tt]humb.*"];

/// Rewrites every `*` that is not directly preceded by a `.` into `.*`.
///
/// `*.md` becomes `.*.md`, `a.*b` is left alone and `**` becomes `.*.*`.
/// The lookbehind is evaluated against the input, not the partially rewritten output.
pub fn expand_wildcards(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut prev = None;
    for c in pattern.chars() {
        if c == '*' && prev != Some('.') {
            out.push_str(".*");
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    Exact(String),
    Pattern(Regex),
}

/// One compiled ignore rule, remembering the case mode it was compiled for.
#[derive(Debug, Clone)]
pub struct IgnoreRule {
    pub kind: RuleKind,
    pub case_sensitive: bool,
}

impl IgnoreRule {
    /// Returns `None` for empty input and for patterns that do not compile.
    pub fn compile(raw: &str, case_sensitive: bool) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }
        let raw = if case_sensitive {
            raw.to_string()
        } else {
            raw.to_lowercase()
        };

        if raw.starts_with('"') {
            let exact = raw.replace('"', "");
            if exact.is_empty() {
                return None;
            }
            return Some(Self {
                kind: RuleKind::Exact(exact),
                case_sensitive,
            });
        }

        let expanded = expand_wildcards(&raw);
        match Regex::new(&format!("^(?:{expanded})$")) {
            Ok(regex) => Some(Self {
                kind: RuleKind::Pattern(regex),
                case_sensitive,
            }),
            Err(e) => {
                warn!("Dropping ignore pattern that can not be compiled: {expanded}: {e}");
                None
            }
        }
    }

    /// `name` must already be case-normalized for this rule.
    fn matches_normalized(&self, name: &str) -> bool {
        match &self.kind {
            RuleKind::Exact(exact) => exact == name,
            RuleKind::Pattern(regex) => regex.is_match(name),
        }
    }
}

/// Compiled set of exact and pattern ignore rules for one search.
#[derive(Debug, Clone)]
pub struct IgnoreMatcher {
    rules: Vec<IgnoreRule>,
    case_sensitive: bool,
}

impl IgnoreMatcher {
    /// Compiles `user_rules` followed by [`DEFAULT_IGNORED_DIRS`].
    pub fn new<S: AsRef<str>>(user_rules: &[S], case_sensitive: bool) -> Self {
        let rules = user_rules
            .iter()
            .map(AsRef::as_ref)
            .chain(DEFAULT_IGNORED_DIRS.iter().copied())
            .filter_map(|raw| IgnoreRule::compile(raw, case_sensitive))
            .collect();
        Self {
            rules,
            case_sensitive,
        }
    }

    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        let lowered;
        let name = if self.case_sensitive {
            name
        } else {
            lowered = name.to_lowercase();
            &lowered
        };
        self.rules.iter().any(|rule| rule.matches_normalized(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_expand_wildcards_rewrites_bare_star() {
        assert_eq!(expand_wildcards("*.md"), ".*.md");
        assert_eq!(expand_wildcards("build*"), "build.*");
        assert_eq!(expand_wildcards("a*b*c"), "a.*b.*c");
    }

    #[test]
    fn test_expand_wildcards_keeps_dot_star() {
        assert_eq!(expand_wildcards(".*"), ".*");
        assert_eq!(expand_wildcards("a.*b"), "a.*b");
        assert_eq!(expand_wildcards(".*[Tt]humb.*"), ".*[Tt]humb.*");
    }

    #[test]
    fn test_expand_wildcards_characterization() {
        // Each star is judged by the character before it in the input.
        assert_eq!(expand_wildcards("**"), ".*.*");
        assert_eq!(expand_wildcards(".**"), ".*.*");
        // An escaped star is still rewritten, turning it into "any number of dots".
        assert_eq!(expand_wildcards(r"\*"), r"\.*");
        assert_eq!(expand_wildcards("no-stars"), "no-stars");
        assert_eq!(expand_wildcards(""), "");
    }

    #[test]
    fn test_default_rules_apply_without_user_rules() {
        let matcher = IgnoreMatcher::new(NONE, false);
        assert!(matcher.is_ignored(".git"));
        assert!(matcher.is_ignored(".tmp"));
        assert!(matcher.is_ignored(".thumbnails"));
        assert!(matcher.is_ignored("Thumbs"));
        assert!(!matcher.is_ignored("notes"));
        assert!(!matcher.is_ignored(".github"));
    }

    #[test]
    fn test_default_rules_case_sensitive() {
        let matcher = IgnoreMatcher::new(NONE, true);
        assert!(matcher.is_ignored(".git"));
        assert!(!matcher.is_ignored(".GIT"));
        assert!(matcher.is_ignored("Thumbs"));
        assert!(matcher.is_ignored("thumbs"));
        assert!(!matcher.is_ignored("THUMBS"));
    }

    #[test]
    fn test_quoted_rule_is_exact() {
        let matcher = IgnoreMatcher::new(&["\"build\""], false);
        assert!(matcher.is_ignored("build"));
        assert!(matcher.is_ignored("BUILD"));
        assert!(!matcher.is_ignored("builder"));
        assert!(matches!(matcher.rules()[0].kind, RuleKind::Exact(ref s) if s == "build"));
    }

    #[test]
    fn test_quoted_regex_chars_are_literal() {
        let matcher = IgnoreMatcher::new(&["\"a.b\""], true);
        assert!(matcher.is_ignored("a.b"));
        assert!(!matcher.is_ignored("axb"));
    }

    #[test]
    fn test_empty_rules_are_skipped() {
        let matcher = IgnoreMatcher::new(&["", "\"\""], false);
        assert_eq!(matcher.rules().len(), DEFAULT_IGNORED_DIRS.len());
    }

    #[test]
    fn test_wildcard_rule_must_match_whole_name() {
        let matcher = IgnoreMatcher::new(&["node*"], false);
        assert!(matcher.is_ignored("node_modules"));
        assert!(!matcher.is_ignored("my_node_modules"));
    }

    #[test]
    fn test_invalid_pattern_is_dropped() {
        let matcher = IgnoreMatcher::new(&["(unclosed", "cache"], false);
        assert_eq!(matcher.rules().len(), 1 + DEFAULT_IGNORED_DIRS.len());
        assert!(matcher.is_ignored("cache"));
        assert!(!matcher.is_ignored("(unclosed"));
    }

    #[test]
    fn test_case_insensitive_lowercases_pattern() {
        let matcher = IgnoreMatcher::new(&["Archive"], false);
        assert!(matcher.is_ignored("archive"));
        assert!(matcher.is_ignored("ARCHIVE"));
        assert!(!matcher.rules()[0].case_sensitive);
    }
}
