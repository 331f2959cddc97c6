use fitgrep::search::matcher::preview;
use fitgrep::search::QueryHistory;
use proptest::prelude::*;

proptest! {
    #[test]
    fn preview_keeps_match_and_bounds_length(
        before in "[a-zé ]{0,300}",
        needle in "[A-Z]{1,20}",
        after in "[a-zé ]{0,300}",
        max_len in 20usize..200,
    ) {
        let line = format!("{before}{needle}{after}");
        let start = before.len();
        let end = start + needle.len();
        let out = preview(&line, start, end, max_len);

        prop_assert!(out.contains(&needle));
        // Window plus at most two 2-char ellipsis markers
        prop_assert!(out.chars().count() <= max_len + 4);
        if line.chars().count() < max_len {
            prop_assert_eq!(&out, &line);
        }
    }

    #[test]
    fn history_stays_bounded_and_unique(
        queries in prop::collection::vec("[a-e]{1,2}", 0..60),
        cap in 0usize..25,
    ) {
        let mut history = QueryHistory::new(cap);
        for q in &queries {
            history.add(q);
        }

        let entries: Vec<&str> = history.iter().collect();
        prop_assert!(entries.len() <= cap);
        let mut unique = entries.clone();
        unique.sort_unstable();
        unique.dedup();
        prop_assert_eq!(unique.len(), entries.len());
        if cap > 0 {
            prop_assert_eq!(history.latest(), queries.last().map(String::as_str));
        }
    }
}
