use crate::cli::OutputFormat;
use crate::error::{FitgrepError, Result};
use crate::search::{FitFile, SearchOutcome, SearchStatus};
use colored::*;
use serde_json::json;
use std::fmt::Write as _;
use std::path::Path;

/// Renders a finished search for the terminal or for other programs.
pub struct OutputFormatter {
    format: OutputFormat,
    include_summary: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            include_summary: true,
        }
    }

    pub fn with_summary(mut self, include: bool) -> Self {
        self.include_summary = include;
        self
    }

    pub fn format_outcome(&self, outcome: &SearchOutcome, query: &str, root: &Path) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(self.format_text(outcome, query, root)),
            OutputFormat::Json => self.format_json(outcome, query, root),
        }
    }

    fn format_json(&self, outcome: &SearchOutcome, query: &str, root: &Path) -> Result<String> {
        let mut result = json!({
            "query": query,
            "root": root.to_string_lossy(),
            "status": outcome.status,
            "files": outcome.files,
        });
        if self.include_summary {
            result["stats"] = json!({
                "directories_visited": outcome.stats.directories_visited,
                "examined": outcome.stats.examined,
                "matches": outcome.stats.matches,
                "depth_limit_reached": outcome.stats.depth_limit_reached,
                "elapsed_ms": outcome.stats.elapsed.as_millis() as u64,
            });
        }

        serde_json::to_string_pretty(&result)
            .map_err(|e| FitgrepError::Other(format!("JSON serialization failed: {e}")))
    }

    fn format_text(&self, outcome: &SearchOutcome, query: &str, root: &Path) -> String {
        let mut output = String::new();

        if outcome.files.is_empty() {
            let _ = writeln!(output, "{}", "No matches found".yellow());
        }
        for file in &outcome.files {
            format_file(&mut output, file);
        }

        if self.include_summary {
            let stats = &outcome.stats;
            let _ = writeln!(output, "\n{}", "Summary:".green().bold());
            let _ = writeln!(output, "{}: {}", "Query".cyan(), query);
            let _ = writeln!(output, "{}: {}", "Root".cyan(), root.display());
            let _ = writeln!(output, "{}: {}", "Matches".cyan(), stats.matches);
            let _ = writeln!(
                output,
                "{}: {} in {} directories",
                "Examined".cyan(),
                stats.examined,
                stats.directories_visited
            );
            let _ = writeln!(output, "{}: {:.2?}", "Elapsed".cyan(), stats.elapsed);
            if stats.depth_limit_reached {
                let _ = writeln!(output, "{}", "Maximum depth reached".yellow());
            }
        }
        match outcome.status {
            SearchStatus::Completed => {}
            SearchStatus::SoftCancelled => {
                let _ = writeln!(output, "{}", "Search cancelled, results are partial".yellow());
            }
            SearchStatus::HardCancelled => {
                let _ = writeln!(output, "{}", "Search cancelled".red());
            }
        }

        output
    }
}

fn format_file(output: &mut String, file: &FitFile) {
    if file.is_directory {
        let _ = writeln!(output, "{}", file.path.blue().bold());
    } else {
        let _ = writeln!(output, "{}", file.path.bold());
    }
    for m in &file.content_matches {
        if m.preview.is_empty() {
            let _ = writeln!(output, "  {}", format!("{}", m.line_number + 1).green());
        } else {
            let _ = writeln!(
                output,
                "  {} │ {}",
                format!("{:>4}", m.line_number + 1).green(),
                m.preview
            );
        }
    }
}
