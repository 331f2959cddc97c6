use crate::cli::{OutputFormat, SearchArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output_formats::OutputFormatter;
use crate::progress::ProgressReporter;
use crate::search::{CancelSlot, QueryHistory, SearchManager};
use colored::*;
use log::{info, warn};
use std::io::{BufRead, Write};
use std::path::PathBuf;

const PROMPT: &str = "fitgrep> ";

/// What a line typed at the prompt asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command<'a> {
    Search(&'a str),
    History,
    ClearHistory,
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line {
            "" => Command::Empty,
            ":q" | ":quit" | ":exit" => Command::Quit,
            ":h" | ":history" => Command::History,
            ":clear" => Command::ClearHistory,
            ":help" | ":?" => Command::Help,
            _ if line.starts_with(':') && !line.starts_with("::") => Command::Unknown(line),
            // A leading "::" escapes a query that starts with a colon
            _ if line.starts_with("::") => Command::Search(&line[1..]),
            _ => Command::Search(line),
        }
    }
}

/// Interactive search session: one root, successive queries, shared history.
pub struct InteractiveSearch {
    manager: SearchManager,
    root: PathBuf,
    config: Config,
    options: SearchArgs,
    active: CancelSlot,
}

impl InteractiveSearch {
    pub fn new(root: PathBuf, config: Config, options: SearchArgs, active: CancelSlot) -> Self {
        let manager = SearchManager::new(QueryHistory::new(config.history.max_entries));
        Self {
            manager,
            root,
            config,
            options,
            active,
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.manager.history()
    }

    /// Reads commands from `input` until `:quit` or end of input.
    pub async fn run<R, W>(&self, mut input: R, mut output: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        info!("Starting interactive search in {}", self.root.display());
        writeln!(
            output,
            "{}",
            "Type a query to search, :help for commands".dimmed()
        )?;

        let mut line = String::new();
        loop {
            write!(output, "{PROMPT}")?;
            output.flush()?;

            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(output)?;
                break;
            }

            match Command::parse(&line) {
                Command::Quit => break,
                Command::Empty => {}
                Command::Help => print_help(&mut output)?,
                Command::History => self.print_history(&mut output)?,
                Command::ClearHistory => {
                    self.manager.clear_history();
                    writeln!(output, "{}", "History cleared".green())?;
                }
                Command::Unknown(cmd) => {
                    writeln!(output, "{} {cmd}", "Unknown command:".red())?;
                }
                Command::Search(query) => self.run_query(query, &mut output).await?,
            }
        }

        info!("Interactive search finished");
        Ok(())
    }

    async fn run_query<W: Write>(&self, query: &str, output: &mut W) -> Result<()> {
        let request = self.options.to_request(&self.config, &self.root, query);
        let handle = match self.manager.search(request) {
            Ok(handle) => handle,
            Err(e) => {
                // A bad query only ends this round, not the session
                warn!("{e}");
                writeln!(output, "{}", e.to_string().red())?;
                return Ok(());
            }
        };

        self.active.set(handle.canceller());
        let show_progress =
            self.config.display.show_progress && self.options.format == OutputFormat::Text;
        let reporter = if show_progress {
            ProgressReporter::new(query)
        } else {
            ProgressReporter::hidden(query)
        };
        let outcome = handle.wait_with_progress(|update| reporter.update(update)).await;
        reporter.finish();
        self.active.clear();

        let outcome = outcome?;
        let rendered = OutputFormatter::new(self.options.format)
            .with_summary(self.config.display.show_summary)
            .format_outcome(&outcome, query, &self.root)?;
        writeln!(output, "{rendered}")?;
        Ok(())
    }

    fn print_history<W: Write>(&self, output: &mut W) -> Result<()> {
        let history = self.manager.history();
        if history.is_empty() {
            writeln!(output, "{}", "No queries yet".yellow())?;
        }
        for (i, query) in history.iter().enumerate() {
            writeln!(output, "{:>3}  {}", (i + 1).to_string().cyan(), query)?;
        }
        Ok(())
    }
}

fn print_help<W: Write>(output: &mut W) -> Result<()> {
    writeln!(output, "{}", "Commands:".green().bold())?;
    writeln!(output, "  <query>    search for <query>")?;
    writeln!(output, "  ::<query>  search for a query starting with ':'")?;
    writeln!(output, "  :history   list recent queries, newest first")?;
    writeln!(output, "  :clear     forget all recent queries")?;
    writeln!(output, "  :quit      leave")?;
    writeln!(output, "Press Ctrl-C to cancel a running search.")?;
    Ok(())
}
