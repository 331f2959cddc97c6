use crate::config::Config;
use crate::search::SearchRequest;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use secrecy::SecretString;
use std::fmt;
use std::path::PathBuf;

/// Environment variable holding the password for `.jenc` notes.
pub const DEFAULT_PASSWORD_ENV: &str = "FITGREP_PASSWORD";

#[derive(Parser, Debug)]
#[clap(author, version, about = "Search file names and note contents", long_about = None)]
pub struct Cli {
    #[clap(long, value_parser, default_value_t = false, global = true)]
    pub verbose: bool,

    /// Write log output to this file instead of stderr
    #[clap(long, value_parser, global = true)]
    pub log: Option<PathBuf>,

    /// Read configuration from this file instead of the default locations
    #[clap(long, value_parser, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run one search and print the results
    Search {
        query: String,

        #[clap(default_value = ".")]
        path: PathBuf,

        #[clap(flatten)]
        options: SearchArgs,
    },
    /// Prompt for queries until `:quit`
    Interactive {
        #[clap(default_value = ".")]
        path: PathBuf,

        #[clap(flatten)]
        options: SearchArgs,
    },
    /// Write a file as an encrypted `.jenc` note
    Encrypt {
        file: PathBuf,

        /// Defaults to FILE with `.jenc` appended
        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,

        #[clap(long, value_parser, default_value = DEFAULT_PASSWORD_ENV)]
        password_env: String,
    },
    /// Print shell completions
    Completions {
        #[clap(value_enum)]
        shell: Shell,
    },
}

/// Flags overriding the configured search defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Treat the query as a regular expression
    #[clap(short, long, value_parser, default_value_t = false)]
    pub regex: bool,

    #[clap(short = 's', long, value_parser, default_value_t = false)]
    pub case_sensitive: bool,

    /// Also search inside text files
    #[clap(short = 'c', long, value_parser, default_value_t = false)]
    pub content: bool,

    /// Stop at the first matching line of each file
    #[clap(long, value_parser, default_value_t = false)]
    pub first_match: bool,

    /// Deepest directory level to descend into; the root is level 0
    #[clap(short = 'd', long, value_parser)]
    pub max_depth: Option<usize>,

    /// Skip directories by exact `"name"`, wildcard or regex (repeatable)
    #[clap(short = 'i', long = "ignore", value_parser)]
    pub ignore: Vec<String>,

    #[clap(long, value_parser, default_value_t = false)]
    pub no_preview: bool,

    /// Return nothing when the search is interrupted
    #[clap(long, value_parser, default_value_t = false)]
    pub discard_on_cancel: bool,

    #[clap(long, value_parser)]
    pub preview_length: Option<usize>,

    #[clap(long, value_parser, default_value = DEFAULT_PASSWORD_ENV)]
    pub password_env: String,

    #[clap(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl SearchArgs {
    /// The configured defaults with these flags applied on top.
    pub fn to_request(&self, config: &Config, root: &std::path::Path, query: &str) -> SearchRequest {
        let mut request = config.to_request(root, query);
        request.is_regex_query |= self.regex;
        request.is_case_sensitive_query |= self.case_sensitive;
        request.is_search_in_content |= self.content;
        request.is_only_first_content_match |= self.first_match;
        if let Some(depth) = self.max_depth {
            request.max_search_depth = depth;
        }
        request
            .ignored_directories
            .extend(self.ignore.iter().cloned());
        if self.no_preview {
            request.show_match_preview = false;
        }
        if self.discard_on_cancel {
            request.show_result_on_cancel = false;
        }
        if let Some(length) = self.preview_length {
            request.max_preview_length = length;
        }
        request.password = read_password(&self.password_env);
        request
    }
}

/// Password from the environment variable `var`, if it is set and not empty.
pub fn read_password(var: &str) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults() {
        let cli = Cli::parse_from(["fitgrep", "search", "todo"]);
        match cli.command {
            Commands::Search {
                query,
                path,
                options,
            } => {
                assert_eq!(query, "todo");
                assert_eq!(path, PathBuf::from("."));
                assert!(!options.regex && !options.content);
                assert_eq!(options.max_depth, None);
                assert_eq!(options.password_env, DEFAULT_PASSWORD_ENV);
                assert_eq!(options.format, OutputFormat::Text);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_search_flags() {
        let cli = Cli::parse_from([
            "fitgrep", "--verbose", "search", "-r", "-s", "-c", "--first-match", "-d", "3", "-i",
            "build", "-i", "\"out\"", "--format", "json", "^a.*", "notes",
        ]);
        assert!(cli.verbose);
        let Commands::Search { query, path, options } = cli.command else {
            panic!("expected search");
        };
        assert_eq!(query, "^a.*");
        assert_eq!(path, PathBuf::from("notes"));
        assert!(options.regex && options.case_sensitive && options.content && options.first_match);
        assert_eq!(options.max_depth, Some(3));
        assert_eq!(options.ignore, vec!["build", "\"out\""]);
        assert_eq!(options.format, OutputFormat::Json);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.search.max_depth = Some(5);
        config.search.ignored_directories = vec!["build".to_string()];
        let cli = Cli::parse_from([
            "fitgrep", "search", "-c", "-d", "1", "-i", "out", "--no-preview",
            "--discard-on-cancel", "--preview-length", "40", "--password-env",
            "FITGREP_TEST_UNSET_PASSWORD", "q",
        ]);
        let Commands::Search { options, .. } = cli.command else {
            panic!("expected search");
        };

        let request = options.to_request(&config, std::path::Path::new("."), "q");
        assert!(request.is_search_in_content);
        assert!(!request.is_regex_query);
        assert_eq!(request.max_search_depth, 1);
        assert_eq!(request.ignored_directories, vec!["build", "out"]);
        assert!(!request.show_match_preview);
        assert!(!request.show_result_on_cancel);
        assert_eq!(request.max_preview_length, 40);
        assert!(request.password.is_none());
    }

    #[test]
    fn test_encrypt_output() {
        let cli = Cli::parse_from(["fitgrep", "encrypt", "a.md", "-o", "b.md.jenc"]);
        let Commands::Encrypt { file, output, .. } = cli.command else {
            panic!("expected encrypt");
        };
        assert_eq!(file, PathBuf::from("a.md"));
        assert_eq!(output, Some(PathBuf::from("b.md.jenc")));
    }
}
