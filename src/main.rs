use clap::{CommandFactory, Parser};
use colored::*;
use env_logger::{Builder, Env, Target};
use fitgrep::cli::{read_password, Cli, Commands, OutputFormat, SearchArgs};
use fitgrep::config::Config;
use fitgrep::error::{FitgrepError, Result as FitgrepResult};
use fitgrep::interactive::InteractiveSearch;
use fitgrep::output_formats::OutputFormatter;
use fitgrep::progress::ProgressReporter;
use fitgrep::search::crypto::{self, JencVersion, ENCRYPTED_FILE_SUFFIX};
use fitgrep::search::{CancelSlot, SearchManager, SearchStatus};
use log::{error, info};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

const EXIT_MATCHES: u8 = 0;
const EXIT_NO_MATCHES: u8 = 1;
const EXIT_FAILURE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = setup_logging(&cli) {
        eprintln!("{}", format!("Failed to set up logging: {e}").red());
        return ExitCode::from(EXIT_FAILURE);
    }

    let start_time = Instant::now();
    info!("Application started with command: {:?}", cli.command);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            eprintln!("{}", format!("Error: {e}").red());
            EXIT_FAILURE
        }
    };

    info!(
        "Application finished. Total elapsed time: {:.2?}",
        start_time.elapsed()
    );
    ExitCode::from(code)
}

async fn run(cli: Cli) -> FitgrepResult<u8> {
    match cli.command {
        Commands::Search {
            query,
            path,
            options,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let active = install_cancel_handler()?;
            run_search(&config, &options, &path, &query, &active).await
        }
        Commands::Interactive { path, options } => {
            let config = load_config(cli.config.as_deref())?;
            let active = install_cancel_handler()?;
            let session = InteractiveSearch::new(path, config, options, active);
            let stdin = std::io::stdin();
            session.run(stdin.lock(), std::io::stdout()).await?;
            Ok(EXIT_MATCHES)
        }
        Commands::Encrypt {
            file,
            output,
            password_env,
        } => {
            encrypt_file(&file, output, &password_env)?;
            Ok(EXIT_MATCHES)
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "fitgrep", &mut std::io::stdout());
            Ok(EXIT_MATCHES)
        }
    }
}

async fn run_search(
    config: &Config,
    options: &SearchArgs,
    path: &Path,
    query: &str,
    active: &CancelSlot,
) -> FitgrepResult<u8> {
    let request = options.to_request(config, path, query);
    let manager = SearchManager::new(Default::default());
    let handle = manager.search(request)?;
    active.set(handle.canceller());

    let reporter = if config.display.show_progress && options.format == OutputFormat::Text {
        ProgressReporter::new(query)
    } else {
        ProgressReporter::hidden(query)
    };
    let outcome = handle
        .wait_with_progress(|update| reporter.update(update))
        .await;
    reporter.finish();
    active.clear();
    let outcome = outcome?;

    let rendered = OutputFormatter::new(options.format)
        .with_summary(config.display.show_summary)
        .format_outcome(&outcome, query, path)?;
    println!("{rendered}");

    if outcome.status == SearchStatus::HardCancelled {
        info!("Search was cancelled, results discarded");
    }
    Ok(if outcome.files.is_empty() {
        EXIT_NO_MATCHES
    } else {
        EXIT_MATCHES
    })
}

fn load_config(path: Option<&Path>) -> FitgrepResult<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

/// Ctrl-C cancels whichever search is running; with none running it exits.
fn install_cancel_handler() -> FitgrepResult<CancelSlot> {
    let active = CancelSlot::default();
    let slot = active.clone();
    ctrlc::set_handler(move || {
        if !slot.cancel() {
            std::process::exit(130);
        }
    })
    .map_err(|e| FitgrepError::Other(format!("Failed to install Ctrl-C handler: {e}")))?;
    Ok(active)
}

fn encrypt_file(file: &Path, output: Option<PathBuf>, password_env: &str) -> FitgrepResult<()> {
    let password = read_password(password_env).ok_or_else(|| {
        FitgrepError::Config(format!(
            "Set the {password_env} environment variable to the encryption password"
        ))
    })?;
    let output = output.unwrap_or_else(|| {
        let mut name = file.as_os_str().to_os_string();
        name.push(ENCRYPTED_FILE_SUFFIX);
        PathBuf::from(name)
    });

    let plaintext = zeroize::Zeroizing::new(fs::read(file)?);
    let container = crypto::encrypt(&plaintext, &password, JencVersion::V001)?;
    fs::write(&output, container)?;

    info!("Encrypted {} to {}", file.display(), output.display());
    println!("{} {}", "Wrote".green(), output.display());
    Ok(())
}

fn setup_logging(cli: &Cli) -> FitgrepResult<()> {
    let default_filter = if cli.verbose { "info" } else { "warn" };
    let mut builder = Builder::from_env(Env::default().default_filter_or(default_filter));

    builder.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "{} [{}] [{}] {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    if let Some(log_path) = &cli.log {
        if let Some(parent_dir) = log_path.parent() {
            if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
                fs::create_dir_all(parent_dir)?;
            }
        }
        let log_file = fs::File::create(log_path)?;
        builder.target(Target::Pipe(Box::new(log_file)));
    } else {
        builder.target(Target::Stderr);
    }

    builder
        .try_init()
        .map_err(|e| FitgrepError::Other(e.to_string()))?;
    Ok(())
}
