//! Bot entry point.
//!
//! # Responsibility
//! - Load config, start logging, open the exam database.
//! - Serve commands read from stdin and print replies to stdout.

use clap::Parser;
use exambot_core::config::DEFAULT_CONFIG_FILE;
use exambot_core::db::open_db;
use exambot_core::{
    core_version, init_logging, serve, CommandRouter, Config, ExamStore, LineTransport,
    SqliteExamRepository, SystemClock, ZoneResolver,
};
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "exambot", version, about = "Exam countdown bot over a line-based chat channel")]
struct Cli {
    /// YAML config file.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
    /// Also write log lines to stderr.
    #[arg(long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let log_dir = absolute_dir(&config.log_dir);
    if let Err(err) = init_logging(
        config.effective_log_level(),
        &log_dir.to_string_lossy(),
        cli.verbose,
    ) {
        eprintln!("Failed to initialize logger: {err}");
        return ExitCode::FAILURE;
    }
    info!(
        "event=bot_start module=cli status=start version={} env={} config={}",
        core_version(),
        config.env,
        cli.config.display()
    );

    let conn = match open_db(&config.storage_path) {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=bot_start module=cli status=error storage_path={} error={}",
                config.storage_path.display(),
                err
            );
            eprintln!("Failed to open database: {err}");
            return ExitCode::FAILURE;
        }
    };
    let repo = match SqliteExamRepository::try_new(&conn) {
        Ok(repo) => repo,
        Err(err) => {
            error!("event=bot_start module=cli status=error error={err}");
            eprintln!("Failed to prepare exam repository: {err}");
            return ExitCode::FAILURE;
        }
    };

    let store = ExamStore::new(repo, SystemClock, ZoneResolver::new(config.timezone.as_str()));
    let router = CommandRouter::new(store);
    let stdin = std::io::stdin();
    let mut transport = LineTransport::new(stdin.lock(), std::io::stdout(), "console", "stdin");

    match serve(&mut transport, &router) {
        Ok(stats) => {
            info!(
                "event=bot_stop module=cli status=ok received={} replied={}",
                stats.received, stats.replied
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=bot_stop module=cli status=error error={err}");
            ExitCode::FAILURE
        }
    }
}

fn absolute_dir(dir: &str) -> PathBuf {
    let path = PathBuf::from(dir.trim());
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(&path))
        .unwrap_or(path)
}
