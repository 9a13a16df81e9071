//! Commit-Harvester main entry point
//!
//! This is the command-line interface for the Commit-Harvester crawler.

use anyhow::Context;
use clap::Parser;
use commit_harvester::config::{
    load_config_with_hash, load_token, validate, validate_repo_name, Config,
};
use commit_harvester::crawler::{clear_errors, plan_run, reset_repo, RunController};
use commit_harvester::output::{load_status, print_run_summary, print_status_report};
use commit_harvester::storage::{open_storage, StateStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Completed repositories listed by name in status reports
const STATUS_LISTED: usize = 5;

/// Commit-Harvester: a resumable GitHub commit crawler
///
/// Commit-Harvester walks the full commit history of GitHub repositories
/// and collects (diff, commit message) pairs for training. Every page is
/// checkpointed, so an interrupted run picks up where it stopped.
#[derive(Parser, Debug)]
#[command(name = "commit-harvester")]
#[command(version)]
#[command(about = "A resumable GitHub commit crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults if omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Load the API token from this env file instead of ./.env
    #[arg(long, value_name = "FILE")]
    env_file: Option<PathBuf>,

    /// Directory holding the state files (overrides the config)
    #[arg(long, value_name = "DIR")]
    state_dir: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the harvest status and exit
    #[arg(long, conflicts_with_all = ["reset", "clear_errors", "dry_run"])]
    status: bool,

    /// Forget everything recorded about OWNER/NAME and exit
    #[arg(long, value_name = "OWNER/NAME", conflicts_with_all = ["status", "clear_errors", "dry_run"])]
    reset: Option<String>,

    /// Drop failed checkpoints and exit
    #[arg(long, conflicts_with_all = ["status", "reset", "dry_run"])]
    clear_errors: bool,

    /// Validate config and show what a run would resume without crawling
    #[arg(long, conflicts_with_all = ["status", "reset", "clear_errors"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = load_configuration(cli.config.as_deref())?;
    if let Some(dir) = &cli.state_dir {
        config.output.state_dir = dir.display().to_string();
    }

    if cli.status {
        handle_status(&config)
    } else if let Some(repo) = &cli.reset {
        handle_reset(&config, repo)
    } else if cli.clear_errors {
        handle_clear_errors(&config)
    } else if cli.dry_run {
        handle_dry_run(&config)
    } else {
        handle_harvest(config, cli.env_file.as_deref()).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("commit_harvester=info,warn"),
            1 => EnvFilter::new("commit_harvester=debug,info"),
            2 => EnvFilter::new("commit_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn load_configuration(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("invalid configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

fn open_state(config: &Config) -> anyhow::Result<impl StateStore> {
    let dir = Path::new(&config.output.state_dir);
    open_storage(dir).with_context(|| format!("cannot open state directory {}", dir.display()))
}

/// Handles the --status mode
fn handle_status(config: &Config) -> anyhow::Result<()> {
    println!("State directory: {}\n", config.output.state_dir);
    let store = open_state(config)?;
    print_status_report(&load_status(&store)?, STATUS_LISTED);
    Ok(())
}

/// Handles the --reset mode
fn handle_reset(config: &Config, repo: &str) -> anyhow::Result<()> {
    validate_repo_name(repo)?;
    let store = open_state(config)?;

    if reset_repo(&store, repo)? {
        println!("✓ {} reset; the next run crawls it from the start", repo);
    } else {
        println!("Nothing recorded for {}", repo);
    }
    Ok(())
}

/// Handles the --clear-errors mode
fn handle_clear_errors(config: &Config) -> anyhow::Result<()> {
    let store = open_state(config)?;
    let cleared = clear_errors(&store)?;

    if cleared.is_empty() {
        println!("No failed checkpoints");
    } else {
        println!("Cleared {} failed checkpoints:", cleared.len());
        for key in &cleared {
            println!("  - {}", key);
        }
    }
    Ok(())
}

/// Handles the --dry-run mode: validates config and shows open checkpoints
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Commit-Harvester Dry Run ===\n");

    println!("API:");
    println!("  Base URL: {}", config.api.base_url);
    println!("  User agent: {}", config.api.user_agent);
    println!("  Token variable: {}", config.api.token_env);

    println!("\nCrawler:");
    println!("  Commits per page: {}", config.crawler.per_page_commits);
    println!("  Repositories per run: {}", config.crawler.max_repos_per_run);
    println!("  Max input length: {}", config.crawler.max_input_length);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);

    println!("\nDiscovery:");
    if config.search.target_repos.is_empty() {
        println!("  Query: {}", config.search.query);
        println!("  Orderings: {}", config.search.sorts.join(", "));
        println!(
            "  Pages: {} x {} repositories",
            config.search.pages, config.search.per_page
        );
    } else {
        println!("  Target repositories ({}):", config.search.target_repos.len());
        for repo in &config.search.target_repos {
            println!("    * {}", repo);
        }
    }

    println!("\nExtraction:");
    println!("  Source extension: {}", config.extract.source_extension);
    println!("  Comment ratio: {}", config.extract.comment_ratio);

    let store = open_state(config)?;
    let plan = plan_run(
        &store.load_progress()?,
        &store.load_completed()?,
        &[],
        config.crawler.max_repos_per_run,
    );

    println!("\nState directory: {}", config.output.state_dir);
    if plan.is_empty() {
        println!("  No open checkpoints");
    } else {
        println!("  Would resume ({}):", plan.resumed.len());
        for unit in &plan.resumed {
            println!("    * {}", unit.full_name);
        }
    }
    if !plan.orphans.is_empty() {
        println!("  Would recover ({}):", plan.orphans.len());
        for key in &plan.orphans {
            println!("    * {}", key);
        }
    }

    println!("\n✓ Configuration is valid");
    Ok(())
}

/// Handles the main harvesting run
async fn handle_harvest(config: Config, env_file: Option<&Path>) -> anyhow::Result<()> {
    let token = load_token(&config.api.token_env, env_file)?;
    let controller = RunController::new(config, token)?;

    print_status_report(&controller.status_report()?, STATUS_LISTED);

    let summary = controller
        .run()
        .await
        .context("run aborted on a state file failure")?;
    print_run_summary(&summary);

    print_status_report(&controller.status_report()?, STATUS_LISTED);

    if summary.failed() > 0 {
        tracing::warn!(
            "{} repositories failed and will be retried on the next run",
            summary.failed()
        );
    }
    Ok(())
}
