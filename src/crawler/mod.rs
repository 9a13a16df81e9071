//! Crawler module for commit harvesting
//!
//! This module contains the core harvesting logic, including:
//! - Turning commit details into training pairs
//! - Crawling one repository's history with checkpoints
//! - Choosing which repositories a run visits
//! - Overall run coordination and state administration

mod coordinator;
mod extractor;
mod repo_crawler;
mod scheduler;

pub use coordinator::{clear_errors, reset_repo, RunController};
pub use extractor::{contains_cjk, extract, format_patch, is_mostly_comments, ExtractRules};
pub use repo_crawler::{CrawlOutcome, RepoCrawler};
pub use scheduler::{dedup_units, plan_run, RunPlan};

pub use crate::storage::TrainingPair;

use crate::config::Config;
use crate::output::RunSummary;
use crate::HarvestError;

/// Runs a complete harvesting pass
///
/// This is the main entry point for a run. It will:
/// 1. Open the state directory and build the API client
/// 2. Discover candidate repositories
/// 3. Recover finished checkpoints missing from the registry
/// 4. Crawl the scheduled repositories one at a time
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `token` - GitHub API token
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run finished; individual repositories may have failed
/// * `Err(HarvestError)` - Setup or a state file failed
pub async fn run_harvest(config: Config, token: &str) -> Result<RunSummary, HarvestError> {
    RunController::new(config, token)?.run().await
}
