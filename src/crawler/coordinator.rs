//! Run coordination
//!
//! This module drives one harvesting run end to end, including:
//! - Discovering candidate repositories
//! - Recovering crawls that finished without reaching the registry
//! - Scheduling and crawling repositories one at a time
//! - Moving finished crawls to the completed registry
//!
//! It also hosts the administrative operations on the state directory.

use crate::api::{GitHubClient, SourceUnit};
use crate::config::{validate, Config};
use crate::crawler::extractor::ExtractRules;
use crate::crawler::repo_crawler::{CrawlOutcome, RepoCrawler};
use crate::crawler::scheduler::{dedup_units, plan_run};
use crate::output::{load_status, RunSummary, StatusReport, UnitOutcome, UnitResult};
use crate::state::{
    now_timestamp, CompletedEntry, CompletedRegistry, CrawlStatus, ProgressMap, SeenSet,
};
use crate::storage::{open_storage, JsonStore, StateStore, TrainingPair};
use crate::HarvestError;
use std::path::Path;

/// Registry note for repositories that produced no pairs
const NO_PAIRS_NOTE: &str = "no usable commits";

/// Owns the client and the state directory for one run
pub struct RunController {
    config: Config,
    client: GitHubClient,
    store: JsonStore,
}

/// State maps loaded at the start of a run
///
/// The controller holds the only copy; the crawler borrows it mutably.
struct RunState {
    seen: SeenSet,
    completed: CompletedRegistry,
    progress: ProgressMap,
}

impl RunController {
    /// Creates a controller
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `token` - GitHub API token
    ///
    /// # Returns
    ///
    /// * `Ok(RunController)` - Client built and state directory ready
    /// * `Err(HarvestError)` - Invalid configuration or failed to initialize
    pub fn new(config: Config, token: impl Into<String>) -> Result<Self, HarvestError> {
        validate(&config)?;
        let store = open_storage(Path::new(&config.output.state_dir))?;
        let client = GitHubClient::new(&config, token)?;

        Ok(Self {
            config,
            client,
            store,
        })
    }

    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Reads the current state directory into a report
    pub fn status_report(&self) -> Result<StatusReport, HarvestError> {
        load_status(&self.store)
    }

    /// Runs discovery, scheduling and crawling
    ///
    /// A repository that fails is recorded as `error` and the run moves on;
    /// only state-file failures abort the run.
    pub async fn run(&self) -> Result<RunSummary, HarvestError> {
        let discovered = dedup_units(self.discover().await);
        tracing::info!("Discovered {} candidate repositories", discovered.len());

        let mut state = RunState {
            seen: self.store.load_seen()?,
            completed: self.store.load_completed()?,
            progress: self.store.load_progress()?,
        };

        let plan = plan_run(
            &state.progress,
            &state.completed,
            &discovered,
            self.config.crawler.max_repos_per_run,
        );

        let mut summary = RunSummary {
            discovered: discovered.len(),
            skipped_completed: plan.skipped_completed.len(),
            scheduled: plan.len(),
            deferred: plan.deferred,
            ..Default::default()
        };

        for key in &plan.orphans {
            tracing::info!("Recovering {} from its finished checkpoint", key);
            self.recover_orphan(key, &mut state)?;
            summary.recovered.push(key.clone());
        }

        if plan.is_empty() {
            tracing::info!("No new repositories to process");
            summary.completed_total = state.completed.len();
            return Ok(summary);
        }

        tracing::info!(
            "Scheduled {} repositories ({} resumed, {} new, {} deferred)",
            plan.len(),
            plan.resumed.len(),
            plan.fresh.len(),
            plan.deferred
        );

        let crawler = RepoCrawler::new(
            &self.client,
            &self.store,
            &self.config.crawler,
            ExtractRules::from_config(&self.config.extract),
        );

        for (index, unit) in plan.units().enumerate() {
            tracing::info!("[{}/{}] {}", index + 1, plan.len(), unit.full_name);

            let result = crawler
                .crawl(unit, &mut state.seen, &mut state.progress)
                .await;

            let outcome = match result {
                Ok(outcome) => self.finish_unit(unit, outcome, &mut state)?,
                Err(e) => {
                    tracing::error!("Crawl of {} failed: {}", unit.full_name, e);
                    self.record_failure(unit.key(), &e, &mut state.progress)?;
                    UnitOutcome::Failed {
                        message: e.to_string(),
                    }
                }
            };

            summary.units.push(UnitResult {
                full_name: unit.full_name.clone(),
                outcome,
            });
        }

        summary.completed_total = state.completed.len();
        Ok(summary)
    }

    /// Collects candidate repositories
    ///
    /// Explicit `target-repos` win over search. Lookup and search failures
    /// are logged and skipped.
    pub async fn discover(&self) -> Vec<SourceUnit> {
        let search = &self.config.search;

        if !search.target_repos.is_empty() {
            let mut units = Vec::new();
            for full_name in &search.target_repos {
                match self.client.get_repository(full_name).await {
                    Ok(unit) => units.push(unit),
                    Err(e) => tracing::warn!("Skipping target {}: {}", full_name, e),
                }
            }
            return units;
        }

        let mut units = Vec::new();
        for sort in &search.sorts {
            for page in 1..=search.pages {
                let result = self
                    .client
                    .search_repositories(&search.query, sort, &search.order, page, search.per_page)
                    .await;

                match result {
                    Ok(found) if found.is_empty() => break,
                    Ok(found) => {
                        tracing::debug!("Search by {} page {}: {} results", sort, page, found.len());
                        units.extend(found);
                    }
                    Err(e) => {
                        tracing::warn!("Search by {} failed, skipping this ordering: {}", sort, e);
                        break;
                    }
                }
            }
        }
        units
    }

    fn finish_unit(
        &self,
        unit: &SourceUnit,
        outcome: CrawlOutcome,
        state: &mut RunState,
    ) -> Result<UnitOutcome, HarvestError> {
        let (pairs, output_file) =
            self.finalize(unit.key(), Some(unit.stars), &outcome.pairs, state)?;

        Ok(UnitOutcome::Completed {
            pairs,
            output_file,
            elapsed_secs: outcome.elapsed.map(|d| d.num_seconds()),
        })
    }

    /// Finalizes a checkpoint left `completed` by an interrupted run
    fn recover_orphan(&self, key: &str, state: &mut RunState) -> Result<(), HarvestError> {
        let stars = state.progress.get(key).map(|record| record.stars);
        self.finalize(key, stars, &[], state)?;
        Ok(())
    }

    /// Writes the final artifact and moves the repository to the registry
    ///
    /// Saves all three state maps. Returns the pair count and the output
    /// file name, if one was written.
    fn finalize(
        &self,
        key: &str,
        stars: Option<u64>,
        pairs: &[TrainingPair],
        state: &mut RunState,
    ) -> Result<(u64, Option<String>), HarvestError> {
        let output = self.store.commit_final(key, pairs)?;

        let (total_commits, output_file) = match output {
            Some(output) => (output.pair_count as u64, Some(output.filename)),
            None => (0, None),
        };

        match &output_file {
            Some(file) => tracing::info!("{}: {} pairs written to {}", key, total_commits, file),
            None => tracing::info!("{}: no usable commits, nothing written", key),
        }

        state.completed.insert(
            key,
            CompletedEntry {
                completed_at: now_timestamp(),
                total_commits,
                stars,
                output_file: output_file.clone(),
                note: output_file.is_none().then(|| NO_PAIRS_NOTE.to_string()),
            },
        );
        state.progress.remove(key);

        self.store.save_completed(&state.completed)?;
        self.store.save_progress(&state.progress)?;
        self.store.save_seen(&state.seen)?;

        Ok((total_commits, output_file))
    }

    fn record_failure(
        &self,
        key: &str,
        error: &HarvestError,
        progress: &mut ProgressMap,
    ) -> Result<(), HarvestError> {
        if let Some(record) = progress.get_mut(key) {
            if record.status == CrawlStatus::Processing {
                record.mark_error(&error.to_string())?;
            }
        }
        self.store.save_progress(progress)?;
        Ok(())
    }
}

/// Forgets everything recorded about a repository
///
/// Removes its checkpoint, seen hashes, registry entry and temporary
/// artifact, so the next run crawls it from scratch. Final artifacts in
/// `training-data/` are kept. Returns false if nothing was recorded.
pub fn reset_repo(store: &dyn StateStore, key: &str) -> Result<bool, HarvestError> {
    let mut progress = store.load_progress()?;
    let mut seen = store.load_seen()?;
    let mut completed = store.load_completed()?;

    let had_progress = progress.remove(key).is_some();
    let had_seen = seen.remove_repo(key);
    let had_entry = completed.remove(key).is_some();
    let had_temp = store.remove_temp(key)?;

    if had_progress {
        store.save_progress(&progress)?;
    }
    if had_seen {
        store.save_seen(&seen)?;
    }
    if had_entry {
        store.save_completed(&completed)?;
    }

    let removed = had_progress || had_seen || had_entry || had_temp;
    if removed {
        tracing::info!("Reset {}", key);
    } else {
        tracing::info!("Nothing recorded for {}", key);
    }
    Ok(removed)
}

/// Drops failed checkpoints that are not in the completed registry
///
/// Their seen hashes and temporary artifacts are kept, so a later crawl of
/// the same repository skips the commits already evaluated. Returns the
/// keys that were removed.
pub fn clear_errors(store: &dyn StateStore) -> Result<Vec<String>, HarvestError> {
    let mut progress = store.load_progress()?;
    let completed = store.load_completed()?;

    let cleared: Vec<String> = progress
        .iter()
        .filter(|(key, record)| {
            record.status == CrawlStatus::Error && !completed.contains(key)
        })
        .map(|(key, _)| key.clone())
        .collect();

    if cleared.is_empty() {
        return Ok(cleared);
    }

    for key in &cleared {
        progress.remove(key);
        tracing::info!("Cleared failed checkpoint for {}", key);
    }
    store.save_progress(&progress)?;

    Ok(cleared)
}
