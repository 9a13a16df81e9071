//! Per-repository crawl loop
//!
//! Walks a repository's commit pages in order, evaluates every commit not
//! seen before, and checkpoints after each page:
//! 1. accepted pairs are appended to the temp artifact
//! 2. the seen set is saved
//! 3. the crawl progress is saved
//!
//! A failure part-way through a page still goes through those three steps for
//! the commits evaluated so far before the error is returned.

use crate::api::{CommitSummary, GitHubClient, SourceUnit};
use crate::config::CrawlerConfig;
use crate::crawler::extractor::{extract, ExtractRules};
use crate::state::{CrawlProgress, CrawlStatus, ProgressMap, SeenSet};
use crate::storage::{StateStore, TrainingPair};
use crate::{ApiError, HarvestError};

/// Result of a repository crawl that reached the last page
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    /// Pairs accepted during this run
    pub pairs: Vec<TrainingPair>,

    /// Pairs accepted over every run of the repository
    pub collected_count: u64,

    /// Commits listed over every run of the repository
    pub total_processed: u64,

    /// Non-empty commit pages
    pub total_pages: u32,

    /// Pairs discarded this run for exceeding `max_input_length`
    pub too_long: u32,

    /// Wall time since the crawl first started
    pub elapsed: Option<chrono::Duration>,
}

/// Advisory counters carried across pages of one crawl
#[derive(Debug, Default)]
struct Streaks {
    /// Consecutive commits that produced no pair
    skip: u32,

    /// Pairs dropped for length
    too_long: u32,
}

/// What one page produced before it finished or failed
#[derive(Debug, Default)]
struct PageBatch {
    pairs: Vec<TrainingPair>,
    processed: u64,
    error: Option<HarvestError>,
}

/// Crawls a single repository to the end of its history
pub struct RepoCrawler<'a> {
    client: &'a GitHubClient,
    store: &'a dyn StateStore,
    config: &'a CrawlerConfig,
    rules: ExtractRules,
}

impl<'a> RepoCrawler<'a> {
    pub fn new(
        client: &'a GitHubClient,
        store: &'a dyn StateStore,
        config: &'a CrawlerConfig,
        rules: ExtractRules,
    ) -> Self {
        Self {
            client,
            store,
            config,
            rules,
        }
    }

    /// Crawls `unit` from its checkpoint until an empty commit page
    ///
    /// `seen` and `progress` are the caller's copies of the state maps; they
    /// are updated in place and saved through the store after every page.
    /// On success the checkpoint is left in `Completed`; moving the
    /// repository to the completed registry is the caller's job.
    pub async fn crawl(
        &self,
        unit: &SourceUnit,
        seen: &mut SeenSet,
        progress: &mut ProgressMap,
    ) -> Result<CrawlOutcome, HarvestError> {
        let key = unit.key();
        tracing::info!("Starting crawl of {} ({} stars)", key, unit.stars);

        let mut page = self.enter(unit, progress)?;
        self.store.save_progress(progress)?;

        let mut pairs = Vec::new();
        let mut streaks = Streaks::default();

        loop {
            let commits = self
                .client
                .list_commits(unit, page, self.config.per_page_commits)
                .await?;

            if commits.is_empty() {
                tracing::info!("Page {} of {} is empty, history exhausted", page, key);
                break;
            }

            tracing::info!("Processing page {} of {} ({} commits)", page, key, commits.len());

            let batch = self.process_page(unit, &commits, seen, &mut streaks).await;

            // A failed page is replayed from its first commit on resume, and
            // the replay counts every commit of it.
            let (next_page, processed) = if batch.error.is_none() {
                (page + 1, batch.processed)
            } else {
                (page, 0)
            };

            self.store.append_temp_pairs(key, &batch.pairs)?;
            self.store.save_seen(seen)?;
            record_mut(progress, key)?.record_page(next_page, batch.pairs.len() as u64, processed);
            self.store.save_progress(progress)?;

            pairs.extend(batch.pairs);
            if let Some(e) = batch.error {
                return Err(e);
            }

            page = next_page;
            if page % 10 == 0 {
                tracing::info!(
                    "Progress on {}: {} pages done, {} pairs this run",
                    key,
                    page - 1,
                    pairs.len()
                );
            }
        }

        let record = record_mut(progress, key)?;
        record.mark_completed(page - 1)?;
        let outcome = CrawlOutcome {
            pairs,
            collected_count: record.collected_count,
            total_processed: record.total_processed,
            total_pages: page - 1,
            too_long: streaks.too_long,
            elapsed: record.elapsed(),
        };
        self.store.save_progress(progress)?;

        tracing::info!(
            "Finished {}: {} commits processed, {} pairs collected",
            key,
            outcome.total_processed,
            outcome.collected_count
        );

        Ok(outcome)
    }

    /// Loads or creates the checkpoint and returns the page to start from
    fn enter(&self, unit: &SourceUnit, progress: &mut ProgressMap) -> Result<u32, HarvestError> {
        let key = unit.key();
        match progress.get_mut(key) {
            Some(record) => {
                if record.status == CrawlStatus::Completed {
                    return Err(HarvestError::InvalidTransition {
                        from: CrawlStatus::Completed,
                        to: CrawlStatus::Processing,
                    });
                }
                if record.resume()? {
                    tracing::info!("Retrying {} after an earlier error", key);
                }
                tracing::info!(
                    "Resuming {} at page {} ({} pairs collected so far)",
                    key,
                    record.last_page,
                    record.collected_count
                );
                Ok(record.last_page)
            }
            None => {
                let record = CrawlProgress::new(unit);
                let page = record.last_page;
                progress.insert(key.to_string(), record);
                Ok(page)
            }
        }
    }

    /// Evaluates the commits of one page
    ///
    /// Stops at the first transport failure; everything evaluated before it
    /// is returned alongside the error.
    async fn process_page(
        &self,
        unit: &SourceUnit,
        commits: &[CommitSummary],
        seen: &mut SeenSet,
        streaks: &mut Streaks,
    ) -> PageBatch {
        let key = unit.key();
        let mut batch = PageBatch::default();

        for summary in commits {
            let sha = summary.sha.as_str();

            if seen.contains(key, sha) {
                tracing::debug!("Commit {} already seen, skipping", short(sha));
                batch.processed += 1;
                continue;
            }

            let detail = match self.client.get_commit_detail(unit, sha).await {
                Ok(detail) => detail,
                Err(e @ ApiError::Decode { .. }) => {
                    tracing::warn!("Commit {} has a malformed detail: {}", short(sha), e);
                    None
                }
                Err(e) => {
                    tracing::error!("Fetching commit {} of {} failed: {}", short(sha), key, e);
                    batch.error = Some(e.into());
                    break;
                }
            };

            seen.insert(key, sha);
            batch.processed += 1;

            match detail.and_then(|d| extract(&d, unit, &self.rules)) {
                Some(pair) if pair.input.chars().count() > self.config.max_input_length => {
                    streaks.too_long += 1;
                    tracing::debug!(
                        "Commit {} too long, skipped ({}/{})",
                        short(sha),
                        streaks.too_long,
                        self.config.max_too_long
                    );
                    if streaks.too_long % self.config.max_too_long.max(1) == 0 {
                        tracing::warn!(
                            "{} too-long commits in {} so far, continuing",
                            streaks.too_long,
                            key
                        );
                    }
                }
                Some(pair) => {
                    tracing::debug!("Commit {} accepted", short(sha));
                    batch.pairs.push(pair);
                    streaks.skip = 0;
                }
                None => {
                    streaks.skip += 1;
                    if streaks.skip >= self.config.max_skip_streak.max(1) {
                        tracing::warn!(
                            "{} consecutive commits without usable changes in {}, continuing",
                            streaks.skip,
                            key
                        );
                        streaks.skip = 0;
                    }
                }
            }
        }

        batch
    }
}

fn record_mut<'m>(
    progress: &'m mut ProgressMap,
    key: &str,
) -> Result<&'m mut CrawlProgress, HarvestError> {
    progress
        .get_mut(key)
        .ok_or_else(|| HarvestError::MissingProgress(key.to_string()))
}

fn short(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
