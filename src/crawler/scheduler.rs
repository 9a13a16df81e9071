//! Run scheduling
//!
//! Decides which repositories a run visits and in what order:
//! - interrupted or failed crawls (from the progress map) come first
//! - newly discovered repositories follow
//! - anything already in the completed registry is left out
//!
//! The combined list is capped at `max_repos_per_run`.

use crate::api::SourceUnit;
use crate::state::{CompletedRegistry, CrawlStatus, ProgressMap};
use std::collections::HashSet;

/// Repositories selected for one run
#[derive(Debug, Clone, Default)]
pub struct RunPlan {
    /// Checkpointed crawls to continue, in visiting order
    pub resumed: Vec<SourceUnit>,

    /// Repositories crawled for the first time, in visiting order
    pub fresh: Vec<SourceUnit>,

    /// Discovered repositories left out because they are already completed
    pub skipped_completed: Vec<String>,

    /// Checkpoints that finished crawling but never reached the registry
    pub orphans: Vec<String>,

    /// Eligible repositories pushed to a later run by the cap
    pub deferred: usize,
}

impl RunPlan {
    /// All scheduled repositories, resumed first
    pub fn units(&self) -> impl Iterator<Item = &SourceUnit> {
        self.resumed.iter().chain(self.fresh.iter())
    }

    /// Number of scheduled repositories
    pub fn len(&self) -> usize {
        self.resumed.len() + self.fresh.len()
    }

    /// Returns true if there is nothing to crawl
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes repeated repositories, keeping the first occurrence
pub fn dedup_units(units: Vec<SourceUnit>) -> Vec<SourceUnit> {
    let mut keys = HashSet::new();
    units
        .into_iter()
        .filter(|unit| keys.insert(unit.full_name.clone()))
        .collect()
}

/// Builds the plan for one run
///
/// # Arguments
///
/// * `progress` - Persisted crawl checkpoints
/// * `completed` - The completed registry
/// * `discovered` - Repositories found by discovery, deduplicated
/// * `cap` - Maximum number of repositories to crawl
pub fn plan_run(
    progress: &ProgressMap,
    completed: &CompletedRegistry,
    discovered: &[SourceUnit],
    cap: usize,
) -> RunPlan {
    let mut plan = RunPlan::default();

    let mut pending: Vec<_> = progress
        .iter()
        .filter(|(key, _)| !completed.contains(key))
        .filter_map(|(key, record)| {
            if record.status.is_resumable() {
                Some(record)
            } else {
                plan.orphans.push(key.clone());
                None
            }
        })
        .collect();

    // Interrupted crawls before failed ones; the map already orders by key
    pending.sort_by_key(|record| record.status != CrawlStatus::Processing);

    let mut queued: HashSet<&str> = HashSet::new();
    let mut eligible = Vec::new();
    for record in pending {
        queued.insert(record.full_name.as_str());
        let unit = discovered
            .iter()
            .find(|unit| unit.full_name == record.full_name)
            .cloned()
            .unwrap_or_else(|| record.to_source_unit());
        eligible.push((true, unit));
    }

    for unit in discovered {
        if completed.contains(&unit.full_name) {
            plan.skipped_completed.push(unit.full_name.clone());
            continue;
        }
        if progress.contains_key(&unit.full_name) || !queued.insert(unit.full_name.as_str()) {
            continue;
        }
        eligible.push((false, unit.clone()));
    }

    plan.deferred = eligible.len().saturating_sub(cap);
    for (resumed, unit) in eligible.into_iter().take(cap) {
        if resumed {
            plan.resumed.push(unit);
        } else {
            plan.fresh.push(unit);
        }
    }

    plan
}
