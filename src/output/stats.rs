//! Status report built from the state directory
//!
//! Reads the persisted state files and prints what has been harvested so
//! far and which crawls are still open.

use crate::state::{CrawlStatus, ProgressMap};
use crate::storage::StateStore;
use crate::HarvestError;

/// One completed repository as shown in the report
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedLine {
    pub full_name: String,
    pub total_commits: u64,
    pub completed_at: String,
}

/// One open checkpoint as shown in the report
#[derive(Debug, Clone, PartialEq)]
pub struct OpenLine {
    pub full_name: String,
    pub status: CrawlStatus,
    pub next_page: u32,
    pub collected_count: u64,
    pub error_message: Option<String>,
}

/// Snapshot of the harvester state
#[derive(Debug, Clone, Default)]
pub struct StatusReport {
    /// Completed repositories, most pairs first
    pub completed: Vec<CompletedLine>,

    /// Pairs recorded across the completed registry
    pub total_pairs: u64,

    /// Checkpoints not yet moved to the registry
    pub open: Vec<OpenLine>,

    /// Repositories with tracked commit hashes
    pub tracked_repos: usize,

    /// Tracked commit hashes over all repositories
    pub tracked_commits: usize,
}

impl StatusReport {
    /// Number of open checkpoints in `Error`
    pub fn error_count(&self) -> usize {
        self.open
            .iter()
            .filter(|line| line.status == CrawlStatus::Error)
            .count()
    }
}

/// Loads a status report from the store
///
/// # Arguments
///
/// * `store` - The state backend to read
///
/// # Returns
///
/// * `Ok(StatusReport)` - Successfully loaded report
/// * `Err(HarvestError)` - A state file could not be read
pub fn load_status(store: &dyn StateStore) -> Result<StatusReport, HarvestError> {
    let completed = store.load_completed()?;
    let progress = store.load_progress()?;
    let seen = store.load_seen()?;

    let mut completed_lines: Vec<_> = completed
        .iter()
        .map(|(name, entry)| CompletedLine {
            full_name: name.clone(),
            total_commits: entry.total_commits,
            completed_at: entry.completed_at.clone(),
        })
        .collect();
    completed_lines.sort_by(|a, b| {
        b.total_commits
            .cmp(&a.total_commits)
            .then_with(|| a.full_name.cmp(&b.full_name))
    });

    Ok(StatusReport {
        total_pairs: completed_lines.iter().map(|line| line.total_commits).sum(),
        completed: completed_lines,
        open: open_lines(&progress),
        tracked_repos: seen.repo_count(),
        tracked_commits: seen.total(),
    })
}

fn open_lines(progress: &ProgressMap) -> Vec<OpenLine> {
    progress
        .values()
        .map(|record| OpenLine {
            full_name: record.full_name.clone(),
            status: record.status,
            next_page: record.last_page,
            collected_count: record.collected_count,
            error_message: record.error_message.clone(),
        })
        .collect()
}

/// Prints the report to stdout
///
/// # Arguments
///
/// * `report` - The report to display
/// * `max_listed` - How many completed repositories to list by name
pub fn print_status_report(report: &StatusReport, max_listed: usize) {
    println!("=== Harvest Status ===\n");

    println!("Overview:");
    println!("  Completed repositories: {}", report.completed.len());
    println!("  Training pairs recorded: {}", report.total_pairs);
    println!(
        "  Tracked commits: {} across {} repositories",
        report.tracked_commits, report.tracked_repos
    );
    println!();

    if !report.completed.is_empty() {
        println!("Completed:");
        for line in report.completed.iter().take(max_listed) {
            println!("  {}: {} pairs", line.full_name, line.total_commits);
        }
        if report.completed.len() > max_listed {
            println!("  ... and {} more", report.completed.len() - max_listed);
        }
        println!();
    }

    if !report.open.is_empty() {
        println!("Open Crawls ({}):", report.open.len());
        for line in &report.open {
            println!(
                "  {} [{}] next page {}, {} pairs",
                line.full_name, line.status, line.next_page, line.collected_count
            );
            if let Some(message) = &line.error_message {
                println!("    error: {}", message);
            }
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SourceUnit;
    use crate::state::{CompletedEntry, CompletedRegistry, CrawlProgress, SeenSet};
    use crate::storage::JsonStore;
    use tempfile::TempDir;

    fn entry(total_commits: u64) -> CompletedEntry {
        CompletedEntry {
            completed_at: "2024-01-01T00:00:00Z".to_string(),
            total_commits,
            stars: None,
            output_file: None,
            note: None,
        }
    }

    #[test]
    fn test_load_status() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path()).unwrap();

        let mut completed = CompletedRegistry::new();
        completed.insert("a/small", entry(3));
        completed.insert("b/large", entry(40));
        store.save_completed(&completed).unwrap();

        let unit = SourceUnit {
            owner: "c".to_string(),
            name: "open".to_string(),
            full_name: "c/open".to_string(),
            stars: 1,
            forks: 0,
            language: None,
            created_at: None,
            updated_at: None,
        };
        let mut record = CrawlProgress::new(&unit);
        record.record_page(4, 12, 300);
        record.mark_error("HTTP 502").unwrap();
        let mut progress = ProgressMap::new();
        progress.insert("c/open".to_string(), record);
        store.save_progress(&progress).unwrap();

        let mut seen = SeenSet::new();
        seen.insert("c/open", "s1");
        seen.insert("c/open", "s2");
        seen.insert("b/large", "s3");
        store.save_seen(&seen).unwrap();

        let report = load_status(&store).unwrap();
        assert_eq!(report.total_pairs, 43);
        assert_eq!(report.completed[0].full_name, "b/large");
        assert_eq!(report.open.len(), 1);
        assert_eq!(report.open[0].next_page, 4);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.tracked_repos, 2);
        assert_eq!(report.tracked_commits, 3);
    }

    #[test]
    fn test_empty_state_directory() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path()).unwrap();

        let report = load_status(&store).unwrap();
        assert!(report.completed.is_empty());
        assert!(report.open.is_empty());
        assert_eq!(report.total_pairs, 0);
    }
}
