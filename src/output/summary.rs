//! End-of-run summary

/// How one scheduled repository ended
#[derive(Debug, Clone, PartialEq)]
pub enum UnitOutcome {
    /// Crawled to the end and moved to the completed registry
    Completed {
        pairs: u64,
        output_file: Option<String>,
        elapsed_secs: Option<i64>,
    },

    /// Stopped with an error; the checkpoint is kept for the next run
    Failed { message: String },
}

/// Result for one repository of the run
#[derive(Debug, Clone, PartialEq)]
pub struct UnitResult {
    pub full_name: String,
    pub outcome: UnitOutcome,
}

/// What one run did
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Repositories returned by discovery
    pub discovered: usize,

    /// Discovered repositories skipped as already completed
    pub skipped_completed: usize,

    /// Repositories scheduled for this run
    pub scheduled: usize,

    /// Eligible repositories left for a later run
    pub deferred: usize,

    /// Finished checkpoints moved to the registry without crawling
    pub recovered: Vec<String>,

    /// Per-repository results in visiting order
    pub units: Vec<UnitResult>,

    /// Size of the completed registry after the run
    pub completed_total: usize,
}

impl RunSummary {
    /// Returns true if the run had nothing to crawl or recover
    pub fn is_idle(&self) -> bool {
        self.scheduled == 0 && self.recovered.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.units
            .iter()
            .filter(|u| matches!(u.outcome, UnitOutcome::Completed { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.units.len() - self.succeeded()
    }

    /// Pairs written by this run
    pub fn pairs_written(&self) -> u64 {
        self.units
            .iter()
            .map(|u| match u.outcome {
                UnitOutcome::Completed { pairs, .. } => pairs,
                UnitOutcome::Failed { .. } => 0,
            })
            .sum()
    }
}

/// Prints the run summary to stdout
pub fn print_run_summary(summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    if summary.is_idle() {
        println!("No new repositories to process");
        println!(
            "  Discovered {} repositories, {} already completed",
            summary.discovered, summary.skipped_completed
        );
        println!();
        print_suggestions(summary.completed_total);
        return;
    }

    println!("Overview:");
    println!("  Discovered: {}", summary.discovered);
    println!("  Already completed: {}", summary.skipped_completed);
    println!("  Scheduled: {}", summary.scheduled);
    println!(
        "  Succeeded: {}, failed: {}",
        summary.succeeded(),
        summary.failed()
    );
    println!("  Pairs written: {}", summary.pairs_written());
    println!("  Completed repositories in total: {}", summary.completed_total);
    println!();

    if !summary.recovered.is_empty() {
        println!("Recovered ({}):", summary.recovered.len());
        for name in &summary.recovered {
            println!("  - {}", name);
        }
        println!();
    }

    if !summary.units.is_empty() {
        println!("Repositories:");
        for unit in &summary.units {
            match &unit.outcome {
                UnitOutcome::Completed {
                    pairs,
                    output_file,
                    elapsed_secs,
                } => {
                    let file = output_file.as_deref().unwrap_or("no usable commits");
                    match elapsed_secs {
                        Some(secs) => println!(
                            "  ✓ {}: {} pairs -> {} ({}s)",
                            unit.full_name, pairs, file, secs
                        ),
                        None => println!("  ✓ {}: {} pairs -> {}", unit.full_name, pairs, file),
                    }
                }
                UnitOutcome::Failed { message } => {
                    println!("  ✗ {}: {}", unit.full_name, message);
                }
            }
        }
        println!();
    }

    if summary.deferred > 0 {
        println!(
            "{} repositories remain; the next run continues with them",
            summary.deferred
        );
        println!();
    }
}

fn print_suggestions(completed_total: usize) {
    println!("Suggestions:");
    if completed_total == 0 {
        println!("  - Check network access and the API token");
        println!("  - Check the search query");
    } else if completed_total < 5 {
        println!("  - Raise search pages or per-page to discover more repositories");
        println!("  - Or list repositories explicitly in target-repos");
    } else {
        println!("  - Try a different search query");
        println!("  - Check whether more training data is needed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(name: &str, pairs: u64) -> UnitResult {
        UnitResult {
            full_name: name.to_string(),
            outcome: UnitOutcome::Completed {
                pairs,
                output_file: Some(format!("{}.json", name.replace('/', "_"))),
                elapsed_secs: Some(12),
            },
        }
    }

    #[test]
    fn test_counts() {
        let summary = RunSummary {
            discovered: 5,
            scheduled: 3,
            units: vec![
                completed("a/x", 10),
                UnitResult {
                    full_name: "b/y".to_string(),
                    outcome: UnitOutcome::Failed {
                        message: "HTTP 500".to_string(),
                    },
                },
                completed("c/z", 4),
            ],
            ..Default::default()
        };

        assert!(!summary.is_idle());
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.pairs_written(), 14);
    }

    #[test]
    fn test_idle_run() {
        let summary = RunSummary {
            discovered: 4,
            skipped_completed: 4,
            ..Default::default()
        };
        assert!(summary.is_idle());

        let recovered = RunSummary {
            recovered: vec!["o/done".to_string()],
            ..Default::default()
        };
        assert!(!recovered.is_idle());
    }
}
