//! Output module for reports printed to the terminal
//!
//! This module handles:
//! - The status report built from the state directory
//! - The summary printed at the end of a run

pub mod stats;
mod summary;

pub use stats::{load_status, print_status_report, StatusReport};
pub use summary::{print_run_summary, RunSummary, UnitOutcome, UnitResult};
