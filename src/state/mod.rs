//! State module for tracking crawl progress
//!
//! This module provides the records persisted between runs.
//!
//! # Components
//!
//! - `CrawlStatus`: State machine of a repository crawl (processing, completed, error)
//! - `CrawlProgress`: Resumable per-repository checkpoint
//! - `SeenSet`: Per-repository set of already evaluated commit hashes
//! - `CompletedRegistry`: Terminal records of fully crawled repositories

mod completed;
mod crawl_status;
mod progress;
mod seen;

// Re-export main types
pub use completed::{CompletedEntry, CompletedRegistry};
pub use crawl_status::CrawlStatus;
pub use progress::{now_timestamp, parse_timestamp, CrawlProgress, ProgressMap};
pub use seen::SeenSet;
