//! GitHub API access
//!
//! This module contains everything that talks to the remote API:
//! - `client`: authenticated requests, rate-limit waits, 409 handling
//! - `retry`: the shared retry-with-backoff utility
//! - `pacer`: fixed minimum delay between requests
//! - `types`: the response payloads the harvester reads

mod client;
mod pacer;
pub mod retry;
mod types;

pub use client::{build_http_client, GitHubClient};
pub use pacer::Pacer;
pub use retry::{with_backoff, RetryPolicy};
pub use types::{file_stem, CommitDetail, CommitFile, CommitInfo, CommitSummary, SourceUnit};
