//! Commit-Harvester: a resumable GitHub commit crawler
//!
//! This crate collects `{input, output}` training pairs (unified diff and
//! commit message) from GitHub repositories. Progress is checkpointed after
//! every page so an interrupted crawl resumes where it stopped, without
//! fetching any commit twice.

pub mod api;
pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Commit-Harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid crawl status transition: {from} -> {to}")]
    InvalidTransition {
        from: state::CrawlStatus,
        to: state::CrawlStatus,
    },

    #[error("No crawl progress recorded for {0}")]
    MissingProgress(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid repository reference: {0}")]
    InvalidRepo(String),

    #[error("Failed to load env file {path}: {message}")]
    EnvFile { path: String, message: String },

    #[error("Missing API token: set {0} in the environment or .env file")]
    MissingCredential(String),
}

/// GitHub API errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Rate limited on {url}, retry in {wait:?}")]
    RateLimited { url: String, wait: Duration },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl ApiError {
    /// Returns true if repeating the same request may succeed
    ///
    /// Network failures, timeouts and 5xx are transient. Rate limits are
    /// handled separately and never count as a retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { .. } => true,
            Self::Status { status, .. } => *status >= 500 || *status == 408,
            Self::RateLimited { .. }
            | Self::Decode { .. }
            | Self::InvalidUrl(_)
            | Self::Client(_) => false,
        }
    }
}

/// Result type alias for Commit-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for API operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

// Re-export commonly used types
pub use api::{GitHubClient, SourceUnit};
pub use config::Config;
pub use crawler::{extract, RunController, TrainingPair};
pub use state::{CrawlProgress, CrawlStatus};
pub use storage::{JsonStore, StateStore};
