//! Configuration module for Commit-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and reading the API credential from the environment.
//!
//! # Example
//!
//! ```no_run
//! use commit_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Searching for: {}", config.search.query);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ApiConfig, Config, CrawlerConfig, ExtractConfig, OutputConfig, RetryConfig, SearchConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_token, resolve_token,
};
pub use validation::{validate, validate_repo_name};
