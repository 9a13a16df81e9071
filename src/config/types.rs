use serde::Deserialize;

/// Main configuration structure for Commit-Harvester
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub crawler: CrawlerConfig,
    pub retry: RetryConfig,
    pub search: SearchConfig,
    pub extract: ExtractConfig,
    pub output: OutputConfig,
}

/// GitHub API connection settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Base URL of the REST API
    pub base_url: String,

    /// User-Agent header sent with every request
    pub user_agent: String,

    /// Name of the environment variable holding the bearer token
    pub token_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.github.com".to_string(),
            user_agent: format!("commit-harvester/{}", env!("CARGO_PKG_VERSION")),
            token_env: "GITHUB_TOKEN".to_string(),
        }
    }
}

/// Crawl loop limits
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Commits requested per list page
    pub per_page_commits: u32,

    /// Consecutive unproductive commits before a warning is logged
    pub max_skip_streak: u32,

    /// Too-long commits before a warning is logged
    pub max_too_long: u32,

    /// Maximum length of a training input, in characters
    pub max_input_length: usize,

    /// Repositories finished (completed or failed) per invocation
    pub max_repos_per_run: usize,

    /// Minimum time between two API requests (milliseconds)
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            per_page_commits: 100,
            max_skip_streak: 50,
            max_too_long: 50,
            max_input_length: 10_000,
            max_repos_per_run: 1,
            request_delay_ms: 500,
        }
    }
}

/// Retry and rate-limit behaviour of the API client
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    /// Attempts per request, including the first one
    pub max_attempts: u32,

    /// Delay before the first retry; doubled for every further attempt
    pub base_delay_ms: u64,

    /// Extra seconds slept past the advertised rate-limit reset
    pub rate_limit_margin_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            rate_limit_margin_secs: 10,
        }
    }
}

/// Repository discovery
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SearchConfig {
    /// Search query (GitHub search syntax)
    pub query: String,

    /// One search is run per sort key, in this order
    pub sorts: Vec<String>,

    /// Sort order passed to every search
    pub order: String,

    /// Result pages fetched per search
    pub pages: u32,

    /// Results per search page
    pub per_page: u32,

    /// Explicit `owner/name` list; disables searching when non-empty
    pub target_repos: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: "language:Java".to_string(),
            sorts: vec![
                "stars".to_string(),
                "updated".to_string(),
                "forks".to_string(),
            ],
            order: "desc".to_string(),
            pages: 3,
            per_page: 10,
            target_repos: Vec::new(),
        }
    }
}

/// Patch extraction rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractConfig {
    /// Only files with this suffix contribute diffs
    pub source_extension: String,

    /// Comment-like share of added lines that marks a documentation-only change
    pub comment_ratio: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            source_extension: ".java".to_string(),
            comment_ratio: 0.8,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory holding the state files and `training-data/`
    pub state_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            state_dir: ".".to_string(),
        }
    }
}
