use crate::config::types::{
    ApiConfig, Config, CrawlerConfig, ExtractConfig, OutputConfig, RetryConfig, SearchConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_api_config(&config.api)?;
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_search_config(&config.search)?;
    validate_extract_config(&config.extract)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates API connection settings
fn validate_api_config(config: &ApiConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.token_env.trim().is_empty() {
        return Err(ConfigError::Validation(
            "token_env cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawl loop limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // GitHub caps list pages at 100 entries
    if config.per_page_commits < 1 || config.per_page_commits > 100 {
        return Err(ConfigError::Validation(format!(
            "per_page_commits must be between 1 and 100, got {}",
            config.per_page_commits
        )));
    }

    if config.max_skip_streak < 1 {
        return Err(ConfigError::Validation(
            "max_skip_streak must be >= 1".to_string(),
        ));
    }

    if config.max_too_long < 1 {
        return Err(ConfigError::Validation(
            "max_too_long must be >= 1".to_string(),
        ));
    }

    if config.max_input_length < 1 {
        return Err(ConfigError::Validation(
            "max_input_length must be >= 1".to_string(),
        ));
    }

    if config.max_repos_per_run < 1 {
        return Err(ConfigError::Validation(format!(
            "max_repos_per_run must be >= 1, got {}",
            config.max_repos_per_run
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates repository discovery settings
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    for repo in &config.target_repos {
        validate_repo_name(repo)?;
    }

    // An explicit list makes the search settings irrelevant
    if !config.target_repos.is_empty() {
        return Ok(());
    }

    if config.query.trim().is_empty() {
        return Err(ConfigError::Validation(
            "search query cannot be empty".to_string(),
        ));
    }

    if config.sorts.is_empty() {
        return Err(ConfigError::Validation(
            "at least one search sort is required".to_string(),
        ));
    }

    for sort in &config.sorts {
        if !matches!(sort.as_str(), "stars" | "forks" | "updated" | "help-wanted-issues") {
            return Err(ConfigError::Validation(format!(
                "Unknown search sort '{}'",
                sort
            )));
        }
    }

    if !matches!(config.order.as_str(), "asc" | "desc") {
        return Err(ConfigError::Validation(format!(
            "search order must be 'asc' or 'desc', got '{}'",
            config.order
        )));
    }

    if config.pages < 1 {
        return Err(ConfigError::Validation(
            "search pages must be >= 1".to_string(),
        ));
    }

    if config.per_page < 1 || config.per_page > 100 {
        return Err(ConfigError::Validation(format!(
            "search per_page must be between 1 and 100, got {}",
            config.per_page
        )));
    }

    Ok(())
}

fn validate_extract_config(config: &ExtractConfig) -> Result<(), ConfigError> {
    if config.source_extension.is_empty() {
        return Err(ConfigError::Validation(
            "source_extension cannot be empty".to_string(),
        ));
    }

    if !(config.comment_ratio > 0.0 && config.comment_ratio <= 1.0) {
        return Err(ConfigError::Validation(format!(
            "comment_ratio must be in (0, 1], got {}",
            config.comment_ratio
        )));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.state_dir.is_empty() {
        return Err(ConfigError::Validation(
            "state_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates an `owner/name` repository reference
pub fn validate_repo_name(repo: &str) -> Result<(), ConfigError> {
    let mut parts = repo.split('/');
    let (owner, name) = match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => (owner, name),
        _ => {
            return Err(ConfigError::InvalidRepo(format!(
                "'{}' is not of the form owner/name",
                repo
            )))
        }
    };

    let valid_part = |part: &str| {
        !part.is_empty()
            && part
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    };

    if !valid_part(owner) || !valid_part(name) {
        return Err(ConfigError::InvalidRepo(format!(
            "'{}' contains invalid characters",
            repo
        )));
    }

    Ok(())
}
