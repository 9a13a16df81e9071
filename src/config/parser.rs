use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use commit_harvester::config::load_config;
///
/// let config = load_config(Path::new("harvester.toml")).unwrap();
/// println!("Repos per run: {}", config.crawler.max_repos_per_run);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run's output can be tied to the settings it used.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Loads the `.env` file and reads the API token from the environment
///
/// An explicit `env_file` must exist; without one, a `.env` in the current
/// directory or its parents is used when present.
pub fn load_token(token_env: &str, env_file: Option<&Path>) -> Result<String, ConfigError> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        }
        None => {
            if let Ok(path) = dotenvy::dotenv() {
                tracing::debug!("Loaded environment from {}", path.display());
            }
        }
    }

    resolve_token(token_env, |name| std::env::var(name).ok())
}

/// Picks the token out of an environment lookup, rejecting blank values
pub fn resolve_token<F>(token_env: &str, lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(token_env)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingCredential(token_env.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[api]
base-url = "https://github.example.com/api/v3"
user-agent = "TestHarvester/1.0"

[crawler]
per-page-commits = 50
max-repos-per-run = 4
request-delay-ms = 0

[search]
query = "language:Kotlin"
sorts = ["stars"]
target-repos = ["apache/kafka"]

[output]
state-dir = "./state"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.api.base_url, "https://github.example.com/api/v3");
        assert_eq!(config.api.token_env, "GITHUB_TOKEN");
        assert_eq!(config.crawler.per_page_commits, 50);
        assert_eq!(config.crawler.max_repos_per_run, 4);
        assert_eq!(config.crawler.max_input_length, 10_000);
        assert_eq!(config.search.sorts, vec!["stars".to_string()]);
        assert_eq!(config.search.target_repos.len(), 1);
        assert_eq!(config.extract.source_extension, ".java");
        assert_eq!(config.output.state_dir, "./state");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.per_page_commits, 100);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.search.sorts.len(), 3);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/harvester.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
per-page-commits = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        let file1 = create_temp_config("content 1");
        let file2 = create_temp_config("content 2");

        let hash1 = compute_config_hash(file1.path()).unwrap();
        let hash2 = compute_config_hash(file2.path()).unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_resolve_token_present() {
        let token = resolve_token("GITHUB_TOKEN", |name| {
            (name == "GITHUB_TOKEN").then(|| " ghp_abc \n".to_string())
        })
        .unwrap();
        assert_eq!(token, "ghp_abc");
    }

    #[test]
    fn test_resolve_token_missing_or_blank() {
        let missing = resolve_token("GITHUB_TOKEN", |_| None);
        assert!(matches!(missing, Err(ConfigError::MissingCredential(ref v)) if v == "GITHUB_TOKEN"));

        let blank = resolve_token("GITHUB_TOKEN", |_| Some("   ".to_string()));
        assert!(matches!(blank, Err(ConfigError::MissingCredential(_))));
    }

    #[test]
    fn test_load_token_from_explicit_env_file() {
        let file = create_temp_config("HARVESTER_TEST_TOKEN_FILE=from-file\n");
        let token = load_token("HARVESTER_TEST_TOKEN_FILE", Some(file.path())).unwrap();
        assert_eq!(token, "from-file");
    }

    #[test]
    fn test_load_token_missing_env_file() {
        let result = load_token("GITHUB_TOKEN", Some(Path::new("/nonexistent/.env")));
        assert!(matches!(result, Err(ConfigError::EnvFile { .. })));
    }
}
