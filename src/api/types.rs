//! GitHub REST payloads
//!
//! Only the fields the harvester reads are modelled; everything else in the
//! responses is ignored.

use serde::Deserialize;

/// One crawlable repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    pub owner: String,
    pub name: String,
    /// `owner/name`, the key used in every state file
    pub full_name: String,
    pub stars: u64,
    pub forks: u64,
    pub language: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl SourceUnit {
    /// Key used in the state files
    pub fn key(&self) -> &str {
        &self.full_name
    }
}

/// Turns an `owner/name` key into a file-name fragment
pub fn file_stem(full_name: &str) -> String {
    full_name.replace('/', "_")
}

#[derive(Debug, Deserialize)]
pub(crate) struct RepoOwner {
    pub login: String,
}

/// Repository object as returned by `/repos/{owner}/{name}` and search
#[derive(Debug, Deserialize)]
pub(crate) struct RepoPayload {
    pub owner: RepoOwner,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl From<RepoPayload> for SourceUnit {
    fn from(payload: RepoPayload) -> Self {
        Self {
            owner: payload.owner.login,
            name: payload.name,
            full_name: payload.full_name,
            stars: payload.stargazers_count,
            forks: payload.forks_count,
            language: payload.language,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPayload {
    #[serde(default)]
    pub items: Vec<RepoPayload>,
}

/// Entry of a commit list page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitSummary {
    pub sha: String,
}

/// Commit as returned by `/repos/{owner}/{name}/commits/{sha}`
#[derive(Debug, Clone, Deserialize)]
pub struct CommitDetail {
    #[serde(default)]
    pub sha: String,
    pub commit: CommitInfo,
    #[serde(default)]
    pub files: Vec<CommitFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommitInfo {
    pub message: String,
}

/// One changed file of a commit
#[derive(Debug, Clone, Deserialize)]
pub struct CommitFile {
    #[serde(default)]
    pub filename: String,
    /// Absent for binary files and very large diffs
    #[serde(default)]
    pub patch: Option<String>,
}
