use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Commit hashes already evaluated, per repository
///
/// Serialized as `{ "owner/name": ["sha", ...] }` with each list sorted, so
/// the file diffs cleanly between runs. A hash is recorded whatever the
/// evaluation outcome was, and a recorded hash is never fetched again for
/// that repository.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeenSet(BTreeMap<String, BTreeSet<String>>);

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if `sha` was already evaluated for `repo`
    pub fn contains(&self, repo: &str, sha: &str) -> bool {
        self.0.get(repo).is_some_and(|shas| shas.contains(sha))
    }

    /// Records `sha` for `repo`; returns false if it was already present
    pub fn insert(&mut self, repo: &str, sha: &str) -> bool {
        self.0
            .entry(repo.to_string())
            .or_default()
            .insert(sha.to_string())
    }

    /// Number of hashes recorded for one repository
    pub fn repo_len(&self, repo: &str) -> usize {
        self.0.get(repo).map_or(0, BTreeSet::len)
    }

    /// Drops everything recorded for `repo`
    pub fn remove_repo(&mut self, repo: &str) -> bool {
        self.0.remove(repo).is_some()
    }

    /// Number of repositories with recorded hashes
    pub fn repo_count(&self) -> usize {
        self.0.len()
    }

    /// Total number of recorded hashes
    pub fn total(&self) -> usize {
        self.0.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
