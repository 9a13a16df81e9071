use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Terminal summary of a fully crawled repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedEntry {
    /// When the repository was finalized; `"unknown"` for upgraded legacy entries
    pub completed_at: String,

    /// Training pairs written for the repository
    #[serde(default)]
    pub total_commits: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u64>,

    /// Final output file name inside `training-data/`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_file: Option<String>,

    /// Set instead of `output_file` when nothing usable was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CompletedEntry {
    /// Placeholder for a name read from the legacy list format
    pub fn legacy() -> Self {
        Self {
            completed_at: "unknown".to_string(),
            total_commits: 0,
            stars: None,
            output_file: None,
            note: None,
        }
    }
}

/// Repositories that were crawled to the end
///
/// Keys present here are excluded from discovery until explicitly reset.
/// Older state files stored a bare list of names; those load as entries with
/// `total_commits: 0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompletedRegistry(BTreeMap<String, CompletedEntry>);

/// Both on-disk shapes of the registry
#[derive(Deserialize)]
#[serde(untagged)]
enum RegistryFile {
    Current(BTreeMap<String, CompletedEntry>),
    Legacy(Vec<String>),
}

impl<'de> Deserialize<'de> for CompletedRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RegistryFile::deserialize(deserializer)? {
            RegistryFile::Current(map) => Self(map),
            RegistryFile::Legacy(names) => Self(
                names
                    .into_iter()
                    .map(|name| (name, CompletedEntry::legacy()))
                    .collect(),
            ),
        })
    }
}

impl CompletedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, repo: &str) -> bool {
        self.0.contains_key(repo)
    }

    pub fn get(&self, repo: &str) -> Option<&CompletedEntry> {
        self.0.get(repo)
    }

    pub fn insert(&mut self, repo: &str, entry: CompletedEntry) {
        self.0.insert(repo.to_string(), entry);
    }

    pub fn remove(&mut self, repo: &str) -> Option<CompletedEntry> {
        self.0.remove(repo)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CompletedEntry)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
