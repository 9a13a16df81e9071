use crate::api::file_stem;
use crate::state::{CompletedRegistry, ProgressMap, SeenSet};
use crate::storage::traits::{StateStore, StorageError, StorageResult};
use crate::storage::{FinalOutput, TrainingPair};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

const SEEN_FILE: &str = "seen_commits.json";
const COMPLETED_FILE: &str = "completed_repos.json";
const PROGRESS_FILE: &str = "repo_progress.json";
const TRAINING_DIR: &str = "training-data";

/// State store backed by pretty-printed JSON files
///
/// Layout under the root directory:
///
/// ```text
/// seen_commits.json
/// completed_repos.json
/// repo_progress.json
/// training-data/<owner>_<name>_temp.json
/// training-data/<owner>_<name>_<YYYYmmdd_HHMMSS>.json
/// ```
#[derive(Debug, Clone)]
pub struct JsonStore {
    root: PathBuf,
    training_dir: PathBuf,
}

impl JsonStore {
    /// Opens (and creates, if needed) a state directory
    pub fn new(root: &Path) -> StorageResult<Self> {
        let training_dir = root.join(TRAINING_DIR);
        fs::create_dir_all(&training_dir).map_err(|source| StorageError::Io {
            path: training_dir.display().to_string(),
            source,
        })?;

        Ok(Self {
            root: root.to_path_buf(),
            training_dir,
        })
    }

    pub fn training_dir(&self) -> &Path {
        &self.training_dir
    }

    pub fn temp_path(&self, repo: &str) -> PathBuf {
        self.training_dir.join(format!("{}_temp.json", file_stem(repo)))
    }

    fn read_json<T: DeserializeOwned + Default>(&self, path: &Path) -> StorageResult<T> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(T::default());
        }

        serde_json::from_str(&content).map_err(|e| StorageError::Serialization {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Writes a sibling temporary file and renames it over `path`
    fn write_json<T: Serialize + ?Sized>(&self, path: &Path, value: &T) -> StorageResult<()> {
        let content =
            serde_json::to_string_pretty(value).map_err(|e| StorageError::Serialization {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);

        let io_err = |source| StorageError::Io {
            path: path.display().to_string(),
            source,
        };
        fs::write(&staging, content).map_err(io_err)?;
        fs::rename(&staging, path).map_err(io_err)?;
        Ok(())
    }
}

impl StateStore for JsonStore {
    fn load_seen(&self) -> StorageResult<SeenSet> {
        self.read_json(&self.root.join(SEEN_FILE))
    }

    fn save_seen(&self, seen: &SeenSet) -> StorageResult<()> {
        self.write_json(&self.root.join(SEEN_FILE), seen)
    }

    fn load_completed(&self) -> StorageResult<CompletedRegistry> {
        self.read_json(&self.root.join(COMPLETED_FILE))
    }

    fn save_completed(&self, completed: &CompletedRegistry) -> StorageResult<()> {
        self.write_json(&self.root.join(COMPLETED_FILE), completed)
    }

    fn load_progress(&self) -> StorageResult<ProgressMap> {
        self.read_json(&self.root.join(PROGRESS_FILE))
    }

    fn save_progress(&self, progress: &ProgressMap) -> StorageResult<()> {
        self.write_json(&self.root.join(PROGRESS_FILE), progress)
    }

    fn append_temp_pairs(&self, repo: &str, pairs: &[TrainingPair]) -> StorageResult<()> {
        if pairs.is_empty() {
            return Ok(());
        }

        let path = self.temp_path(repo);
        let mut existing: Vec<TrainingPair> = self.read_json(&path)?;
        existing.extend_from_slice(pairs);
        self.write_json(&path, &existing)?;

        tracing::debug!(
            "Appended {} pairs to {} ({} total)",
            pairs.len(),
            path.display(),
            existing.len()
        );
        Ok(())
    }

    fn read_temp_pairs(&self, repo: &str) -> StorageResult<Vec<TrainingPair>> {
        self.read_json(&self.temp_path(repo))
    }

    fn remove_temp(&self, repo: &str) -> StorageResult<bool> {
        let path = self.temp_path(repo);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn commit_final(
        &self,
        repo: &str,
        pairs: &[TrainingPair],
    ) -> StorageResult<Option<FinalOutput>> {
        let temp = self.read_temp_pairs(repo)?;
        let source: &[TrainingPair] = if temp.len() > pairs.len() {
            tracing::debug!(
                "Using {} pairs from temp artifact over {} in memory",
                temp.len(),
                pairs.len()
            );
            &temp
        } else {
            pairs
        };

        let mut unique = HashSet::new();
        let deduped: Vec<&TrainingPair> = source.iter().filter(|p| unique.insert(*p)).collect();
        if deduped.len() < source.len() {
            tracing::info!(
                "Dropped {} duplicate pairs for {}",
                source.len() - deduped.len(),
                repo
            );
        }

        let output = if deduped.is_empty() {
            None
        } else {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            let filename = format!("{}_{}.json", file_stem(repo), timestamp);
            let path = self.training_dir.join(&filename);
            self.write_json(&path, &deduped)?;
            tracing::info!("Wrote {} pairs to {}", deduped.len(), path.display());
            Some(FinalOutput {
                filename,
                pair_count: deduped.len(),
            })
        };

        self.remove_temp(repo)?;
        Ok(output)
    }
}
