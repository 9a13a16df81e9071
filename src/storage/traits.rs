//! Storage traits and error types
//!
//! This module defines the trait interface for state backends and
//! associated error types.

use crate::state::{CompletedRegistry, ProgressMap, SeenSet};
use crate::storage::{FinalOutput, TrainingPair};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Malformed JSON in {path}: {message}")]
    Serialization { path: String, message: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for state backend implementations
///
/// Every load and save moves a whole document. Callers own the single
/// in-memory copy of each map between a load and the following save; two
/// writers interleaving their saves would lose updates.
pub trait StateStore {
    // ===== Seen commits =====

    /// Loads the per-repository sets of evaluated commit hashes
    fn load_seen(&self) -> StorageResult<SeenSet>;

    /// Replaces the persisted seen sets
    fn save_seen(&self, seen: &SeenSet) -> StorageResult<()>;

    // ===== Completed repositories =====

    /// Loads the completed registry, upgrading the legacy list format
    fn load_completed(&self) -> StorageResult<CompletedRegistry>;

    /// Replaces the persisted completed registry
    fn save_completed(&self, completed: &CompletedRegistry) -> StorageResult<()>;

    // ===== In-progress checkpoints =====

    /// Loads all crawl checkpoints
    fn load_progress(&self) -> StorageResult<ProgressMap>;

    /// Replaces the persisted crawl checkpoints
    fn save_progress(&self, progress: &ProgressMap) -> StorageResult<()>;

    // ===== Training pairs =====

    /// Appends pairs to the repository's temporary artifact
    ///
    /// Called once per page, before the page's hashes and checkpoint are
    /// saved, so a crash never loses pairs whose commits are marked seen.
    fn append_temp_pairs(&self, repo: &str, pairs: &[TrainingPair]) -> StorageResult<()>;

    /// Reads the repository's temporary artifact (empty if absent)
    fn read_temp_pairs(&self, repo: &str) -> StorageResult<Vec<TrainingPair>>;

    /// Deletes the temporary artifact; returns false if there was none
    fn remove_temp(&self, repo: &str) -> StorageResult<bool>;

    /// Writes the final timestamped output for a repository
    ///
    /// `pairs` is the in-memory result of the current run. It is used unless
    /// the temporary artifact holds more pairs (a crawl resumed across runs).
    /// Exact duplicate pairs are dropped, the temporary artifact is removed,
    /// and the output file name is returned with the pair count. Nothing is
    /// written when there are no pairs.
    fn commit_final(
        &self,
        repo: &str,
        pairs: &[TrainingPair],
    ) -> StorageResult<Option<FinalOutput>>;
}
