//! Storage module for persisting crawl state
//!
//! This module handles every file the harvester writes, including:
//! - Seen commit hashes per repository
//! - The completed-repository registry
//! - In-progress crawl checkpoints
//! - Temporary and final training-pair artifacts

mod json_store;
mod traits;

pub use json_store::JsonStore;
pub use traits::{StateStore, StorageError, StorageResult};

use crate::HarvestError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Opens the state directory
///
/// # Arguments
///
/// * `path` - Directory holding the state files
///
/// # Returns
///
/// * `Ok(JsonStore)` - Directory exists and is ready
/// * `Err(HarvestError)` - The directory could not be created
pub fn open_storage(path: &Path) -> Result<JsonStore, HarvestError> {
    Ok(JsonStore::new(path)?)
}

/// One training record: a diff and the message that described it
///
/// Field names and the array-of-objects layout are read by the downstream
/// cleaning and training scripts and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrainingPair {
    pub input: String,
    pub output: String,
}

/// Final artifact written for a finished repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalOutput {
    /// File name inside `training-data/`
    pub filename: String,

    /// Pairs written after duplicate removal
    pub pair_count: usize,
}
