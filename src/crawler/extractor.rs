//! Patch extraction
//!
//! Turns one commit detail into a training pair, or decides the commit is
//! not worth training on.

use crate::api::{CommitDetail, SourceUnit};
use crate::config::ExtractConfig;
use crate::storage::TrainingPair;

/// Prefixes that mark an added line as a comment
const COMMENT_MARKERS: [&str; 4] = ["//", "*", "/*", "*/"];

/// Rules applied to every commit
#[derive(Debug, Clone)]
pub struct ExtractRules {
    /// Only files with this suffix contribute diffs
    pub source_extension: String,

    /// A file whose added lines are at least this share comments rejects the commit
    pub comment_ratio: f64,
}

impl ExtractRules {
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            source_extension: config.source_extension.clone(),
            comment_ratio: config.comment_ratio,
        }
    }
}

impl Default for ExtractRules {
    fn default() -> Self {
        Self::from_config(&ExtractConfig::default())
    }
}

/// Builds a training pair from a commit detail
///
/// Returns `None` when:
/// - the message contains CJK ideographs (the corpus is English-only)
/// - the message is blank
/// - any matching file is mostly a comment change
/// - no matching file has patch text
pub fn extract(detail: &CommitDetail, unit: &SourceUnit, rules: &ExtractRules) -> Option<TrainingPair> {
    let message = detail.commit.message.trim();

    if contains_cjk(message) {
        tracing::trace!("{}@{}: message not in target script", unit.full_name, short_sha(&detail.sha));
        return None;
    }

    if message.is_empty() {
        return None;
    }

    let mut diffs = Vec::new();
    for file in &detail.files {
        let patch = match file.patch.as_deref() {
            Some(patch) if !patch.is_empty() => patch,
            _ => continue,
        };
        if !file.filename.ends_with(&rules.source_extension) {
            continue;
        }

        if is_mostly_comments(patch, rules.comment_ratio) {
            tracing::trace!(
                "{}@{}: {} is a comment-only change",
                unit.full_name,
                short_sha(&detail.sha),
                file.filename
            );
            return None;
        }

        diffs.push(format_patch(&file.filename, patch));
    }

    if diffs.is_empty() {
        return None;
    }

    Some(TrainingPair {
        input: diffs.join("\n\n"),
        output: message.to_string(),
    })
}

/// Returns true for CJK Unified Ideographs, Extension A and Compatibility Ideographs
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
    })
}

/// Checks whether the added lines of a patch are mostly comments
pub fn is_mostly_comments(patch: &str, threshold: f64) -> bool {
    let added: Vec<&str> = patch
        .lines()
        .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
        .map(|line| line[1..].trim())
        .collect();

    if added.is_empty() {
        return false;
    }

    let comments = added
        .iter()
        .filter(|line| COMMENT_MARKERS.iter().any(|marker| line.starts_with(marker)))
        .count();

    comments as f64 / added.len() as f64 >= threshold
}

/// Prefixes a raw patch hunk with git's file headers
pub fn format_patch(filename: &str, patch: &str) -> String {
    format!(
        "diff --git a/{0} b/{0}\n--- a/{0}\n+++ b/{0}\n{1}",
        filename, patch
    )
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}
