/// Crawl status definitions for tracking per-repository progress
///
/// This module defines the states a repository crawl moves through and the
/// transitions allowed between them.
use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the current state of a repository crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    /// Pages are being fetched; resumable from `last_page`
    Processing,

    /// Every commit page was visited
    Completed,

    /// The crawl stopped on an unrecoverable error; resumable from `last_page`
    Error,
}

impl CrawlStatus {
    /// Returns true if the crawl should be picked up again by a later run
    pub fn is_resumable(&self) -> bool {
        matches!(self, Self::Processing | Self::Error)
    }

    /// Checks whether moving from `self` to `to` is allowed
    ///
    /// ```text
    /// processing -> completed
    /// processing -> error
    /// error      -> processing
    /// ```
    ///
    /// A brand-new record starts in `Processing` without a transition.
    pub fn can_transition_to(&self, to: CrawlStatus) -> bool {
        matches!(
            (self, to),
            (Self::Processing, Self::Completed)
                | (Self::Processing, Self::Error)
                | (Self::Error, Self::Processing)
        )
    }

    /// String form used in the progress file
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_transitions() {
        assert!(CrawlStatus::Processing.can_transition_to(CrawlStatus::Completed));
        assert!(CrawlStatus::Processing.can_transition_to(CrawlStatus::Error));
        assert!(CrawlStatus::Error.can_transition_to(CrawlStatus::Processing));
    }

    #[test]
    fn test_forbidden_transitions() {
        assert!(!CrawlStatus::Completed.can_transition_to(CrawlStatus::Processing));
        assert!(!CrawlStatus::Completed.can_transition_to(CrawlStatus::Error));
        assert!(!CrawlStatus::Error.can_transition_to(CrawlStatus::Completed));
        assert!(!CrawlStatus::Processing.can_transition_to(CrawlStatus::Processing));
    }

    #[test]
    fn test_resumable() {
        assert!(CrawlStatus::Processing.is_resumable());
        assert!(CrawlStatus::Error.is_resumable());
        assert!(!CrawlStatus::Completed.is_resumable());
    }

    #[test]
    fn test_display_matches_file_form() {
        for status in [
            CrawlStatus::Processing,
            CrawlStatus::Completed,
            CrawlStatus::Error,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status));
        }
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&CrawlStatus::Error).unwrap();
        assert_eq!(json, "\"error\"");
        let parsed: CrawlStatus = serde_json::from_str("\"completed\"").unwrap();
        assert_eq!(parsed, CrawlStatus::Completed);
    }
}
