use crate::api::SourceUnit;
use crate::state::CrawlStatus;
use crate::HarvestError;
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// In-progress checkpoints keyed by repository full name
pub type ProgressMap = BTreeMap<String, CrawlProgress>;

/// Resumable checkpoint of one repository crawl
///
/// `last_page` is the next commit page to fetch. After N fully processed
/// pages it holds N + 1, so a restarted crawl picks up exactly where the
/// previous one stopped. The counters are cumulative over every run that
/// touched the repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlProgress {
    pub owner: String,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub stars: u64,
    pub start_time: String,
    pub last_page: u32,
    #[serde(default)]
    pub collected_count: u64,
    #[serde(default)]
    pub total_processed: u64,
    pub status: CrawlStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u32>,
}

impl CrawlProgress {
    /// Creates the checkpoint for a repository visited for the first time
    pub fn new(unit: &SourceUnit) -> Self {
        Self {
            owner: unit.owner.clone(),
            name: unit.name.clone(),
            full_name: unit.full_name.clone(),
            stars: unit.stars,
            start_time: now_timestamp(),
            last_page: 1,
            collected_count: 0,
            total_processed: 0,
            status: CrawlStatus::Processing,
            end_time: None,
            error_message: None,
            error_time: None,
            retry_time: None,
            final_count: None,
            total_pages: None,
        }
    }

    /// Moves to `to`, rejecting transitions the state machine does not allow
    pub fn transition(&mut self, to: CrawlStatus) -> Result<(), HarvestError> {
        if !self.status.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }

    /// Re-enters `Processing` after a failed run, keeping the page position
    ///
    /// Returns true if the record was in `Error`.
    pub fn resume(&mut self) -> Result<bool, HarvestError> {
        if self.status != CrawlStatus::Error {
            return Ok(false);
        }
        self.transition(CrawlStatus::Processing)?;
        self.retry_time = Some(now_timestamp());
        self.error_message = None;
        self.error_time = None;
        Ok(true)
    }

    /// Records a processed page
    pub fn record_page(&mut self, next_page: u32, accepted: u64, processed: u64) {
        self.last_page = next_page;
        self.collected_count += accepted;
        self.total_processed += processed;
    }

    /// Marks the crawl finished after `total_pages` non-empty pages
    pub fn mark_completed(&mut self, total_pages: u32) -> Result<(), HarvestError> {
        self.transition(CrawlStatus::Completed)?;
        self.end_time = Some(now_timestamp());
        self.final_count = Some(self.collected_count);
        self.total_pages = Some(total_pages);
        Ok(())
    }

    /// Marks the crawl failed with the given message
    pub fn mark_error(&mut self, message: &str) -> Result<(), HarvestError> {
        self.transition(CrawlStatus::Error)?;
        self.error_message = Some(message.to_string());
        self.error_time = Some(now_timestamp());
        Ok(())
    }

    /// Rebuilds the repository identity stored in the checkpoint
    ///
    /// Only the fields persisted here are known; ranking metadata that the
    /// checkpoint does not carry is left empty.
    pub fn to_source_unit(&self) -> SourceUnit {
        SourceUnit {
            owner: self.owner.clone(),
            name: self.name.clone(),
            full_name: self.full_name.clone(),
            stars: self.stars,
            forks: 0,
            language: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Time between `start_time` and `end_time` (or now, while running)
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        let start = parse_timestamp(&self.start_time)?;
        let end = match &self.end_time {
            Some(end) => parse_timestamp(end)?,
            None => Utc::now(),
        };
        Some(end - start)
    }
}

/// Current time in the format written to the state files
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parses a state-file timestamp
///
/// Accepts RFC 3339 and offset-less ISO 8601 (read as UTC), which older
/// state files contain.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
