//! Per-source counters and outcomes for one batch
//!
//! A session fills `ScrapeStats` as it fetches; the orchestrator wraps them in
//! a `SourceReport` once the adapter is done.

use crate::models::OpportunityKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeStats {
    pub pages_requested: u32,
    pub pages_fetched: u32,
    pub pages_skipped_blocked: u32,
    pub pages_skipped_unavailable: u32,
    /// Every fetch judged blocked, retried ones included
    pub blocked_responses: u32,
    pub retries: u32,
    pub fragments_dropped: u32,
}

impl ScrapeStats {
    pub fn success_rate(&self) -> f64 {
        if self.pages_requested == 0 {
            0.0
        } else {
            (self.pages_fetched as f64 / self.pages_requested as f64) * 100.0
        }
    }

    pub fn pages_skipped(&self) -> u32 {
        self.pages_skipped_blocked + self.pages_skipped_unavailable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Succeeded,
    Failed { reason: String },
    Skipped { reason: String },
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceOutcome::Succeeded)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: String,
    pub kind: OpportunityKind,
    pub outcome: SourceOutcome,
    pub records: usize,
    pub stats: ScrapeStats,
    pub elapsed_ms: u64,
}

impl SourceReport {
    /// Report for a source that never ran
    pub fn skipped(source: &str, kind: OpportunityKind, reason: &str) -> Self {
        Self {
            source: source.to_string(),
            kind,
            outcome: SourceOutcome::Skipped {
                reason: reason.to_string(),
            },
            records: 0,
            stats: ScrapeStats::default(),
            elapsed_ms: 0,
        }
    }

    pub fn log_summary(&self) {
        match &self.outcome {
            SourceOutcome::Succeeded => log::info!(
                "[{}] {} records - pages {}/{} ({:.2}%) - blocked {} - retries {} - dropped {} - {}ms",
                self.source,
                self.records,
                self.stats.pages_fetched,
                self.stats.pages_requested,
                self.stats.success_rate(),
                self.stats.blocked_responses,
                self.stats.retries,
                self.stats.fragments_dropped,
                self.elapsed_ms
            ),
            SourceOutcome::Failed { reason } => log::warn!(
                "[{}] Failure - {} - {} records kept - pages {}/{}",
                self.source,
                reason,
                self.records,
                self.stats.pages_fetched,
                self.stats.pages_requested
            ),
            SourceOutcome::Skipped { reason } => log::warn!("[{}] Skipped - {}", self.source, reason),
        }
    }
}
