//! Identity keys and the upsert contract records are handed to.

use crate::config::ScraperConfig;
use crate::crawler::{run_opportunity_scrape, BatchResult};
use crate::error::SinkError;
use crate::models::{Opportunity, OpportunityKind, ScrapeFilters};
use log::{error, info};
use serde::Serialize;
use std::collections::HashMap;

/// The fields that make two records the same opportunity
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentityKey {
    Job {
        title: String,
        company: String,
        application_url: String,
    },
    Scholarship {
        title: String,
        organization: String,
        source_website: String,
    },
}

impl Opportunity {
    pub fn identity_key(&self) -> IdentityKey {
        match self {
            Opportunity::Job(job) => IdentityKey::Job {
                title: job.title.clone(),
                company: job.company.clone(),
                application_url: job.application_url.clone(),
            },
            Opportunity::Scholarship(s) => IdentityKey::Scholarship {
                title: s.title.clone(),
                organization: s.organization.clone(),
                source_website: s.source_website.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpsertSummary {
    pub created: usize,
    pub updated: usize,
}

/// Anything that stores canonical records. Upserting the same record twice
/// must leave a single row behind.
pub trait OpportunitySink: Send {
    fn upsert(&mut self, records: &[Opportunity]) -> Result<UpsertSummary, SinkError>;
}

/// In-memory sink keyed by identity
#[derive(Debug, Default)]
pub struct MemorySink {
    rows: HashMap<IdentityKey, Opportunity>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, key: &IdentityKey) -> Option<&Opportunity> {
        self.rows.get(key)
    }

    pub fn count(&self, kind: OpportunityKind) -> usize {
        self.rows.values().filter(|r| r.kind() == kind).count()
    }

    /// Stored rows ordered by identity key
    pub fn rows(&self) -> Vec<&Opportunity> {
        let mut keys: Vec<&IdentityKey> = self.rows.keys().collect();
        keys.sort();
        keys.into_iter().filter_map(|k| self.rows.get(k)).collect()
    }
}

impl OpportunitySink for MemorySink {
    fn upsert(&mut self, records: &[Opportunity]) -> Result<UpsertSummary, SinkError> {
        let mut summary = UpsertSummary::default();
        for record in records {
            match self.rows.insert(record.identity_key(), record.clone()) {
                Some(_) => summary.updated += 1,
                None => summary.created += 1,
            }
        }
        Ok(summary)
    }
}

/// Run a batch and hand its records to `sink`. A sink failure is logged and
/// returned next to the batch, which is left untouched.
pub async fn run_and_persist(
    kind: OpportunityKind,
    filters: &ScrapeFilters,
    page_count: u32,
    config: &ScraperConfig,
    sink: &mut dyn OpportunitySink,
) -> (BatchResult, Result<UpsertSummary, SinkError>) {
    let batch = run_opportunity_scrape(kind, filters, page_count, config).await;
    let stored = sink.upsert(&batch.records);
    match &stored {
        Ok(summary) => info!(
            "Stored {} {} records: {} created, {} updated",
            batch.records.len(),
            kind,
            summary.created,
            summary.updated
        ),
        Err(e) => error!("Could not store {} batch: {}", kind, e),
    }
    (batch, stored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::{JobDraft, ScholarshipDraft};

    fn scholarship(title: &str, amount: &str) -> Opportunity {
        ScholarshipDraft {
            title: Some(title.to_string()),
            organization: Some("DAAD".to_string()),
            amount: Some(amount.to_string()),
            website_url: Some("https://www2.daad.de/a".to_string()),
            ..Default::default()
        }
        .finish("DAAD")
        .unwrap()
        .into()
    }

    fn job(title: &str) -> Opportunity {
        JobDraft {
            title: Some(title.to_string()),
            company: Some("Acme".to_string()),
            application_url: Some("https://jobs.acme.com/1".to_string()),
            ..Default::default()
        }
        .finish("Indeed")
        .unwrap()
        .into()
    }

    #[test]
    fn test_upsert_creates_then_updates() {
        let mut sink = MemorySink::new();
        let first = sink.upsert(&[scholarship("Grant", "€850"), job("Engineer")]).unwrap();
        assert_eq!(first, UpsertSummary { created: 2, updated: 0 });

        let second = sink.upsert(&[scholarship("Grant", "€934")]).unwrap();
        assert_eq!(second, UpsertSummary { created: 0, updated: 1 });
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.count(OpportunityKind::Scholarship), 1);

        let stored = sink.get(&scholarship("Grant", "").identity_key()).unwrap();
        assert_eq!(stored.as_scholarship().unwrap().amount, "€934");
    }

    #[test]
    fn test_identity_ignores_non_key_fields() {
        assert_eq!(
            scholarship("Grant", "€850").identity_key(),
            scholarship("Grant", "€1,200").identity_key()
        );
        assert_ne!(job("Engineer").identity_key(), job("Senior Engineer").identity_key());
    }

    #[test]
    fn test_same_title_different_kind_does_not_collide() {
        let mut sink = MemorySink::new();
        sink.upsert(&[scholarship("Fellowship", "x"), job("Fellowship")]).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.rows().len(), 2);
    }
}
