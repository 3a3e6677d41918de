use crate::config::{DelayRange, ScraperConfig};
use crate::error::ScrapeError;
use crate::metrics::{ScrapeStats, SourceOutcome, SourceReport};
use crate::models::{Opportunity, OpportunityKind, ScrapeFilters};
use crate::sources::{catalog, SourceAdapter};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep, timeout_at, Instant};

const BUDGET_EXHAUSTED: &str = "batch budget exhausted";

/// Everything one batch produced
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub kind: OpportunityKind,
    pub records: Vec<Opportunity>,
    pub reports: Vec<SourceReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub aborted: bool,
}

/// The batch without its records, for printing
#[derive(Debug, Serialize)]
pub struct BatchSummary<'a> {
    pub kind: OpportunityKind,
    pub records: usize,
    pub sources_succeeded: usize,
    pub sources_failed: usize,
    pub aborted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub reports: &'a [SourceReport],
}

impl BatchResult {
    pub fn summary(&self) -> BatchSummary<'_> {
        BatchSummary {
            kind: self.kind,
            records: self.records.len(),
            sources_succeeded: self.reports.iter().filter(|r| r.outcome.is_success()).count(),
            sources_failed: self
                .reports
                .iter()
                .filter(|r| matches!(r.outcome, SourceOutcome::Failed { .. }))
                .count(),
            aborted: self.aborted,
            started_at: self.started_at,
            finished_at: self.finished_at,
            reports: &self.reports,
        }
    }

    pub fn report_for(&self, source: &str) -> Option<&SourceReport> {
        self.reports.iter().find(|r| r.source == source)
    }
}

/// What an adapter task hands back to the orchestrator
struct DriveOutput {
    result: Result<Vec<Opportunity>, ScrapeError>,
    stats: ScrapeStats,
}

enum TaskEnd {
    Finished(DriveOutput),
    Crashed(JoinError),
    OutOfBudget,
}

/// open, scrape, close. Close runs whatever scrape returned.
async fn drive(mut adapter: Box<dyn SourceAdapter>, filters: ScrapeFilters, num_pages: u32) -> DriveOutput {
    let result = match adapter.open().await {
        Ok(()) => adapter.scrape(&filters, num_pages).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        adapter.session().dump_debug().await;
    }
    adapter.close().await;

    DriveOutput {
        result,
        stats: adapter.session().stats().clone(),
    }
}

fn panic_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "adapter task cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            format!("adapter panicked: {}", message)
        }
        Err(err) => format!("adapter task failed: {}", err),
    }
}

async fn join(mut handle: JoinHandle<DriveOutput>, deadline: Option<Instant>) -> TaskEnd {
    let joined = match deadline {
        Some(deadline) => match timeout_at(deadline, &mut handle).await {
            Ok(joined) => joined,
            Err(_) => {
                // Aborting drops the adapter and with it the transport session
                handle.abort();
                return TaskEnd::OutOfBudget;
            }
        },
        None => handle.await,
    };
    match joined {
        Ok(output) => TaskEnd::Finished(output),
        Err(e) => TaskEnd::Crashed(e),
    }
}

/// Runs a batch of adapters, one task each, and folds their results into a
/// `BatchResult`. One source failing never affects another.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    parallel: bool,
    budget: Option<Duration>,
    between_sources: DelayRange,
}

impl BatchOrchestrator {
    pub fn new(config: &ScraperConfig) -> Self {
        Self {
            parallel: config.orchestrator.parallel,
            budget: config.orchestrator.batch_budget(),
            between_sources: config.pacing.between_sources,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_budget(mut self, budget: Option<Duration>) -> Self {
        self.budget = budget;
        self
    }

    pub async fn run(
        &self,
        kind: OpportunityKind,
        adapters: Vec<Box<dyn SourceAdapter>>,
        filters: &ScrapeFilters,
        num_pages: u32,
    ) -> BatchResult {
        let started_at = Utc::now();
        let deadline = self.budget.map(|budget| Instant::now() + budget);
        info!(
            "Starting {} batch: {} sources, {} pages each ({})",
            kind,
            adapters.len(),
            num_pages,
            if self.parallel { "parallel" } else { "sequential" }
        );

        let mut batch = Batch::default();
        if self.parallel {
            self.run_parallel(kind, adapters, filters, num_pages, deadline, &mut batch).await;
        } else {
            self.run_sequential(kind, adapters, filters, num_pages, deadline, &mut batch).await;
        }

        let result = BatchResult {
            kind,
            records: batch.records,
            reports: batch.reports,
            started_at,
            finished_at: Utc::now(),
            aborted: batch.aborted,
        };
        info!(
            "{} batch finished: {} records from {}/{} sources{}",
            kind,
            result.records.len(),
            result.summary().sources_succeeded,
            result.reports.len(),
            if result.aborted { " (budget exhausted)" } else { "" }
        );
        result
    }

    async fn run_sequential(
        &self,
        kind: OpportunityKind,
        adapters: Vec<Box<dyn SourceAdapter>>,
        filters: &ScrapeFilters,
        num_pages: u32,
        deadline: Option<Instant>,
        batch: &mut Batch,
    ) {
        for (index, adapter) in adapters.into_iter().enumerate() {
            let source = adapter.name();
            if batch.aborted {
                batch.push(SourceReport::skipped(source, kind, BUDGET_EXHAUSTED));
                continue;
            }
            if index > 0 {
                sleep(self.between_sources.sample()).await;
            }

            info!("[{}] Starting", source);
            let started = Instant::now();
            let handle = tokio::spawn(drive(adapter, filters.clone(), num_pages));
            let end = join(handle, deadline).await;
            batch.settle(source, kind, end, started.elapsed());
        }
    }

    async fn run_parallel(
        &self,
        kind: OpportunityKind,
        adapters: Vec<Box<dyn SourceAdapter>>,
        filters: &ScrapeFilters,
        num_pages: u32,
        deadline: Option<Instant>,
        batch: &mut Batch,
    ) {
        let started = Instant::now();
        let tasks: Vec<(&'static str, JoinHandle<DriveOutput>)> = adapters
            .into_iter()
            .map(|adapter| {
                let source = adapter.name();
                (source, tokio::spawn(drive(adapter, filters.clone(), num_pages)))
            })
            .collect();

        // Joined in catalog order so reports come out in the same order every run
        for (source, handle) in tasks {
            let end = if batch.aborted && !handle.is_finished() {
                handle.abort();
                TaskEnd::OutOfBudget
            } else {
                join(handle, deadline).await
            };
            batch.settle(source, kind, end, started.elapsed());
        }
    }
}

#[derive(Default)]
struct Batch {
    records: Vec<Opportunity>,
    reports: Vec<SourceReport>,
    aborted: bool,
}

impl Batch {
    fn push(&mut self, report: SourceReport) {
        report.log_summary();
        self.reports.push(report);
    }

    fn settle(&mut self, source: &str, kind: OpportunityKind, end: TaskEnd, elapsed: Duration) {
        let (outcome, records, stats) = match end {
            TaskEnd::Finished(DriveOutput {
                result: Ok(records),
                stats,
            }) => (SourceOutcome::Succeeded, records, stats),
            TaskEnd::Finished(DriveOutput { result: Err(e), stats }) => {
                error!("[{}] Failed: {}", source, e);
                (SourceOutcome::Failed { reason: e.to_string() }, Vec::new(), stats)
            }
            TaskEnd::Crashed(e) => {
                let reason = panic_message(e);
                error!("[{}] {}", source, reason);
                (SourceOutcome::Failed { reason }, Vec::new(), ScrapeStats::default())
            }
            TaskEnd::OutOfBudget => {
                warn!("[{}] Aborted, {}", source, BUDGET_EXHAUSTED);
                self.aborted = true;
                (
                    SourceOutcome::Failed {
                        reason: BUDGET_EXHAUSTED.to_string(),
                    },
                    Vec::new(),
                    ScrapeStats::default(),
                )
            }
        };

        let report = SourceReport {
            source: source.to_string(),
            kind,
            outcome,
            records: records.len(),
            stats,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        };
        self.records.extend(records);
        self.push(report);
    }
}

/// Scrape every enabled source of `kind` and return the combined batch.
///
/// Never fails: a source that cannot be reached, is blocked, errors or panics
/// shows up as a failed report with zero records.
pub async fn run_opportunity_scrape(
    kind: OpportunityKind,
    filters: &ScrapeFilters,
    page_count: u32,
    config: &ScraperConfig,
) -> BatchResult {
    let adapters = catalog(kind, config);
    BatchOrchestrator::new(config)
        .run(kind, adapters, filters, page_count)
        .await
}
