// Library interface for opportunity_scraper
// The binary and the integration tests both go through these modules

pub mod anti_detection;
pub mod browser;
pub mod canonical;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod http_client;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod persistence;
pub mod session;
pub mod source_utils;
pub mod sources;
pub mod transport;

pub use config::ScraperConfig;
pub use crawler::{run_opportunity_scrape, BatchOrchestrator, BatchResult};
pub use error::{RecordError, ScrapeError, SinkError, TransportError};
pub use models::{
    EducationLevel, EmploymentType, JobListing, Opportunity, OpportunityKind, Scholarship, ScrapeFilters,
};
pub use persistence::{run_and_persist, IdentityKey, MemorySink, OpportunitySink, UpsertSummary};
pub use sources::{catalog, SourceAdapter, SourceId};
