//! Source adapters and the catalog that selects them.
//!
//! Each adapter owns one `SourceSession` and knows how to build its listing
//! URLs and turn fragments into drafts. Everything else (fetching, blocks,
//! retry, pacing) lives in the session.

use crate::config::ScraperConfig;
use crate::error::ScrapeError;
use crate::models::{Opportunity, OpportunityKind, ScrapeFilters};
use crate::session::SourceSession;
use crate::source_utils::{build_transport, FetchStrategy};
use async_trait::async_trait;

pub mod cards;

// Job boards
pub mod glassdoor;
pub mod indeed;
pub mod linkedin;
pub mod remoteok;

// Scholarship listings rendered in the browser
pub mod cheetah;
pub mod fastweb;
pub mod international_scholarships;
pub mod scholarship_positions;
pub mod scholarships_com;
pub mod university_positions;

// Official programmes, plain HTTP
pub mod commonwealth;
pub mod daad;
pub mod erasmus;
pub mod eu_funding;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Indeed,
    LinkedIn,
    RemoteOk,
    Glassdoor,
    ScholarshipsCom,
    ScholarshipPositions,
    UniversityPositions,
    InternationalScholarships,
    FastWeb,
    Cheetah,
    Daad,
    Erasmus,
    Commonwealth,
    EuFunding,
}

impl SourceId {
    /// Catalog order, which is also the order sources run and report in
    pub const ALL: [SourceId; 14] = [
        SourceId::Indeed,
        SourceId::LinkedIn,
        SourceId::RemoteOk,
        SourceId::Glassdoor,
        SourceId::ScholarshipsCom,
        SourceId::ScholarshipPositions,
        SourceId::UniversityPositions,
        SourceId::InternationalScholarships,
        SourceId::FastWeb,
        SourceId::Cheetah,
        SourceId::Daad,
        SourceId::Erasmus,
        SourceId::Commonwealth,
        SourceId::EuFunding,
    ];

    pub fn kind(self) -> OpportunityKind {
        match self {
            SourceId::Indeed | SourceId::LinkedIn | SourceId::RemoteOk | SourceId::Glassdoor => OpportunityKind::Job,
            _ => OpportunityKind::Scholarship,
        }
    }

    /// The `source_website` stamped on every record from this source
    pub fn display_name(self) -> &'static str {
        match self {
            SourceId::Indeed => "Indeed",
            SourceId::LinkedIn => "LinkedIn",
            SourceId::RemoteOk => "RemoteOK",
            SourceId::Glassdoor => "Glassdoor",
            SourceId::ScholarshipsCom => "Scholarships.com",
            SourceId::ScholarshipPositions => "Scholarship-Positions.com",
            SourceId::UniversityPositions => "UniversityPositions.eu",
            SourceId::InternationalScholarships => "InternationalScholarships.com",
            SourceId::FastWeb => "FastWeb.com",
            SourceId::Cheetah => "Cheetah.org",
            SourceId::Daad => "DAAD",
            SourceId::Erasmus => "Erasmus+",
            SourceId::Commonwealth => "Commonwealth Scholarship Commission",
            SourceId::EuFunding => "EU Funding & Tenders",
        }
    }

    /// Stable identifier for config files and debug dumps
    pub fn slug(self) -> &'static str {
        match self {
            SourceId::Indeed => "indeed",
            SourceId::LinkedIn => "linkedin",
            SourceId::RemoteOk => "remoteok",
            SourceId::Glassdoor => "glassdoor",
            SourceId::ScholarshipsCom => "scholarships_com",
            SourceId::ScholarshipPositions => "scholarship_positions",
            SourceId::UniversityPositions => "university_positions",
            SourceId::InternationalScholarships => "international_scholarships",
            SourceId::FastWeb => "fastweb",
            SourceId::Cheetah => "cheetah",
            SourceId::Daad => "daad",
            SourceId::Erasmus => "erasmus",
            SourceId::Commonwealth => "commonwealth",
            SourceId::EuFunding => "eu_funding",
        }
    }

    pub fn strategy(self) -> FetchStrategy {
        match self {
            SourceId::Daad | SourceId::Erasmus | SourceId::Commonwealth => FetchStrategy::Static,
            SourceId::EuFunding => FetchStrategy::Json,
            _ => FetchStrategy::Browser,
        }
    }

    /// A fresh session on this source's preferred transport
    pub fn session(self, config: &ScraperConfig) -> SourceSession {
        SourceSession::new(
            self.display_name(),
            self.slug(),
            build_transport(self.strategy(), config),
            config,
        )
    }
}

/// Parse a source name, slug or display name into a SourceId
pub fn parse_source(s: &str) -> Option<SourceId> {
    let k = s.trim().to_lowercase();
    let compact: String = k.chars().filter(|c| c.is_alphanumeric()).collect();
    match compact.as_str() {
        "indeed" => Some(SourceId::Indeed),
        "linkedin" => Some(SourceId::LinkedIn),
        "remoteok" => Some(SourceId::RemoteOk),
        "glassdoor" => Some(SourceId::Glassdoor),
        "scholarshipscom" | "scholarships" => Some(SourceId::ScholarshipsCom),
        "scholarshippositions" | "scholarshippositionscom" => Some(SourceId::ScholarshipPositions),
        "universitypositions" | "universitypositionseu" => Some(SourceId::UniversityPositions),
        "internationalscholarships" | "internationalscholarshipscom" => Some(SourceId::InternationalScholarships),
        "fastweb" | "fastwebcom" => Some(SourceId::FastWeb),
        "cheetah" | "cheetahorg" => Some(SourceId::Cheetah),
        "daad" => Some(SourceId::Daad),
        "erasmus" | "erasmusplus" => Some(SourceId::Erasmus),
        "commonwealth" | "commonwealthscholarshipcommission" | "cscuk" => Some(SourceId::Commonwealth),
        "eufunding" | "eufundingtenders" | "cordis" => Some(SourceId::EuFunding),
        _ => None,
    }
}

/// A site-specific producer of canonical records
#[async_trait]
pub trait SourceAdapter: Send {
    fn id(&self) -> SourceId;

    fn session(&mut self) -> &mut SourceSession;

    fn kind(&self) -> OpportunityKind {
        self.id().kind()
    }

    fn name(&self) -> &'static str {
        self.id().display_name()
    }

    async fn open(&mut self) -> Result<(), ScrapeError> {
        self.session().open().await?;
        Ok(())
    }

    async fn close(&mut self) {
        self.session().close().await;
    }

    /// Fetch pages 0..num_pages and return every record that survived canonicalization
    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError>;
}

/// Build the adapter for one source on its default transport
pub fn adapter_for(id: SourceId, config: &ScraperConfig) -> Box<dyn SourceAdapter> {
    let session = id.session(config);
    match id {
        SourceId::Indeed => Box::new(indeed::IndeedAdapter::with_session(session)),
        SourceId::LinkedIn => Box::new(linkedin::LinkedInAdapter::with_session(session)),
        SourceId::RemoteOk => Box::new(remoteok::RemoteOkAdapter::with_session(session)),
        SourceId::Glassdoor => Box::new(glassdoor::GlassdoorAdapter::with_session(session)),
        SourceId::ScholarshipsCom => Box::new(scholarships_com::ScholarshipsComAdapter::with_session(session)),
        SourceId::ScholarshipPositions => {
            Box::new(scholarship_positions::ScholarshipPositionsAdapter::with_session(session))
        }
        SourceId::UniversityPositions => {
            Box::new(university_positions::UniversityPositionsAdapter::with_session(session))
        }
        SourceId::InternationalScholarships => Box::new(
            international_scholarships::InternationalScholarshipsAdapter::with_session(session),
        ),
        SourceId::FastWeb => Box::new(fastweb::FastWebAdapter::with_session(session)),
        SourceId::Cheetah => Box::new(cheetah::CheetahAdapter::with_session(session)),
        SourceId::Daad => Box::new(daad::DaadAdapter::with_session(session)),
        SourceId::Erasmus => Box::new(erasmus::ErasmusAdapter::with_session(session)),
        SourceId::Commonwealth => Box::new(commonwealth::CommonwealthAdapter::with_session(session)),
        SourceId::EuFunding => Box::new(eu_funding::EuFundingAdapter::with_session(session)),
    }
}

/// Sources of `kind` selected by `config.sources`, in catalog order
pub fn selected_sources(kind: OpportunityKind, config: &ScraperConfig) -> Vec<SourceId> {
    let listed = |names: &[String]| -> Vec<SourceId> {
        names
            .iter()
            .filter_map(|name| {
                let parsed = parse_source(name);
                if parsed.is_none() {
                    log::warn!("Unknown source '{}' in configuration", name);
                }
                parsed
            })
            .collect()
    };
    let enabled = listed(&config.sources.enabled);
    let disabled = listed(&config.sources.disabled);

    SourceId::ALL
        .iter()
        .copied()
        .filter(|id| id.kind() == kind)
        .filter(|id| enabled.is_empty() || enabled.contains(id))
        .filter(|id| !disabled.contains(id))
        .collect()
}

/// The enabled adapters for `kind`, in catalog order
pub fn catalog(kind: OpportunityKind, config: &ScraperConfig) -> Vec<Box<dyn SourceAdapter>> {
    selected_sources(kind, config)
        .into_iter()
        .map(|id| adapter_for(id, config))
        .collect()
}
