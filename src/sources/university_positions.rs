use super::cards::{fully_funded, parse_cards, CardLayout};
use super::{SourceAdapter, SourceId};
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::urls::with_query;
use crate::models::{Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;

const BASE_URL: &str = "https://www.universitypositions.eu";
const CARD: &str = "div.scholarship-item";

const LAYOUT: CardLayout = CardLayout {
    card: CARD,
    title: &["h3.title"],
    organization: &["div.organization"],
    description: &["div.description"],
    requirements: &["div.requirements"],
    amount: &["div.funding"],
    country: &["div.location"],
    level: &["div.degree-level"],
    field: &["div.field"],
    deadline: &["div.deadline"],
    link: &["a.apply-link"],
};

pub struct UniversityPositionsAdapter {
    session: SourceSession,
}

impl UniversityPositionsAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::UniversityPositions.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn search_url(filters: &ScrapeFilters, page: u32) -> String {
    with_query(
        &format!("{}/scholarships", BASE_URL),
        &[
            ("field", filters.field_of_study().map(str::to_string)),
            ("country", filters.country().map(str::to_string)),
            ("page", (page > 0).then(|| (page + 1).to_string())),
        ],
    )
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    parse_cards(html, BASE_URL, &LAYOUT)
        .into_iter()
        .map(|card| {
            let mut draft = card.draft.apply_filters(filters);
            draft.is_fully_funded = Some(fully_funded(draft.amount.as_deref(), &card.text));
            draft.finish(SourceId::UniversityPositions.display_name())
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for UniversityPositionsAdapter {
    fn id(&self) -> SourceId {
        SourceId::UniversityPositions
    }

    fn session(&mut self) -> &mut SourceSession {
        &mut self.session
    }

    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError> {
        Ok(self
            .session
            .collect_pages(
                num_pages,
                Some(CARD),
                ListingPlan::SCROLL,
                |page| search_url(filters, page),
                |page| parse_listing(&page.content, filters),
            )
            .await)
    }
}
