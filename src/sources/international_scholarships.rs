use super::cards::{fully_funded, parse_cards, CardLayout};
use super::{SourceAdapter, SourceId};
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::urls::with_query;
use crate::models::{Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;

const BASE_URL: &str = "https://www.internationalscholarships.com";
const CARD: &str = "div.scholarship-item";

const LAYOUT: CardLayout = CardLayout {
    card: CARD,
    title: &["h2.title", "h3.title"],
    organization: &["div.provider", "div.organization"],
    description: &["div.description"],
    requirements: &["div.requirements", "div.eligibility"],
    amount: &["div.award"],
    country: &["div.country", "div.location"],
    level: &["div.level", "div.degree"],
    field: &["div.field", "div.study-field"],
    deadline: &["div.deadline"],
    link: &["a.scholarship-link", "a.title"],
};

pub struct InternationalScholarshipsAdapter {
    session: SourceSession,
}

impl InternationalScholarshipsAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::InternationalScholarships.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

/// Search pages are 1-based and always carry an explicit page number
pub fn search_url(filters: &ScrapeFilters, page: u32) -> String {
    with_query(
        &format!("{}/search", BASE_URL),
        &[
            ("field", filters.field_of_study().map(str::to_string)),
            ("country", filters.country().map(str::to_string)),
            ("page", Some((page + 1).to_string())),
        ],
    )
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    parse_cards(html, BASE_URL, &LAYOUT)
        .into_iter()
        .map(|card| {
            let mut draft = card.draft.apply_filters(filters);
            draft.is_fully_funded = Some(fully_funded(draft.amount.as_deref(), &card.text));
            draft.finish(SourceId::InternationalScholarships.display_name())
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for InternationalScholarshipsAdapter {
    fn id(&self) -> SourceId {
        SourceId::InternationalScholarships
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
