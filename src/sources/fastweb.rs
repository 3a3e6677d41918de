use super::cards::{parse_cards, CardLayout};
use super::{SourceAdapter, SourceId};
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::mentions_any;
use crate::extract::urls::{slug, with_query};
use crate::models::{Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;

const BASE_URL: &str = "https://www.fastweb.com";
const CARD: &str = "div.scholarship-result";
const COUNTRY: &str = "United States";
const FUNDED_AMOUNTS: &[&str] = &["full tuition", "full ride", "100% coverage"];

const LAYOUT: CardLayout = CardLayout {
    card: CARD,
    title: &["h3.scholarship-title"],
    organization: &["div.provider"],
    description: &["div.description"],
    requirements: &["div.requirements"],
    amount: &["div.award-amount"],
    country: &[],
    level: &["div.education-level"],
    field: &["div.field-of-study"],
    deadline: &["div.deadline"],
    link: &["a.scholarship-link"],
};

/// FastWeb lists US awards only
pub struct FastWebAdapter {
    session: SourceSession,
}

impl FastWebAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::FastWeb.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn search_url(filters: &ScrapeFilters, page: u32) -> String {
    with_query(
        &format!("{}/college-scholarships", BASE_URL),
        &[
            ("page", (page > 0).then(|| (page + 1).to_string())),
            ("field", filters.field_of_study().map(slug)),
        ],
    )
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    parse_cards(html, BASE_URL, &LAYOUT)
        .into_iter()
        .map(|card| {
            let mut draft = card.draft;
            draft.country = Some(COUNTRY.to_string());
            draft.is_fully_funded = Some(
                draft
                    .amount
                    .as_deref()
                    .map_or(false, |amount| mentions_any(amount, FUNDED_AMOUNTS)),
            );
            draft.apply_filters(filters).finish(SourceId::FastWeb.display_name())
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for FastWebAdapter {
    fn id(&self) -> SourceId {
        SourceId::FastWeb
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
