use super::cards::{parse_cards, CardLayout};
use super::{SourceAdapter, SourceId};
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::urls::slug;
use crate::extract::{mentions_any, FULLY_FUNDED_PHRASES};
use crate::models::{Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;

const BASE_URL: &str = "https://www.scholarships.com";
const DIRECTORY: &str = "/financial-aid/college-scholarships/scholarship-directory";
const CARD: &str = "div.scholarship-listing";

const LAYOUT: CardLayout = CardLayout {
    card: CARD,
    title: &["h3.scholarship-title"],
    organization: &["div.scholarship-sponsor"],
    description: &["div.scholarship-description"],
    requirements: &["div.scholarship-details"],
    amount: &["div.scholarship-amount"],
    country: &[],
    level: &["div.scholarship-details"],
    field: &[],
    deadline: &["div.scholarship-deadline"],
    link: &["a.scholarship-title-link"],
};

/// Scholarships.com is the most heavily defended directory: the session visits
/// the home page first and treats pages without the word "scholarship" as blocked.
pub struct ScholarshipsComAdapter {
    session: SourceSession,
}

impl ScholarshipsComAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::ScholarshipsCom.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self {
            session: session.with_expected_keyword("scholarship"),
        }
    }
}

pub fn directory_url(filters: &ScrapeFilters, page: u32) -> String {
    let field = filters.field_of_study().map(slug).filter(|s| !s.is_empty());
    let mut url = format!(
        "{}{}/field-of-study/{}",
        BASE_URL,
        DIRECTORY,
        field.as_deref().unwrap_or("all-fields")
    );
    if let Some(country) = filters.country().map(slug).filter(|s| !s.is_empty()) {
        url.push_str(&format!("/country/{}", country));
    }
    if page > 0 {
        url.push_str(&format!("?page={}", page + 1));
    }
    url
}

/// "computer-science" or "computer science" -> "Computer Science"
fn title_case(value: &str) -> String {
    value
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    parse_cards(html, BASE_URL, &LAYOUT)
        .into_iter()
        .map(|card| {
            let mut draft = card.draft.apply_filters(filters);
            draft.field_of_study = filters.field_of_study().map(title_case);
            let blurb = [&draft.title, &draft.amount, &draft.description]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .collect::<Vec<&str>>()
                .join(" ");
            draft.is_fully_funded = Some(mentions_any(&blurb, FULLY_FUNDED_PHRASES));
            draft.finish(SourceId::ScholarshipsCom.display_name())
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for ScholarshipsComAdapter {
    fn id(&self) -> SourceId {
        SourceId::ScholarshipsCom
    }

    fn session(&mut self) -> &mut SourceSession {
        &mut self.session
    }

    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError> {
        if num_pages == 0 {
            return Ok(Vec::new());
        }
        self.session.warm_up(BASE_URL).await?;

        Ok(self
            .session
            .collect_pages(
                num_pages,
                Some(CARD),
                ListingPlan::HUMAN,
                |page| directory_url(filters, page),
                |page| parse_listing(&page.content, filters),
            )
            .await)
    }
}
