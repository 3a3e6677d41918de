use super::cards::{parse_cards, CardLayout};
use super::{SourceAdapter, SourceId};
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::mentions_any;
use crate::extract::urls::with_query;
use crate::models::{Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;

const BASE_URL: &str = "https://www.cheetah.org";
const CARD: &str = "div.scholarship-item";
const FUNDED_AMOUNTS: &[&str] = &["full", "complete", "100%"];

const LAYOUT: CardLayout = CardLayout {
    card: CARD,
    title: &["h2.scholarship-title"],
    organization: &["div.scholarship-provider"],
    description: &["div.scholarship-description"],
    requirements: &["div.scholarship-requirements"],
    amount: &["div.scholarship-amount"],
    country: &["div.scholarship-country"],
    level: &["div.scholarship-level"],
    field: &["div.scholarship-field"],
    deadline: &["div.scholarship-deadline"],
    link: &["a.scholarship-link"],
};

pub struct CheetahAdapter {
    session: SourceSession,
}

impl CheetahAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::Cheetah.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn search_url(filters: &ScrapeFilters, page: u32) -> String {
    with_query(
        &format!("{}/scholarships/page/{}/", BASE_URL, page + 1),
        &[
            ("study", filters.field_of_study().map(str::to_string)),
            ("country", filters.country().map(str::to_string)),
        ],
    )
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    parse_cards(html, BASE_URL, &LAYOUT)
        .into_iter()
        .map(|card| {
            let mut draft = card.draft.apply_filters(filters);
            draft.is_fully_funded = Some(
                draft
                    .amount
                    .as_deref()
                    .map_or(false, |amount| mentions_any(amount, FUNDED_AMOUNTS)),
            );
            draft.finish(SourceId::Cheetah.display_name())
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for CheetahAdapter {
    fn id(&self) -> SourceId {
        SourceId::Cheetah
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EducationLevel;

    const FIXTURE: &str = r#"
    <div class="scholarship-item">
      <h2 class="scholarship-title">Chevening Scholarship</h2>
      <div class="scholarship-provider">UK Government</div>
      <div class="scholarship-amount">Complete tuition and living costs</div>
      <div class="scholarship-country">United Kingdom</div>
      <div class="scholarship-level">Master's</div>
      <div class="scholarship-deadline">5 November 2025</div>
      <a class="scholarship-link" href="https://www.chevening.org/scholarships/">Visit</a>
    </div>
    <div class="scholarship-item">
      <h2 class="scholarship-title">Partial Grant</h2>
      <div class="scholarship-amount">Up to 50% of tuition</div>
      <a class="scholarship-link" href="/scholarships/partial-grant/">Visit</a>
    </div>"#;

    #[test]
    fn test_search_url() {
        let filters = ScrapeFilters {
            field_of_study: Some("Law".to_string()),
            country: Some("UK".to_string()),
            ..Default::default()
        };
        assert_eq!(search_url(&filters, 0), "https://www.cheetah.org/scholarships/page/1/?study=Law&country=UK");
        assert_eq!(search_url(&ScrapeFilters::default(), 1), "https://www.cheetah.org/scholarships/page/2/");
    }

    #[test]
    fn test_parse_listing() {
        let results = parse_listing(FIXTURE, &ScrapeFilters::default());
        let chevening = results[0].as_ref().unwrap();
        assert_eq!(chevening.organization, "UK Government");
        assert_eq!(chevening.country, "United Kingdom");
        assert_eq!(chevening.education_level, EducationLevel::Masters);
        assert_eq!(chevening.deadline, chrono::NaiveDate::from_ymd_opt(2025, 11, 5));
        assert!(chevening.is_fully_funded);

        let partial = results[1].as_ref().unwrap();
        assert_eq!(partial.website_url, "https://www.cheetah.org/scholarships/partial-grant/");
        assert!(!partial.is_fully_funded);
    }
}
