use super::cards::{fully_funded, parse_cards, CardLayout};
use super::{SourceAdapter, SourceId};
use crate::canonical::ScholarshipDraft;
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::dates::parse_deadline;
use crate::extract::text::{amount_from_text, phrase_after, section_after_keyword};
use crate::extract::{mentions_any, FULLY_FUNDED_PHRASES};
use crate::models::{EducationLevel, Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;
use regex::Regex;
use std::sync::LazyLock;

const BASE_URL: &str = "https://scholarship-positions.com";
const CARD: &str = "article.post";

const LAYOUT: CardLayout = CardLayout {
    card: CARD,
    title: &["h2.entry-title"],
    organization: &[],
    description: &["div.entry-content"],
    requirements: &[],
    amount: &[],
    country: &[],
    level: &[],
    field: &[],
    deadline: &[],
    link: &["h2.entry-title a"],
};

const ORGANIZATION_MARKERS: &[&str] = &["offered by", "provided by", "sponsored by"];
const REQUIREMENT_KEYWORDS: &[&str] = &["requirements:", "eligible:", "eligibility:", "criteria:"];
const DEADLINE_KEYWORDS: &[&str] = &["deadline:", "due date:", "closes on:", "apply by:"];
const FIELD_KEYWORDS: &[&str] = &["field of study:", "subject area:", "discipline:"];
const SECTION_STOPS: &[&str] = &["deadline:", "how to apply"];

/// Blog-style listing: every field but the title is mined from the post body
pub struct ScholarshipPositionsAdapter {
    session: SourceSession,
}

impl ScholarshipPositionsAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::ScholarshipPositions.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn category_url(page: u32) -> String {
    if page == 0 {
        format!("{}/category/international-scholarships/", BASE_URL)
    } else {
        format!("{}/category/international-scholarships/page/{}/", BASE_URL, page + 1)
    }
}

static COUNTRY_BEFORE_UNIVERSITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[Ii]n ((?:[A-Z][a-z]+ ?){1,3}) [Uu]niversit").unwrap());

/// Host country from phrasing like "study in Germany University ..."
fn country_before_university(text: &str) -> Option<String> {
    COUNTRY_BEFORE_UNIVERSITY
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// Fill in a draft from the free text of a post
fn mine_post(mut draft: ScholarshipDraft, body: &str) -> ScholarshipDraft {
    let funded = mentions_any(body, FULLY_FUNDED_PHRASES);

    draft.organization = phrase_after(body, ORGANIZATION_MARKERS, '.');
    draft.requirements = section_after_keyword(body, REQUIREMENT_KEYWORDS, SECTION_STOPS);
    draft.amount = amount_from_text(body).or_else(|| funded.then(|| "Fully Funded".to_string()));
    draft.deadline = section_after_keyword(body, DEADLINE_KEYWORDS, &[]).and_then(|d| parse_deadline(&d));
    draft.country = country_before_university(body);
    draft.education_level = Some(EducationLevel::from_text(body));
    draft.field_of_study = section_after_keyword(body, FIELD_KEYWORDS, SECTION_STOPS);
    draft.is_fully_funded = Some(fully_funded(draft.amount.as_deref(), body));
    draft
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    parse_cards(html, BASE_URL, &LAYOUT)
        .into_iter()
        .map(|card| {
            let body = card.draft.description.clone().unwrap_or_default();
            mine_post(card.draft, &body)
                .apply_filters(filters)
                .finish(SourceId::ScholarshipPositions.display_name())
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for ScholarshipPositionsAdapter {
    fn id(&self) -> SourceId {
        SourceId::ScholarshipPositions
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
                category_url,
                |page| parse_listing(&page.content, filters),
            )
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ALL_FIELDS, AMOUNT_NOT_SPECIFIED, INTERNATIONAL, UNKNOWN_ORGANIZATION};

    const FIXTURE: &str = r#"
    <main>
      <article class="post">
        <h2 class="entry-title"><a href="https://scholarship-positions.com/tum-masters-2025/">TUM Masters Scholarships 2025</a></h2>
        <div class="entry-content">
          <p>This fully funded Masters programme is offered by Technical University of Munich. Study in Germany University
          campuses with a stipend of €1,200 per month. Eligibility: applicants need a prior degree. Field of study: Engineering.
          Deadline: March 31, 2025.</p>
        </div>
      </article>
      <article class="post">
        <h2 class="entry-title"><a href="/plain-award/">Plain Award</a></h2>
        <div class="entry-content"><p>An award for anyone.</p></div>
      </article>
      <article class="post">
        <h2 class="entry-title">Linkless post</h2>
      </article>
    </main>"#;

    #[test]
    fn test_category_url() {
        assert_eq!(category_url(0), "https://scholarship-positions.com/category/international-scholarships/");
        assert_eq!(category_url(2), "https://scholarship-positions.com/category/international-scholarships/page/3/");
    }

    #[test]
    fn test_parse_listing_mines_body() {
        let results = parse_listing(FIXTURE, &ScrapeFilters::default());
        assert_eq!(results.len(), 3);

        let tum = results[0].as_ref().unwrap();
        assert_eq!(tum.organization, "Technical University of Munich");
        assert_eq!(tum.requirements, "applicants need a prior degree");
        assert_eq!(tum.amount, "€1,200 per month");
        assert_eq!(tum.country, "Germany");
        assert_eq!(tum.field_of_study, "Engineering");
        assert_eq!(tum.deadline, chrono::NaiveDate::from_ymd_opt(2025, 3, 31));
        assert_eq!(tum.education_level, EducationLevel::Masters);
        assert!(tum.is_fully_funded);

        let plain = results[1].as_ref().unwrap();
        assert_eq!(plain.website_url, "https://scholarship-positions.com/plain-award/");
        assert_eq!(plain.organization, UNKNOWN_ORGANIZATION);
        assert_eq!(plain.amount, AMOUNT_NOT_SPECIFIED);
        assert_eq!(plain.country, INTERNATIONAL);
        assert_eq!(plain.field_of_study, ALL_FIELDS);
        assert!(!plain.is_fully_funded);

        assert!(results[2].is_err());
    }

    #[test]
    fn test_filters_override_mined_values() {
        let filters = ScrapeFilters {
            country: Some("Austria".to_string()),
            ..Default::default()
        };
        let results = parse_listing(FIXTURE, &filters);
        assert_eq!(results[0].as_ref().unwrap().country, "Austria");
    }

    #[test]
    fn test_funded_without_amount() {
        let draft = mine_post(ScholarshipDraft::default(), "A full scholarship for everyone");
        assert_eq!(draft.amount.as_deref(), Some("Fully Funded"));
        assert_eq!(draft.is_fully_funded, Some(true));
    }
}
