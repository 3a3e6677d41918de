use super::{SourceAdapter, SourceId};
use crate::canonical::ScholarshipDraft;
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::html::{classed, element_text, first, first_loosely_classed};
use crate::extract::urls::resolve_url;
use crate::models::{EducationLevel, Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;
use scraper::{ElementRef, Html};
use std::collections::HashSet;

const BASE_URL: &str = "https://erasmus-plus.ec.europa.eu";
const PROGRAMME_URL: &str = "https://erasmus-plus.ec.europa.eu/opportunities/opportunities-for-individuals/students/erasmus-mundus-joint-masters-scholarships";
const CONTAINER_KEYWORDS: &[&str] = &["programme", "course", "emjm", "masters"];
const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4"];

const DEFAULT_DESCRIPTION: &str = "Erasmus Mundus Joint Masters Scholarship";
const REQUIREMENTS: &str = "Bachelor's degree required";
const AMOUNT: &str = "Full scholarship (1400 EUR/month + other benefits)";

/// Erasmus Mundus Joint Masters. Every programme carries the same scholarship
/// terms, so only the title, description and link vary.
pub struct ErasmusAdapter {
    session: SourceSession,
}

impl ErasmusAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::Erasmus.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

/// A heading directly under the container, else its first link
fn programme_title(item: ElementRef) -> Option<ElementRef> {
    item.children()
        .filter_map(ElementRef::wrap)
        .find(|child| HEADINGS.contains(&child.value().name()))
        .or_else(|| first(item, &["a[href]"]))
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    let doc = Html::parse_document(html);
    let mut seen = HashSet::new();

    classed(doc.root_element(), &["div", "article"], CONTAINER_KEYWORDS)
        .into_iter()
        .filter_map(|item| {
            let title = programme_title(item)?;
            let website_url = title
                .value()
                .attr("href")
                .and_then(|href| resolve_url(BASE_URL, href))
                .unwrap_or_else(|| BASE_URL.to_string());
            let draft = ScholarshipDraft {
                title: Some(element_text(title)),
                organization: Some("European Commission".to_string()),
                description: first_loosely_classed(item, &["div", "p"], &["description"])
                    .map(element_text)
                    .filter(|d| !d.is_empty())
                    .or_else(|| Some(DEFAULT_DESCRIPTION.to_string())),
                requirements: Some(REQUIREMENTS.to_string()),
                amount: Some(AMOUNT.to_string()),
                country: Some("European Union".to_string()),
                education_level: Some(EducationLevel::Masters),
                field_of_study: filters.field_of_study().map(str::to_string),
                website_url: Some(website_url),
                is_fully_funded: Some(true),
                ..Default::default()
            };
            seen.insert((draft.title.clone(), draft.website_url.clone()))
                .then(|| draft.finish(SourceId::Erasmus.display_name()))
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for ErasmusAdapter {
    fn id(&self) -> SourceId {
        SourceId::Erasmus
    }

    fn session(&mut self) -> &mut SourceSession {
        &mut self.session
    }

    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError> {
        Ok(self
            .session
            .collect_pages(
                num_pages.min(1),
                None,
                ListingPlan::PLAIN,
                |_| PROGRAMME_URL.to_string(),
                |page| parse_listing(&page.content, filters),
            )
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
    <main>
      <article class="emjm-course">
        <h3>European Master in Data Science</h3>
        <p class="course-description">Two-year joint master across four universities.</p>
      </article>
      <div class="programme-teaser">
        <a href="/programmes/emjm/123">Joint Master in Marine Biology</a>
      </div>
      <div class="programme-banner"><span>decoration only</span></div>
    </main>"#;

    #[test]
    fn test_parse_listing() {
        let results = parse_listing(FIXTURE, &ScrapeFilters::default());
        assert_eq!(results.len(), 2);

        let data = results[0].as_ref().unwrap();
        assert_eq!(data.title, "European Master in Data Science");
        assert_eq!(data.description, "Two-year joint master across four universities.");
        assert_eq!(data.website_url, BASE_URL);
        assert_eq!(data.education_level, EducationLevel::Masters);
        assert_eq!(data.requirements, REQUIREMENTS);
        assert_eq!(data.amount, AMOUNT);
        assert_eq!(data.country, "European Union");
        assert!(data.is_fully_funded);

        let marine = results[1].as_ref().unwrap();
        assert_eq!(marine.website_url, "https://erasmus-plus.ec.europa.eu/programmes/emjm/123");
        assert_eq!(marine.description, DEFAULT_DESCRIPTION);
    }
}
