use super::{SourceAdapter, SourceId};
use crate::canonical::ScholarshipDraft;
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::html::{classed, element_text, fragments, first, first_loosely_classed, own_or_parent_href};
use crate::extract::mentions_any;
use crate::extract::urls::resolve_url;
use crate::models::{EducationLevel, Opportunity, Scholarship, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;
use scraper::{ElementRef, Html};

const BASE_URL: &str = "https://cscuk.fcdo.gov.uk";
const LISTING_URL: &str = "https://cscuk.fcdo.gov.uk/scholarships/";
const AWARD_WORDS: &[&str] = &["scholarship", "fellowship"];

const BASE_REQUIREMENTS: &[&str] = &[
    "Must be a citizen of a Commonwealth country",
    "Must have completed required academic qualifications by start date",
    "Must meet English language requirements",
    "Must be unable to afford to study in the UK without this scholarship",
    "Must return to home country after the scholarship ends",
];
const UPPER_SECOND: &str = "Must hold a first degree of at least upper second class (2:1) standard";
const MASTERS_DEGREE: &str = "Must hold a Master's degree";

const AMOUNT: &str = "Full scholarship including:
- Full tuition fees
- Living allowance (stipend)
- Return flights
- Study travel grant
- Initial arrival allowance
- Research support grant (if applicable)
- Family allowance (if applicable)
- Excess baggage allowance
- Thesis grant (for doctoral scholars)";

/// UK Commonwealth Scholarships. Eligibility and benefits are the same across
/// awards apart from the degree prerequisites, so they are filled in by level.
pub struct CommonwealthAdapter {
    session: SourceSession,
}

impl CommonwealthAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::Commonwealth.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn requirements_for(level: EducationLevel) -> String {
    let mut lines: Vec<&str> = BASE_REQUIREMENTS.to_vec();
    match level {
        EducationLevel::Masters => lines.push(UPPER_SECOND),
        EducationLevel::Phd => lines.extend([UPPER_SECOND, MASTERS_DEGREE]),
        _ => {}
    }
    lines.join("\n")
}

fn default_description(level: EducationLevel) -> String {
    let level_word = match level {
        EducationLevel::Undergraduate => "Undergraduate ",
        EducationLevel::Masters => "Masters ",
        EducationLevel::Phd => "PhD ",
        EducationLevel::Postdoc => "Postdoc ",
        EducationLevel::All => "",
    };
    format!(
        "Commonwealth {}Scholarship opportunity for citizens of Commonwealth countries to study in the UK.",
        level_word
    )
}

/// Every `article`, or when the page has none, divs and sections named after awards
fn award_items(doc: &Html) -> Vec<ElementRef> {
    let articles = fragments(doc, "article");
    if !articles.is_empty() {
        return articles;
    }
    classed(doc.root_element(), &["div", "section"], AWARD_WORDS)
}

pub fn parse_listing(html: &str, filters: &ScrapeFilters) -> Vec<Result<Scholarship, RecordError>> {
    let doc = Html::parse_document(html);
    award_items(&doc)
        .into_iter()
        .filter_map(|item| {
            let title_el = first(item, &["h1", "h2", "h3", "h4"])
                .or_else(|| first_loosely_classed(item, &["a"], &["title"]))?;
            let title = element_text(title_el);
            if !mentions_any(&title, AWARD_WORDS) {
                return None;
            }

            let level = EducationLevel::from_text(&title);
            let website_url = own_or_parent_href(title_el)
                .and_then(|href| resolve_url(BASE_URL, &href))
                .unwrap_or_else(|| LISTING_URL.to_string());
            let description = first_loosely_classed(item, &["div", "p"], &["content", "desc", "text"])
                .map(element_text)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| default_description(level));

            let draft = ScholarshipDraft {
                title: Some(title),
                organization: Some(SourceId::Commonwealth.display_name().to_string()),
                description: Some(description),
                requirements: Some(requirements_for(level)),
                amount: Some(AMOUNT.to_string()),
                country: Some("United Kingdom".to_string()),
                education_level: Some(level),
                field_of_study: filters.field_of_study().map(str::to_string),
                website_url: Some(website_url),
                is_fully_funded: Some(true),
                ..Default::default()
            };
            Some(draft.finish(SourceId::Commonwealth.display_name()))
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for CommonwealthAdapter {
    fn id(&self) -> SourceId {
        SourceId::Commonwealth
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
                |_| LISTING_URL.to_string(),
                |page| parse_listing(&page.content, filters),
            )
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARTICLES: &str = r#"
    <main>
      <article>
        <a href="/scholarships/commonwealth-phd-scholarships/"><h2>Commonwealth PhD Scholarships</h2></a>
        <p>For doctoral study at UK universities.</p>
      </article>
      <article>
        <h2>Commonwealth Master's Scholarships</h2>
      </article>
      <article>
        <h2>News: annual report published</h2>
      </article>
    </main>"#;

    const SECTIONS: &str = r#"
    <div class="fellowship-card">
      <a class="card-title" href="https://cscuk.fcdo.gov.uk/professional-fellowships/">Commonwealth Professional Fellowships</a>
    </div>"#;

    #[test]
    fn test_parse_articles() {
        let results = parse_listing(ARTICLES, &ScrapeFilters::default());
        assert_eq!(results.len(), 2);

        let phd = results[0].as_ref().unwrap();
        assert_eq!(phd.education_level, EducationLevel::Phd);
        assert_eq!(phd.website_url, "https://cscuk.fcdo.gov.uk/scholarships/commonwealth-phd-scholarships/");
        assert_eq!(phd.description, "For doctoral study at UK universities.");
        assert_eq!(phd.requirements.lines().count(), 7);
        assert!(phd.requirements.ends_with(MASTERS_DEGREE));
        assert_eq!(phd.country, "United Kingdom");
        assert!(phd.is_fully_funded);

        let masters = results[1].as_ref().unwrap();
        assert_eq!(masters.education_level, EducationLevel::Masters);
        assert_eq!(masters.website_url, LISTING_URL);
        assert_eq!(masters.requirements.lines().count(), 6);
        assert_eq!(
            masters.description,
            "Commonwealth Masters Scholarship opportunity for citizens of Commonwealth countries to study in the UK."
        );
    }

    #[test]
    fn test_falls_back_to_award_sections() {
        let results = parse_listing(SECTIONS, &ScrapeFilters::default());
        assert_eq!(results.len(), 1);
        let fellowship = results[0].as_ref().unwrap();
        assert_eq!(fellowship.website_url, "https://cscuk.fcdo.gov.uk/professional-fellowships/");
        assert_eq!(fellowship.education_level, EducationLevel::All);
        assert_eq!(fellowship.requirements.lines().count(), 5);
    }

    #[test]
    fn test_amount_is_multiline() {
        let results = parse_listing(ARTICLES, &ScrapeFilters::default());
        let phd = results[0].as_ref().unwrap();
        assert!(phd.amount.starts_with("Full scholarship including:\n- Full tuition fees"));
    }
}
