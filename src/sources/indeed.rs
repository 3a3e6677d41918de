use super::{SourceAdapter, SourceId};
use crate::canonical::JobDraft;
use crate::config::ScraperConfig;
use crate::error::{RecordError, ScrapeError};
use crate::extract::dates::resolve_relative;
use crate::extract::html::{element_lines, first, first_attr, first_text, fragments};
use crate::extract::urls::{encode, resolve_url};
use crate::extract::mentions_any;
use crate::models::{EmploymentType, JobListing, Opportunity, ScrapeFilters};
use crate::session::{ListingPlan, SourceSession};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scraper::Html;

const BASE_URL: &str = "https://www.indeed.com";
const CARD: &str = "div.job_seen_beacon";
const RESULTS_PER_PAGE: u32 = 10;
const REQUIREMENT_MARKERS: &[&str] = &["required", "requirements", "qualifications", "must have"];

pub struct IndeedAdapter {
    session: SourceSession,
}

impl IndeedAdapter {
    pub fn new(config: &ScraperConfig) -> Self {
        Self::with_session(SourceId::Indeed.session(config))
    }

    pub fn with_session(session: SourceSession) -> Self {
        Self { session }
    }
}

pub fn search_url(filters: &ScrapeFilters, page: u32) -> String {
    format!(
        "{}/jobs?q={}&l={}&start={}",
        BASE_URL,
        encode(filters.keywords().unwrap_or("all")),
        encode(filters.location().unwrap_or("remote")),
        page * RESULTS_PER_PAGE
    )
}

/// Snippet lines that talk about requirements, or the whole snippet when none do
fn snippet_requirements(snippet: &str) -> String {
    let lines: Vec<&str> = snippet
        .lines()
        .filter(|line| mentions_any(line, REQUIREMENT_MARKERS))
        .collect();
    if lines.is_empty() {
        snippet.to_string()
    } else {
        lines.join("\n")
    }
}

pub fn parse_listing(html: &str, now: DateTime<Utc>) -> Vec<Result<JobListing, RecordError>> {
    let doc = Html::parse_document(html);
    fragments(&doc, CARD)
        .into_iter()
        .map(|card| {
            let snippet = first(card, &["div.job-snippet", "div[data-testid=jobsnippet_footer]"]).map(element_lines);
            JobDraft {
                title: first_text(card, &["h2.jobTitle span[title]", "h2.jobTitle"]),
                company: first_text(card, &["span.companyName", "span[data-testid=company-name]"]),
                location: first_text(card, &["div.companyLocation", "div[data-testid=text-location]"]),
                employment_type: first_text(card, &["div.metadata", "div.attribute_snippet"])
                    .map(|t| EmploymentType::from_text(&t)),
                requirements: snippet.as_deref().map(snippet_requirements),
                description: snippet,
                salary_range: first_text(card, &["div.salary-snippet-container", "div.salary-snippet"]),
                application_url: first_attr(card, &["a.jcs-JobTitle", "h2.jobTitle a"], "href")
                    .and_then(|href| resolve_url(BASE_URL, &href)),
                posted_date: first_text(card, &["span.date"]).map(|t| resolve_relative(&t, now)),
                ..Default::default()
            }
            .finish(SourceId::Indeed.display_name())
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for IndeedAdapter {
    fn id(&self) -> SourceId {
        SourceId::Indeed
    }

    fn session(&mut self) -> &mut SourceSession {
        &mut self.session
    }

    async fn scrape(&mut self, filters: &ScrapeFilters, num_pages: u32) -> Result<Vec<Opportunity>, ScrapeError> {
        let now = Utc::now();
        Ok(self
            .session
            .collect_pages(
                num_pages,
                Some(CARD),
                ListingPlan::SCROLL,
                |page| search_url(filters, page),
                |page| parse_listing(&page.content, now),
            )
            .await)
    }
}
